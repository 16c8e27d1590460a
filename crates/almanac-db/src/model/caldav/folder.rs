use diesel::{pg::Pg, prelude::*};

use crate::schema;

/// A calendar collection. Folders are immutable after creation; the
/// surrogate id doubles as the collection's path component.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = schema::calendar_folder)]
#[diesel(check_for_backend(Pg))]
pub struct CalendarFolder {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub types: Vec<String>,
    pub max_size: i64,
}

/// Insert struct for creating calendar folders
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::calendar_folder)]
pub struct NewCalendarFolder<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub types: Vec<String>,
    pub max_size: i64,
}
