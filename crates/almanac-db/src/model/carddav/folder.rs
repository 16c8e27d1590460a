use diesel::{pg::Pg, prelude::*};

use crate::schema;

/// An addressbook collection.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = schema::addressbook_folder)]
#[diesel(check_for_backend(Pg))]
pub struct AddressbookFolder {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub types: Vec<String>,
    pub max_size: i64,
}

/// Insert struct for creating addressbook folders
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::addressbook_folder)]
pub struct NewAddressbookFolder<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub types: Vec<String>,
    pub max_size: i64,
}
