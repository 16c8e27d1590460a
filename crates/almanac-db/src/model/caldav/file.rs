use diesel::{pg::Pg, prelude::*};

use crate::schema;

/// The stored `.ics` document header: one row per `(folder, uid)`.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = schema::calendar_file)]
#[diesel(primary_key(uid))]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(super::folder::CalendarFolder, foreign_key = folder_id))]
pub struct CalendarFile {
    pub uid: uuid::Uuid,
    pub folder_id: i32,
    pub etag: String,
    pub modified_at: chrono::DateTime<chrono::Utc>,
    pub size: i64,
}

/// Insert/update struct for the file header row
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = schema::calendar_file)]
#[diesel(treat_none_as_null = true)]
pub struct NewCalendarFile<'a> {
    pub uid: uuid::Uuid,
    pub folder_id: i32,
    pub etag: &'a str,
    pub modified_at: chrono::DateTime<chrono::Utc>,
    pub size: i64,
}

/// Top-level VCALENDAR properties for one calendar file.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = schema::calendar_property)]
#[diesel(primary_key(calendar_file_uid))]
#[diesel(check_for_backend(Pg))]
pub struct CalendarProperty {
    pub calendar_file_uid: uuid::Uuid,
    pub version: String,
    pub product: String,
    pub scale: Option<String>,
    pub method: Option<String>,
}

/// Insert/update struct for the calendar property row
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = schema::calendar_property)]
#[diesel(treat_none_as_null = true)]
pub struct NewCalendarProperty<'a> {
    pub calendar_file_uid: uuid::Uuid,
    pub version: &'a str,
    pub product: &'a str,
    pub scale: Option<&'a str>,
    pub method: Option<&'a str>,
}
