use diesel::{pg::Pg, prelude::*};

use crate::schema;

/// One VEVENT or VTODO inside a calendar file.
///
/// `component_type` is the one-bit kind discriminant: true for VEVENT,
/// false for VTODO. `(calendar_file_uid, created_at)` is the upsert
/// identity.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = schema::event_component)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(super::file::CalendarFile, foreign_key = calendar_file_uid))]
pub struct EventComponent {
    pub id: i32,
    pub calendar_file_uid: uuid::Uuid,
    pub component_type: bool,
    pub date_timestamp: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub last_modified_at: Option<chrono::DateTime<chrono::Utc>>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub organizer: Option<String>,
    pub start_date: Option<chrono::DateTime<chrono::Utc>>,
    pub end_date: Option<chrono::DateTime<chrono::Utc>>,
    pub duration_seconds: Option<i64>,
    pub all_day: bool,
    pub class: Option<String>,
    pub location: Option<String>,
    pub priority: Option<i32>,
    pub sequence: Option<i32>,
    pub status: Option<String>,
    pub categories: Option<String>,
    pub transparency: Option<bool>,
    pub completed: Option<chrono::DateTime<chrono::Utc>>,
    pub percent_complete: Option<i32>,
}

/// Insert/update struct for event component rows
#[derive(Debug, Clone, PartialEq, Insertable, AsChangeset)]
#[diesel(table_name = schema::event_component)]
#[diesel(treat_none_as_null = true)]
pub struct NewEventComponent {
    pub calendar_file_uid: uuid::Uuid,
    pub component_type: bool,
    pub date_timestamp: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub last_modified_at: Option<chrono::DateTime<chrono::Utc>>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub organizer: Option<String>,
    pub start_date: Option<chrono::DateTime<chrono::Utc>>,
    pub end_date: Option<chrono::DateTime<chrono::Utc>>,
    pub duration_seconds: Option<i64>,
    pub all_day: bool,
    pub class: Option<String>,
    pub location: Option<String>,
    pub priority: Option<i32>,
    pub sequence: Option<i32>,
    pub status: Option<String>,
    pub categories: Option<String>,
    pub transparency: Option<bool>,
    pub completed: Option<chrono::DateTime<chrono::Utc>>,
    pub percent_complete: Option<i32>,
}
