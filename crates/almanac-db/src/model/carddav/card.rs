use diesel::{pg::Pg, prelude::*};

use crate::schema;

/// A stored vCard, flattened to scalar columns.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = schema::card_file)]
#[diesel(primary_key(uid))]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(super::folder::AddressbookFolder, foreign_key = folder_id))]
pub struct CardFile {
    pub uid: uuid::Uuid,
    pub folder_id: i32,
    pub file_name: String,
    pub etag: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub modified_at: chrono::DateTime<chrono::Utc>,
    pub size: i64,
    pub version: String,
    pub formatted_name: Option<String>,
    pub family_name: Option<String>,
    pub given_name: Option<String>,
    pub additional_names: Option<String>,
    pub honorific_prefix: Option<String>,
    pub honorific_suffix: Option<String>,
    pub product: Option<String>,
    pub kind: Option<String>,
    pub nickname: Option<String>,
    pub birthday: Option<chrono::NaiveDate>,
    pub anniversary: Option<chrono::NaiveDate>,
    pub gender: Option<String>,
    pub revision_at: Option<chrono::DateTime<chrono::Utc>>,
    pub language: Option<String>,
    pub timezone: Option<String>,
    pub title: Option<String>,
    pub role: Option<String>,
    pub categories: Option<String>,
    pub note: Option<String>,
    pub organization: Option<String>,
}

/// Insert/update struct for card rows
#[derive(Debug, Clone, PartialEq, Eq, Insertable, AsChangeset)]
#[diesel(table_name = schema::card_file)]
#[diesel(treat_none_as_null = true)]
pub struct NewCardFile {
    pub uid: uuid::Uuid,
    pub folder_id: i32,
    pub file_name: String,
    pub etag: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub modified_at: chrono::DateTime<chrono::Utc>,
    pub size: i64,
    pub version: String,
    pub formatted_name: Option<String>,
    pub family_name: Option<String>,
    pub given_name: Option<String>,
    pub additional_names: Option<String>,
    pub honorific_prefix: Option<String>,
    pub honorific_suffix: Option<String>,
    pub product: Option<String>,
    pub kind: Option<String>,
    pub nickname: Option<String>,
    pub birthday: Option<chrono::NaiveDate>,
    pub anniversary: Option<chrono::NaiveDate>,
    pub gender: Option<String>,
    pub revision_at: Option<chrono::DateTime<chrono::Utc>>,
    pub language: Option<String>,
    pub timezone: Option<String>,
    pub title: Option<String>,
    pub role: Option<String>,
    pub categories: Option<String>,
    pub note: Option<String>,
    pub organization: Option<String>,
}
