use diesel::{pg::Pg, prelude::*};

use crate::schema;

/// An X-* property preserved verbatim: name, declared value type, and the
/// serialized value. Keyed by `(calendar_file_uid, parent_id, prop_name)`.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = schema::custom_property)]
#[diesel(primary_key(calendar_file_uid, parent_id, prop_name))]
#[diesel(check_for_backend(Pg))]
pub struct CustomProperty {
    pub calendar_file_uid: uuid::Uuid,
    pub parent_id: i32,
    pub prop_name: String,
    pub parameter_name: String,
    pub value: String,
}

/// Insert/update struct for custom property rows
#[derive(Debug, Clone, PartialEq, Eq, Insertable, AsChangeset)]
#[diesel(table_name = schema::custom_property)]
pub struct NewCustomProperty {
    pub calendar_file_uid: uuid::Uuid,
    pub parent_id: i32,
    pub prop_name: String,
    pub parameter_name: String,
    pub value: String,
}
