use diesel::{pg::Pg, prelude::*};

use crate::schema;

/// The recurrence row for a master component, at most one per component.
///
/// `by_day` is a weekday bitmask, bit i = Sunday(0)..Saturday(6), 127 for
/// every day. `by_month_day` sets bits 1..31, bit 0 standing in for the
/// synthetic "last day of month" (-1). `by_month` sets bits 1..12.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = schema::recurrence)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(super::component::EventComponent, foreign_key = event_component_id))]
pub struct Recurrence {
    pub id: i32,
    pub event_component_id: i32,
    pub interval: Option<i32>,
    pub until: Option<chrono::NaiveDate>,
    pub count: Option<i32>,
    pub week_start: Option<i16>,
    pub by_day: Option<i32>,
    pub by_month_day: Option<i64>,
    pub by_month: Option<i32>,
    pub period_day: Option<i32>,
    pub by_set_pos: Option<Vec<i32>>,
    pub this_and_future: bool,
}

/// Insert/update struct for recurrence rows
#[derive(Debug, Clone, PartialEq, Eq, Insertable, AsChangeset)]
#[diesel(table_name = schema::recurrence)]
#[diesel(treat_none_as_null = true)]
pub struct NewRecurrence {
    pub event_component_id: i32,
    pub interval: Option<i32>,
    pub until: Option<chrono::NaiveDate>,
    pub count: Option<i32>,
    pub week_start: Option<i16>,
    pub by_day: Option<i32>,
    pub by_month_day: Option<i64>,
    pub by_month: Option<i32>,
    pub period_day: Option<i32>,
    pub by_set_pos: Option<Vec<i32>>,
    pub this_and_future: bool,
}

/// One exception row: a deleted occurrence (EXDATE) when
/// `deleted_recurrence` is set, or the date an override component replaces
/// when it is not.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = schema::recurrence_exception)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(Recurrence, foreign_key = recurrence_id))]
pub struct RecurrenceException {
    pub id: i32,
    pub event_component_id: i32,
    pub recurrence_id: i32,
    pub exception_date: chrono::DateTime<chrono::Utc>,
    pub deleted_recurrence: bool,
}

/// Insert/update struct for exception rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Insertable, AsChangeset)]
#[diesel(table_name = schema::recurrence_exception)]
pub struct NewRecurrenceException {
    pub event_component_id: i32,
    pub recurrence_id: i32,
    pub exception_date: chrono::DateTime<chrono::Utc>,
    pub deleted_recurrence: bool,
}
