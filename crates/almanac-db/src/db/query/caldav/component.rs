//! Event component queries.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::error::DbResult;
use crate::model::caldav::component::{EventComponent, NewEventComponent};
use crate::schema::event_component;

/// ## Summary
/// Inserts or updates a component row and returns its id.
///
/// `(calendar_file_uid, created_at)` is the conflict key; the unique
/// index is declared NULLS NOT DISTINCT so components without CREATED
/// update in place too.
///
/// ## Errors
/// Returns an error if the upsert fails.
#[tracing::instrument(skip(conn, component), fields(uid = %component.calendar_file_uid))]
pub async fn upsert(
    conn: &mut DbConnection<'_>,
    component: &NewEventComponent,
) -> DbResult<i32> {
    let id = diesel::insert_into(event_component::table)
        .values(component)
        .on_conflict((
            event_component::calendar_file_uid,
            event_component::created_at,
        ))
        .do_update()
        .set(component)
        .returning(event_component::id)
        .get_result(conn)
        .await?;
    Ok(id)
}

/// ## Summary
/// Loads every component row of a calendar file, masters before
/// overrides is not guaranteed here; the reader stitches order.
///
/// ## Errors
/// Returns an error if the query fails.
pub async fn list_by_file(
    conn: &mut DbConnection<'_>,
    uid: uuid::Uuid,
) -> DbResult<Vec<EventComponent>> {
    let components = event_component::table
        .filter(event_component::calendar_file_uid.eq(uid))
        .select(EventComponent::as_select())
        .order(event_component::id.asc())
        .load(conn)
        .await?;
    Ok(components)
}

/// ## Summary
/// The highest SEQUENCE stored for a file, used for the conditional-write
/// sequence bump.
///
/// ## Errors
/// Returns an error if the query fails.
pub async fn max_sequence(conn: &mut DbConnection<'_>, uid: uuid::Uuid) -> DbResult<Option<i32>> {
    let sequence = event_component::table
        .filter(event_component::calendar_file_uid.eq(uid))
        .select(diesel::dsl::max(event_component::sequence))
        .first::<Option<i32>>(conn)
        .await?;
    Ok(sequence)
}

/// ## Summary
/// Deletes one component row by id.
///
/// ## Errors
/// Returns an error if the delete fails.
pub async fn delete(conn: &mut DbConnection<'_>, id: i32) -> DbResult<usize> {
    let count = diesel::delete(event_component::table.find(id))
        .execute(conn)
        .await?;
    Ok(count)
}
