//! Recurrence and exception row queries.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::error::DbResult;
use crate::model::caldav::recurrence::{
    NewRecurrence, NewRecurrenceException, Recurrence, RecurrenceException,
};
use crate::schema::{event_component, recurrence, recurrence_exception};

/// ## Summary
/// Loads the recurrence row of a master component, if any. Absence is not
/// a failure.
///
/// ## Errors
/// Returns an error if the query fails.
pub async fn get_by_component(
    conn: &mut DbConnection<'_>,
    event_component_id: i32,
) -> DbResult<Option<Recurrence>> {
    let row = recurrence::table
        .filter(recurrence::event_component_id.eq(event_component_id))
        .select(Recurrence::as_select())
        .first(conn)
        .await
        .optional()?;
    Ok(row)
}

/// ## Summary
/// Inserts or updates the recurrence row keyed by its master component
/// and returns the recurrence id the exception rows attach to.
///
/// ## Errors
/// Returns an error if the upsert fails.
#[tracing::instrument(skip(conn, row), fields(event_component_id = row.event_component_id))]
pub async fn upsert(conn: &mut DbConnection<'_>, row: &NewRecurrence) -> DbResult<i32> {
    let id = diesel::insert_into(recurrence::table)
        .values(row)
        .on_conflict(recurrence::event_component_id)
        .do_update()
        .set(row)
        .returning(recurrence::id)
        .get_result(conn)
        .await?;
    Ok(id)
}

/// ## Summary
/// Removes the recurrence of a master component: its exception rows, the
/// override components those rows reference, and the recurrence row
/// itself. The master survives. Returns the ids of the deleted override
/// components.
///
/// ## Errors
/// Returns an error if any delete fails.
#[tracing::instrument(skip(conn))]
pub async fn remove_for_component(
    conn: &mut DbConnection<'_>,
    master_component_id: i32,
) -> DbResult<Vec<i32>> {
    let recurrence_ids = recurrence::table
        .select(recurrence::id)
        .filter(recurrence::event_component_id.eq(master_component_id));

    let referenced: Vec<i32> = diesel::delete(
        recurrence_exception::table
            .filter(recurrence_exception::recurrence_id.eq_any(recurrence_ids)),
    )
    .returning(recurrence_exception::event_component_id)
    .get_results(conn)
    .await?;

    diesel::delete(recurrence::table.filter(recurrence::event_component_id.eq(master_component_id)))
        .execute(conn)
        .await?;

    let overrides: Vec<i32> = referenced
        .into_iter()
        .filter(|&id| id != master_component_id)
        .collect();

    if !overrides.is_empty() {
        diesel::delete(event_component::table.filter(event_component::id.eq_any(&overrides)))
            .execute(conn)
            .await?;
    }

    Ok(overrides)
}

/// ## Summary
/// Inserts or updates an exception row. `(recurrence_id, exception_date)`
/// is the conflict key, so the last writer wins for a contested date.
///
/// ## Errors
/// Returns an error if the upsert fails.
pub async fn upsert_exception(
    conn: &mut DbConnection<'_>,
    row: &NewRecurrenceException,
) -> DbResult<()> {
    diesel::insert_into(recurrence_exception::table)
        .values(row)
        .on_conflict((
            recurrence_exception::recurrence_id,
            recurrence_exception::exception_date,
        ))
        .do_update()
        .set(row)
        .execute(conn)
        .await?;
    Ok(())
}

/// ## Summary
/// Loads the exception rows of a recurrence.
///
/// ## Errors
/// Returns an error if the query fails.
pub async fn list_exceptions(
    conn: &mut DbConnection<'_>,
    recurrence_id: i32,
) -> DbResult<Vec<RecurrenceException>> {
    let rows = recurrence_exception::table
        .filter(recurrence_exception::recurrence_id.eq(recurrence_id))
        .select(RecurrenceException::as_select())
        .order(recurrence_exception::exception_date.asc())
        .load(conn)
        .await?;
    Ok(rows)
}
