//! Calendar file header and calendar property queries.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::error::DbResult;
use crate::model::caldav::file::{
    CalendarFile, CalendarProperty, NewCalendarFile, NewCalendarProperty,
};
use crate::schema::{calendar_file, calendar_property};

/// ## Summary
/// Loads the file header row for a uid.
///
/// ## Errors
/// Returns an error if the query fails.
pub async fn get(conn: &mut DbConnection<'_>, uid: uuid::Uuid) -> DbResult<Option<CalendarFile>> {
    let file = calendar_file::table
        .find(uid)
        .select(CalendarFile::as_select())
        .first(conn)
        .await
        .optional()?;
    Ok(file)
}

/// ## Summary
/// Inserts or overwrites the file header row. The uid is the conflict
/// key: exactly one header exists per `(folder, uid)`.
///
/// ## Errors
/// Returns an error if the upsert fails.
#[tracing::instrument(skip(conn, file), fields(uid = %file.uid))]
pub async fn upsert(conn: &mut DbConnection<'_>, file: &NewCalendarFile<'_>) -> DbResult<()> {
    diesel::insert_into(calendar_file::table)
        .values(file)
        .on_conflict(calendar_file::uid)
        .do_update()
        .set(file)
        .execute(conn)
        .await?;
    Ok(())
}

/// ## Summary
/// Loads the VCALENDAR property row for a uid.
///
/// ## Errors
/// Returns an error if the query fails.
pub async fn get_property(
    conn: &mut DbConnection<'_>,
    uid: uuid::Uuid,
) -> DbResult<Option<CalendarProperty>> {
    let property = calendar_property::table
        .find(uid)
        .select(CalendarProperty::as_select())
        .first(conn)
        .await
        .optional()?;
    Ok(property)
}

/// ## Summary
/// Inserts or overwrites the VCALENDAR property row.
///
/// ## Errors
/// Returns an error if the upsert fails.
pub async fn upsert_property(
    conn: &mut DbConnection<'_>,
    property: &NewCalendarProperty<'_>,
) -> DbResult<()> {
    diesel::insert_into(calendar_property::table)
        .values(property)
        .on_conflict(calendar_property::calendar_file_uid)
        .do_update()
        .set(property)
        .execute(conn)
        .await?;
    Ok(())
}

/// ## Summary
/// Lists all file headers in a folder.
///
/// ## Errors
/// Returns an error if the query fails.
pub async fn list_by_folder(
    conn: &mut DbConnection<'_>,
    folder_id: i32,
) -> DbResult<Vec<CalendarFile>> {
    let files = calendar_file::table
        .filter(calendar_file::folder_id.eq(folder_id))
        .select(CalendarFile::as_select())
        .order(calendar_file::uid.asc())
        .load(conn)
        .await?;
    Ok(files)
}

/// ## Summary
/// Deletes a calendar file; component, recurrence, exception, and custom
/// property rows cascade.
///
/// ## Errors
/// Returns an error if the delete fails.
#[tracing::instrument(skip(conn))]
pub async fn delete(conn: &mut DbConnection<'_>, uid: uuid::Uuid) -> DbResult<usize> {
    let count = diesel::delete(calendar_file::table.find(uid))
        .execute(conn)
        .await?;
    Ok(count)
}
