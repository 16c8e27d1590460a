//! Calendar folder queries.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::error::DbResult;
use crate::model::caldav::folder::{CalendarFolder, NewCalendarFolder};
use crate::schema::calendar_folder;

/// ## Summary
/// Creates a calendar folder and returns its surrogate id, which doubles
/// as the collection's path component.
///
/// ## Errors
/// Returns an error if the insert fails.
#[tracing::instrument(skip(conn, folder), fields(name = %folder.name))]
pub async fn create(conn: &mut DbConnection<'_>, folder: &NewCalendarFolder<'_>) -> DbResult<i32> {
    let id = diesel::insert_into(calendar_folder::table)
        .values(folder)
        .returning(calendar_folder::id)
        .get_result(conn)
        .await?;
    Ok(id)
}

/// ## Summary
/// Lists all calendar folders, ordered by id.
///
/// ## Errors
/// Returns an error if the query fails.
pub async fn list(conn: &mut DbConnection<'_>) -> DbResult<Vec<CalendarFolder>> {
    let folders = calendar_folder::table
        .select(CalendarFolder::as_select())
        .order(calendar_folder::id.asc())
        .load(conn)
        .await?;
    Ok(folders)
}

/// ## Summary
/// Loads one calendar folder by id.
///
/// ## Errors
/// Returns an error if the query fails.
pub async fn get(conn: &mut DbConnection<'_>, id: i32) -> DbResult<Option<CalendarFolder>> {
    let folder = calendar_folder::table
        .find(id)
        .select(CalendarFolder::as_select())
        .first(conn)
        .await
        .optional()?;
    Ok(folder)
}

/// ## Summary
/// Deletes a calendar folder; files and their rows cascade.
///
/// ## Errors
/// Returns an error if the delete fails.
pub async fn delete(conn: &mut DbConnection<'_>, id: i32) -> DbResult<usize> {
    let count = diesel::delete(calendar_folder::table.find(id))
        .execute(conn)
        .await?;
    Ok(count)
}
