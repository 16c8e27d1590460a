//! Addressbook folder queries.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::error::DbResult;
use crate::model::carddav::folder::{AddressbookFolder, NewAddressbookFolder};
use crate::schema::addressbook_folder;

/// ## Summary
/// Creates an addressbook folder and returns its id.
///
/// ## Errors
/// Returns an error if the insert fails.
#[tracing::instrument(skip(conn, folder), fields(name = %folder.name))]
pub async fn create(
    conn: &mut DbConnection<'_>,
    folder: &NewAddressbookFolder<'_>,
) -> DbResult<i32> {
    let id = diesel::insert_into(addressbook_folder::table)
        .values(folder)
        .returning(addressbook_folder::id)
        .get_result(conn)
        .await?;
    Ok(id)
}

/// ## Summary
/// Lists all addressbook folders, ordered by id.
///
/// ## Errors
/// Returns an error if the query fails.
pub async fn list(conn: &mut DbConnection<'_>) -> DbResult<Vec<AddressbookFolder>> {
    let folders = addressbook_folder::table
        .select(AddressbookFolder::as_select())
        .order(addressbook_folder::id.asc())
        .load(conn)
        .await?;
    Ok(folders)
}

/// ## Summary
/// Loads one addressbook folder by id.
///
/// ## Errors
/// Returns an error if the query fails.
pub async fn get(conn: &mut DbConnection<'_>, id: i32) -> DbResult<Option<AddressbookFolder>> {
    let folder = addressbook_folder::table
        .find(id)
        .select(AddressbookFolder::as_select())
        .first(conn)
        .await
        .optional()?;
    Ok(folder)
}
