//! Custom property (X-*) queries.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::error::DbResult;
use crate::model::caldav::custom_prop::{CustomProperty, NewCustomProperty};
use crate::schema::custom_property;

/// ## Summary
/// Inserts or updates a custom property row keyed by
/// `(calendar_file_uid, parent_id, prop_name)`.
///
/// ## Errors
/// Returns an error if the upsert fails.
pub async fn upsert(conn: &mut DbConnection<'_>, row: &NewCustomProperty) -> DbResult<()> {
    diesel::insert_into(custom_property::table)
        .values(row)
        .on_conflict((
            custom_property::calendar_file_uid,
            custom_property::parent_id,
            custom_property::prop_name,
        ))
        .do_update()
        .set((
            custom_property::parameter_name.eq(&row.parameter_name),
            custom_property::value.eq(&row.value),
        ))
        .execute(conn)
        .await?;
    Ok(())
}

/// ## Summary
/// Loads the custom properties of one component.
///
/// ## Errors
/// Returns an error if the query fails.
pub async fn list_for_component(
    conn: &mut DbConnection<'_>,
    file_uid: uuid::Uuid,
    parent_id: i32,
) -> DbResult<Vec<CustomProperty>> {
    let rows = custom_property::table
        .filter(custom_property::calendar_file_uid.eq(file_uid))
        .filter(custom_property::parent_id.eq(parent_id))
        .select(CustomProperty::as_select())
        .order(custom_property::prop_name.asc())
        .load(conn)
        .await?;
    Ok(rows)
}

/// ## Summary
/// Deletes every custom property of one component.
///
/// ## Errors
/// Returns an error if the delete fails.
pub async fn delete_for_component(
    conn: &mut DbConnection<'_>,
    file_uid: uuid::Uuid,
    parent_id: i32,
) -> DbResult<usize> {
    let count = diesel::delete(
        custom_property::table
            .filter(custom_property::calendar_file_uid.eq(file_uid))
            .filter(custom_property::parent_id.eq(parent_id)),
    )
    .execute(conn)
    .await?;
    Ok(count)
}
