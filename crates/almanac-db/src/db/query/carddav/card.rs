//! Card file queries.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::error::DbResult;
use crate::model::carddav::card::{CardFile, NewCardFile};
use crate::schema::card_file;

/// ## Summary
/// Loads a card row by uid.
///
/// ## Errors
/// Returns an error if the query fails.
pub async fn get(conn: &mut DbConnection<'_>, uid: uuid::Uuid) -> DbResult<Option<CardFile>> {
    let card = card_file::table
        .find(uid)
        .select(CardFile::as_select())
        .first(conn)
        .await
        .optional()?;
    Ok(card)
}

/// ## Summary
/// Inserts or overwrites a card row, preserving `created_at` on update.
///
/// ## Errors
/// Returns an error if the upsert fails.
#[tracing::instrument(skip(conn, card), fields(uid = %card.uid))]
pub async fn upsert(conn: &mut DbConnection<'_>, card: &NewCardFile) -> DbResult<()> {
    diesel::insert_into(card_file::table)
        .values(card)
        .on_conflict(card_file::uid)
        .do_update()
        .set((
            card_file::folder_id.eq(card.folder_id),
            card_file::file_name.eq(&card.file_name),
            card_file::etag.eq(&card.etag),
            card_file::modified_at.eq(card.modified_at),
            card_file::size.eq(card.size),
            card_file::version.eq(&card.version),
            card_file::formatted_name.eq(&card.formatted_name),
            card_file::family_name.eq(&card.family_name),
            card_file::given_name.eq(&card.given_name),
            card_file::additional_names.eq(&card.additional_names),
            card_file::honorific_prefix.eq(&card.honorific_prefix),
            card_file::honorific_suffix.eq(&card.honorific_suffix),
            card_file::product.eq(&card.product),
            card_file::kind.eq(&card.kind),
            card_file::nickname.eq(&card.nickname),
            card_file::birthday.eq(card.birthday),
            card_file::anniversary.eq(card.anniversary),
            card_file::gender.eq(&card.gender),
            card_file::revision_at.eq(card.revision_at),
            card_file::language.eq(&card.language),
            card_file::timezone.eq(&card.timezone),
            card_file::title.eq(&card.title),
            card_file::role.eq(&card.role),
            card_file::categories.eq(&card.categories),
            card_file::note.eq(&card.note),
            card_file::organization.eq(&card.organization),
        ))
        .execute(conn)
        .await?;
    Ok(())
}

/// ## Summary
/// Lists all cards in an addressbook folder.
///
/// ## Errors
/// Returns an error if the query fails.
pub async fn list_by_folder(
    conn: &mut DbConnection<'_>,
    folder_id: i32,
) -> DbResult<Vec<CardFile>> {
    let cards = card_file::table
        .filter(card_file::folder_id.eq(folder_id))
        .select(CardFile::as_select())
        .order(card_file::uid.asc())
        .load(conn)
        .await?;
    Ok(cards)
}

/// ## Summary
/// Deletes a card row.
///
/// ## Errors
/// Returns an error if the delete fails.
pub async fn delete(conn: &mut DbConnection<'_>, uid: uuid::Uuid) -> DbResult<usize> {
    let count = diesel::delete(card_file::table.find(uid))
        .execute(conn)
        .await?;
    Ok(count)
}
