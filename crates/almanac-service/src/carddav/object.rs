//! Address object storage and retrieval.

use chrono::{DateTime, Utc};

use almanac_db::db::connection::DbConnection;
use almanac_db::db::etag;
use almanac_db::db::map::vcard::{assemble_card, scan_card};
use almanac_db::db::query::carddav::card;
use almanac_rfc::vcard::build::serialize;
use almanac_rfc::vcard::core::VCard;

use crate::caldav::precondition::Preconditions;
use crate::error::{ServiceError, ServiceResult};

/// Result of storing an address object.
#[derive(Debug, Clone)]
pub struct PutCardOutcome {
    pub uid: uuid::Uuid,
    pub etag: String,
    pub modified_at: DateTime<Utc>,
    pub size: i64,
    pub created: bool,
}

/// An address object loaded from the store.
#[derive(Debug, Clone)]
pub struct LoadedCard {
    pub uid: uuid::Uuid,
    pub folder_id: i32,
    pub etag: String,
    pub modified_at: DateTime<Utc>,
    pub size: i64,
    pub card: VCard,
    pub body: String,
}

/// ## Summary
/// Validates and stores an address object.
///
/// The stored file name is always `{uid}.vcf`. Preconditions evaluate
/// against the stored ETag exactly as on the calendar path.
///
/// ## Errors
/// - `InvalidAddressObject` for missing VERSION/FN or a non-UUID UID.
/// - Precondition failures from conditional headers.
#[tracing::instrument(skip(conn, card, preconditions), fields(folder_id))]
pub async fn put_address_object(
    conn: &mut DbConnection<'_>,
    folder_id: i32,
    card: &VCard,
    preconditions: Preconditions,
) -> ServiceResult<PutCardOutcome> {
    let uid = validate(card)?;

    let body = serialize(card);
    let new_etag = etag::from_data(body.as_bytes());
    let now = Utc::now();
    let size = i64::try_from(body.len()).unwrap_or(i64::MAX);

    let existing = card::get(conn, uid).await?;
    preconditions.evaluate(existing.as_ref().map(|c| c.etag.as_str()))?;
    let created = existing.is_none();

    let file_name = format!("{uid}.vcf");
    let mut row = scan_card(card, uid, folder_id, &file_name, &new_etag, size, now);
    if let Some(existing) = &existing {
        row.created_at = existing.created_at;
    }

    card::upsert(conn, &row).await?;

    tracing::info!(uid = %uid, etag = %new_etag, created, "Address object stored");

    Ok(PutCardOutcome {
        uid,
        etag: new_etag,
        modified_at: now,
        size,
        created,
    })
}

/// ## Summary
/// Loads an address object and reassembles its vCard.
///
/// ## Errors
/// Returns `NotFound` when nothing is stored for the uid.
#[tracing::instrument(skip(conn))]
pub async fn get_address_object(
    conn: &mut DbConnection<'_>,
    uid: uuid::Uuid,
) -> ServiceResult<LoadedCard> {
    let row = card::get(conn, uid)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("address object {uid}")))?;

    let card = assemble_card(&row);
    let body = serialize(&card);
    let size = i64::try_from(body.len()).unwrap_or(row.size);

    Ok(LoadedCard {
        uid,
        folder_id: row.folder_id,
        etag: row.etag,
        modified_at: row.modified_at,
        size,
        card,
        body,
    })
}

/// ## Summary
/// Deletes an address object.
///
/// ## Errors
/// Returns `NotFound` when no row exists for the uid.
#[tracing::instrument(skip(conn))]
pub async fn delete_address_object(
    conn: &mut DbConnection<'_>,
    uid: uuid::Uuid,
) -> ServiceResult<()> {
    let deleted = card::delete(conn, uid).await?;
    if deleted == 0 {
        return Err(ServiceError::NotFound(format!("address object {uid}")));
    }
    Ok(())
}

/// Structural validation: VERSION and FN are required, the UID must be a
/// UUID so it can address the stored row.
fn validate(card: &VCard) -> ServiceResult<uuid::Uuid> {
    if card.version().is_none() {
        return Err(ServiceError::InvalidAddressObject(
            "missing VERSION property".to_string(),
        ));
    }
    if card.formatted_name().is_none() {
        return Err(ServiceError::InvalidAddressObject(
            "missing FN property".to_string(),
        ));
    }

    let uid = card.uid().ok_or_else(|| {
        ServiceError::InvalidAddressObject("missing UID property".to_string())
    })?;
    uuid::Uuid::parse_str(uid)
        .map_err(|_| ServiceError::InvalidAddressObject(format!("UID is not a UUID: {uid}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use almanac_rfc::vcard::parse::parse;

    #[test]
    fn validate_accepts_complete_card() {
        let card = parse(
            "BEGIN:VCARD\r\nVERSION:4.0\r\nUID:5f0c4f64-21a2-4e38-8ecb-7a80c02b1f8f\r\nFN:Jane\r\nEND:VCARD\r\n",
        )
        .unwrap();
        assert!(validate(&card).is_ok());
    }

    #[test]
    fn validate_rejects_missing_fn() {
        let card = parse(
            "BEGIN:VCARD\r\nVERSION:4.0\r\nUID:5f0c4f64-21a2-4e38-8ecb-7a80c02b1f8f\r\nEND:VCARD\r\n",
        )
        .unwrap();
        assert!(matches!(
            validate(&card).unwrap_err(),
            ServiceError::InvalidAddressObject(_)
        ));
    }

    #[test]
    fn validate_rejects_non_uuid_uid() {
        let card =
            parse("BEGIN:VCARD\r\nVERSION:4.0\r\nUID:jane\r\nFN:Jane\r\nEND:VCARD\r\n").unwrap();
        assert!(validate(&card).is_err());
    }
}
