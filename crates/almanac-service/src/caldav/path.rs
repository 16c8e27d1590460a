//! DAV path helpers.
//!
//! Object paths look like `/{user}/{prefix}/{folder_id}/{uid}.ics`; the
//! stored path segment is always `{uid}.ics` regardless of what the
//! client asked for.

use crate::error::{ServiceError, ServiceResult};

/// ## Summary
/// Extracts the folder id from a collection or object path.
///
/// ## Errors
/// Returns `NotFound` when no path segment parses as a folder id.
pub fn folder_id(path: &str) -> ServiceResult<i32> {
    let mut segments = path.split('/').filter(|s| !s.is_empty()).rev();

    let last = segments
        .next()
        .ok_or_else(|| ServiceError::NotFound(format!("no folder in path: {path}")))?;

    if let Ok(id) = last.parse::<i32>() {
        return Ok(id);
    }

    // Object path: the folder is the segment before the file name
    segments
        .next()
        .and_then(|s| s.parse::<i32>().ok())
        .ok_or_else(|| ServiceError::NotFound(format!("no folder in path: {path}")))
}

/// ## Summary
/// Extracts the object uid from a path whose final segment is
/// `{uid}.ics` (or `.vcf`).
///
/// ## Errors
/// Returns `NotFound` when the stem is not a UUID; non-UUID uids never
/// reach the store.
pub fn object_uid(path: &str) -> ServiceResult<uuid::Uuid> {
    let stem = path
        .rsplit('/')
        .next()
        .map(|name| {
            name.strip_suffix(".ics")
                .or_else(|| name.strip_suffix(".vcf"))
                .unwrap_or(name)
        })
        .unwrap_or_default();

    uuid::Uuid::parse_str(stem)
        .map_err(|_| ServiceError::NotFound(format!("object for path not found: {path}")))
}

/// Joins a home set, folder id, and uid into the canonical object path.
#[must_use]
pub fn object_path(home_set: &str, folder_id: i32, uid: uuid::Uuid, suffix: &str) -> String {
    format!(
        "{}/{folder_id}/{uid}{suffix}",
        home_set.trim_end_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_id_from_collection_path() {
        assert_eq!(folder_id("/alice/calendars/3/").unwrap(), 3);
        assert_eq!(folder_id("/alice/calendars/3").unwrap(), 3);
    }

    #[test]
    fn folder_id_from_object_path() {
        assert_eq!(
            folder_id("/alice/calendars/7/4fbe8971-0bc3-424c-9c26-36c3e1eff6b1.ics").unwrap(),
            7
        );
    }

    #[test]
    fn folder_id_rejects_pathless_input() {
        assert!(folder_id("/alice/calendars/abc/").is_err());
        assert!(folder_id("").is_err());
    }

    #[test]
    fn object_uid_strips_extension() {
        let uid = object_uid("/alice/calendars/3/4fbe8971-0bc3-424c-9c26-36c3e1eff6b1.ics")
            .unwrap();
        assert_eq!(
            uid.to_string(),
            "4fbe8971-0bc3-424c-9c26-36c3e1eff6b1"
        );
    }

    #[test]
    fn object_uid_rejects_non_uuid_stem() {
        assert!(object_uid("/alice/calendars/3/not-a-uuid.ics").is_err());
    }

    #[test]
    fn object_path_is_canonical() {
        let uid = uuid::Uuid::parse_str("4fbe8971-0bc3-424c-9c26-36c3e1eff6b1").unwrap();
        assert_eq!(
            object_path("/alice/calendars/", 3, uid, ".ics"),
            "/alice/calendars/3/4fbe8971-0bc3-424c-9c26-36c3e1eff6b1.ics"
        );
    }
}
