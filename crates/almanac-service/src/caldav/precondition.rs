//! Conditional-write precondition evaluation (RFC 7232 as used by CalDAV).

use crate::error::{ServiceError, ServiceResult};

/// Parsed conditional headers of one PUT.
#[derive(Debug, Clone, Default)]
pub struct Preconditions {
    /// `If-None-Match: *` was supplied: the write must create.
    pub if_none_match_star: bool,
    /// `If-Match` entity tag, unquoted: the write must replace exactly
    /// this stored version.
    pub if_match: Option<String>,
}

impl Preconditions {
    /// ## Summary
    /// Builds preconditions from the raw header values.
    ///
    /// `If-None-Match` is only honored in its wildcard form. A quoted
    /// `If-Match` yields its entity tag; anything unquoted is malformed.
    ///
    /// ## Errors
    /// Returns `BadRequest` for a malformed `If-Match` value.
    pub fn from_headers(
        if_none_match: Option<&str>,
        if_match: Option<&str>,
    ) -> ServiceResult<Self> {
        let if_match = if_match.map(parse_entity_tag).transpose()?;
        Ok(Self {
            if_none_match_star: if_none_match.is_some_and(|v| v.trim() == "*"),
            if_match,
        })
    }

    /// Returns whether this PUT is a conditional update.
    #[must_use]
    pub const fn is_conditional_update(&self) -> bool {
        self.if_match.is_some()
    }

    /// ## Summary
    /// Evaluates the preconditions against the stored ETag, if any row
    /// exists.
    ///
    /// ## Errors
    /// - `PreconditionNoneMatchFailed` when `If-None-Match: *` was given
    ///   and a row exists.
    /// - `PreconditionMatchFailed` when `If-Match` was given and no row
    ///   exists or the stored ETag differs.
    pub fn evaluate(&self, stored_etag: Option<&str>) -> ServiceResult<()> {
        if self.if_none_match_star && stored_etag.is_some() {
            return Err(ServiceError::PreconditionNoneMatchFailed);
        }

        if let Some(want) = &self.if_match {
            match stored_etag {
                None => return Err(ServiceError::PreconditionMatchFailed),
                Some(stored) if stored != want => {
                    return Err(ServiceError::PreconditionMatchFailed);
                }
                Some(_) => {}
            }
        }

        Ok(())
    }
}

/// Strips the surrounding quotes (and a weak prefix) off an entity tag.
fn parse_entity_tag(raw: &str) -> ServiceResult<String> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix("W/").unwrap_or(trimmed);

    trimmed
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ServiceError::BadRequest(format!("malformed entity tag: {raw}")))
}

/// ## Summary
/// The SEQUENCE the stored component gets.
///
/// A matched `If-Match` update bumps once past both the stored and the
/// supplied value. Otherwise the supplied value is preserved, defaulting
/// to 1 when the component carries none.
#[must_use]
pub fn next_sequence(stored: Option<i32>, supplied: Option<i32>, matched_update: bool) -> i32 {
    if matched_update {
        stored.unwrap_or(0).max(supplied.unwrap_or(0)) + 1
    } else {
        supplied.unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_fails_against_existing_row() {
        let pre = Preconditions::from_headers(Some("*"), None).unwrap();
        let err = pre.evaluate(Some("abc")).unwrap_err();
        assert!(matches!(err, ServiceError::PreconditionNoneMatchFailed));
    }

    #[test]
    fn wildcard_passes_when_absent() {
        let pre = Preconditions::from_headers(Some("*"), None).unwrap();
        assert!(pre.evaluate(None).is_ok());
    }

    #[test]
    fn if_match_requires_existing_row() {
        let pre = Preconditions::from_headers(None, Some("\"abc\"")).unwrap();
        let err = pre.evaluate(None).unwrap_err();
        assert!(matches!(err, ServiceError::PreconditionMatchFailed));
    }

    #[test]
    fn if_match_rejects_stale_etag() {
        let pre = Preconditions::from_headers(None, Some("\"stale\"")).unwrap();
        let err = pre.evaluate(Some("current")).unwrap_err();
        assert!(matches!(err, ServiceError::PreconditionMatchFailed));
    }

    #[test]
    fn if_match_accepts_current_etag() {
        let pre = Preconditions::from_headers(None, Some("\"current\"")).unwrap();
        assert!(pre.evaluate(Some("current")).is_ok());
        assert!(pre.is_conditional_update());
    }

    #[test]
    fn weak_tags_are_accepted() {
        let pre = Preconditions::from_headers(None, Some("W/\"abc\"")).unwrap();
        assert_eq!(pre.if_match.as_deref(), Some("abc"));
    }

    #[test]
    fn malformed_if_match_is_bad_request() {
        let err = Preconditions::from_headers(None, Some("unquoted")).unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));

        let err = Preconditions::from_headers(None, Some("\"\"")).unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
    }

    #[test]
    fn non_wildcard_if_none_match_is_ignored() {
        let pre = Preconditions::from_headers(Some("\"abc\""), None).unwrap();
        assert!(!pre.if_none_match_star);
        assert!(pre.evaluate(Some("abc")).is_ok());
    }

    #[test]
    fn unconditional_put_preserves_supplied_sequence() {
        assert_eq!(next_sequence(Some(4), Some(9), false), 9);
        assert_eq!(next_sequence(None, Some(2), false), 2);
    }

    #[test]
    fn unconditional_put_defaults_sequence_to_one() {
        assert_eq!(next_sequence(None, None, false), 1);
        assert_eq!(next_sequence(Some(5), None, false), 1);
    }

    #[test]
    fn matched_update_bumps_past_both() {
        assert_eq!(next_sequence(Some(3), Some(1), true), 4);
        assert_eq!(next_sequence(Some(1), Some(3), true), 4);
        assert_eq!(next_sequence(None, None, true), 1);
        assert_eq!(next_sequence(Some(1), Some(1), true), 2);
    }
}
