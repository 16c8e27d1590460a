//! Maps service errors onto HTTP statuses and DAV error bodies.

use salvo::Response;
use salvo::http::{HeaderValue, StatusCode};
use salvo::writing::Text;

use almanac_service::error::ServiceError;

/// DAV error body for a calendar object that fails validation.
const VALID_CALENDAR_OBJECT: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
<D:error xmlns:D=\"DAV:\" xmlns:C=\"urn:ietf:params:xml:ns:caldav\">\n\
  <C:valid-calendar-object-resource/>\n\
</D:error>\n";

/// DAV error body for an address object that fails validation.
const VALID_ADDRESS_OBJECT: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
<D:error xmlns:D=\"DAV:\" xmlns:CARD=\"urn:ietf:params:xml:ns:carddav\">\n\
  <CARD:valid-address-data/>\n\
</D:error>\n";

/// DAV error body for a failed conditional write.
const PRECONDITION_FAILED: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
<D:error xmlns:D=\"DAV:\">\n\
  <D:precondition-failed/>\n\
</D:error>\n";

/// ## Summary
/// Writes the response for a failed service call.
///
/// Validation failures and precondition failures both surface as 412
/// with their DAV error element; everything else maps per kind, and
/// unexpected errors become an opaque 500.
pub fn respond_service_error(res: &mut Response, err: &ServiceError) {
    match err {
        ServiceError::InvalidCalendarObject(msg) => {
            tracing::warn!(reason = %msg, "Calendar object rejected");
            res.status_code(StatusCode::PRECONDITION_FAILED);
            res.render(Text::Xml(VALID_CALENDAR_OBJECT));
        }
        ServiceError::InvalidAddressObject(msg) => {
            tracing::warn!(reason = %msg, "Address object rejected");
            res.status_code(StatusCode::PRECONDITION_FAILED);
            res.render(Text::Xml(VALID_ADDRESS_OBJECT));
        }
        ServiceError::PreconditionNoneMatchFailed | ServiceError::PreconditionMatchFailed => {
            tracing::warn!("Conditional write precondition failed");
            res.status_code(StatusCode::PRECONDITION_FAILED);
            res.render(Text::Xml(PRECONDITION_FAILED));
        }
        ServiceError::BadRequest(msg) | ServiceError::InvalidQuery(msg) => {
            tracing::warn!(reason = %msg, "Bad request");
            res.status_code(StatusCode::BAD_REQUEST);
        }
        ServiceError::NotFound(what) => {
            tracing::debug!(what = %what, "Resource not found");
            res.status_code(StatusCode::NOT_FOUND);
        }
        ServiceError::NotAuthenticated => {
            res.status_code(StatusCode::UNAUTHORIZED);
            #[expect(
                clippy::let_underscore_must_use,
                reason = "Header addition failure is non-fatal"
            )]
            let _ = res.add_header(
                "WWW-Authenticate",
                HeaderValue::from_static("Basic realm=\"almanac\""),
                true,
            );
        }
        ServiceError::Conflict(msg) => {
            tracing::warn!(reason = %msg, "Conflict");
            res.status_code(StatusCode::CONFLICT);
        }
        ServiceError::DatabaseError(_)
        | ServiceError::DieselError(_)
        | ServiceError::RfcError(_)
        | ServiceError::CoreError(_) => {
            tracing::error!(error = %err, "Internal error");
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}
