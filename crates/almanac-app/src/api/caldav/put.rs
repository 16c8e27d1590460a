//! PUT method handler for calendar objects.

use salvo::http::{HeaderValue, StatusCode};
use salvo::{Depot, Request, Response, handler};

use almanac_service::caldav::backend::CalendarBackend;
use almanac_service::caldav::precondition::Preconditions;
use almanac_service::error::ServiceError;

use crate::api::dav::error::respond_service_error;
use crate::config_handler::get_config_from_depot;
use crate::db_handler::get_db_from_depot;
use crate::middleware::auth::principal_from_depot;

/// ## Summary
/// Handles PUT for `.ics` objects: parses the body, applies the
/// conditional headers, and stores the object through the backend.
/// Returns 201 for a create, 204 for an overwrite, with the new ETag.
#[handler]
#[tracing::instrument(skip_all, fields(path = %req.uri().path()))]
pub async fn put(req: &mut Request, res: &mut Response, depot: &Depot) {
    tracing::info!("Handling PUT request for calendar object");

    let path = req.uri().path().to_string();

    let body = match req.payload().await {
        Ok(bytes) => bytes.to_vec(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read request body");
            res.status_code(StatusCode::BAD_REQUEST);
            return;
        }
    };

    let if_none_match = req
        .headers()
        .get("If-None-Match")
        .and_then(|h| h.to_str().ok())
        .map(String::from);
    let if_match = req
        .headers()
        .get("If-Match")
        .and_then(|h| h.to_str().ok())
        .map(String::from);

    let preconditions =
        match Preconditions::from_headers(if_none_match.as_deref(), if_match.as_deref()) {
            Ok(pre) => pre,
            Err(err) => {
                respond_service_error(res, &err);
                return;
            }
        };

    let Ok(config) = get_config_from_depot(depot) else {
        res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
        return;
    };
    let Ok(provider) = get_db_from_depot(depot) else {
        res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
        return;
    };
    let mut conn = match provider.get_connection().await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!(error = %e, "Failed to get database connection");
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
            return;
        }
    };

    let ical = match std::str::from_utf8(&body)
        .map_err(|e| ServiceError::InvalidCalendarObject(format!("not valid UTF-8: {e}")))
        .and_then(|text| {
            almanac_rfc::ical::parse::parse(text)
                .map_err(|e| ServiceError::InvalidCalendarObject(format!("invalid iCalendar: {e}")))
        }) {
        Ok(ical) => ical,
        Err(err) => {
            respond_service_error(res, &err);
            return;
        }
    };

    let backend = CalendarBackend::new(config.dav.caldav_prefix.clone());
    let principal = principal_from_depot(depot).map(str::to_string);

    match backend
        .put_calendar_object(&mut conn, principal.as_deref(), &path, ical, preconditions)
        .await
    {
        Ok((stored_path, outcome)) => {
            let status = if outcome.created {
                StatusCode::CREATED
            } else {
                StatusCode::NO_CONTENT
            };
            tracing::info!(path = %stored_path, etag = %outcome.etag, ?status, "Calendar object stored");
            res.status_code(status);
            if let Ok(value) = HeaderValue::from_str(&format!("\"{}\"", outcome.etag)) {
                #[expect(
                    clippy::let_underscore_must_use,
                    reason = "Header addition failure is non-fatal"
                )]
                let _ = res.add_header("ETag", value, true);
            }
            if let Ok(value) = HeaderValue::from_str(&stored_path) {
                #[expect(
                    clippy::let_underscore_must_use,
                    reason = "Header addition failure is non-fatal"
                )]
                let _ = res.add_header("Location", value, true);
            }
        }
        Err(err) => respond_service_error(res, &err),
    }
}
