//! GET method handler for calendar objects.

use salvo::http::{HeaderValue, StatusCode};
use salvo::{Depot, Request, Response, handler};

use almanac_core::constants::CALENDAR_CONTENT_TYPE;
use almanac_service::caldav::backend::CalendarBackend;

use crate::api::dav::error::respond_service_error;
use crate::config_handler::get_config_from_depot;
use crate::db_handler::get_db_from_depot;
use crate::middleware::auth::principal_from_depot;

/// ## Summary
/// Handles GET for `.ics` objects: rehydrates the object graph from the
/// store, re-encodes it canonically, and returns the body with its ETag.
#[handler]
#[tracing::instrument(skip_all, fields(path = %req.uri().path()))]
pub async fn get(req: &mut Request, res: &mut Response, depot: &Depot) {
    tracing::debug!("Handling GET request for calendar object");

    let path = req.uri().path().to_string();

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

    let backend = CalendarBackend::new(config.dav.caldav_prefix.clone());
    let principal = principal_from_depot(depot).map(str::to_string);

    match backend
        .get_calendar_object(&mut conn, principal.as_deref(), &path)
        .await
    {
        Ok(object) => {
            res.status_code(StatusCode::OK);
            #[expect(
                clippy::let_underscore_must_use,
                reason = "Header addition failure is non-fatal"
            )]
            let _ = res.add_header(
                "Content-Type",
                HeaderValue::from_static(CALENDAR_CONTENT_TYPE),
                true,
            );
            if let Ok(value) = HeaderValue::from_str(&format!("\"{}\"", object.etag)) {
                #[expect(
                    clippy::let_underscore_must_use,
                    reason = "Header addition failure is non-fatal"
                )]
                let _ = res.add_header("ETag", value, true);
            }
            #[expect(
                clippy::let_underscore_must_use,
                reason = "Body write failure surfaces as a closed connection"
            )]
            let _ = res.write_body(object.body);
        }
        Err(err) => respond_service_error(res, &err),
    }
}
