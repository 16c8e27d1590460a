//! MKCALENDAR / MKCOL handler for calendar collections.

use salvo::http::StatusCode;
use salvo::{Depot, Request, Response, handler};

use almanac_service::caldav::backend::CalendarBackend;
use almanac_service::caldav::folder::CreateCalendarRequest;

use crate::api::dav::error::respond_service_error;
use crate::api::dav::xml::extract_displayname;
use crate::config_handler::get_config_from_depot;
use crate::db_handler::get_db_from_depot;
use crate::middleware::auth::principal_from_depot;

/// ## Summary
/// Creates a calendar collection. The request body's `displayname` names
/// the calendar; the server assigns the collection id, so the path
/// segment the client chose is advisory. Missing component set and size
/// get the server defaults.
#[handler]
#[tracing::instrument(skip_all, fields(path = %req.uri().path()))]
pub async fn mkcalendar(req: &mut Request, res: &mut Response, depot: &Depot) {
    tracing::info!("Handling MKCALENDAR request");

    let requested_name = req
        .uri()
        .path()
        .split('/')
        .filter(|s| !s.is_empty())
        .next_back()
        .unwrap_or("calendar")
        .to_string();

    let body = match req.payload().await {
        Ok(bytes) => String::from_utf8_lossy(bytes).to_string(),
        Err(_) => String::new(),
    };
    let name = extract_displayname(&body).unwrap_or(requested_name);

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

    let request = CreateCalendarRequest {
        name,
        ..CreateCalendarRequest::default()
    };

    match backend.create_calendar(&mut conn, request).await {
        Ok(calendar) => {
            let location = backend
                .calendar_home_set_path(principal.as_deref())
                .map(|home| format!("{home}{}/", calendar.id));
            tracing::info!(id = calendar.id, "Calendar collection created");
            res.status_code(StatusCode::CREATED);
            if let Ok(location) = location
                && let Ok(value) = salvo::http::HeaderValue::from_str(&location)
            {
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
