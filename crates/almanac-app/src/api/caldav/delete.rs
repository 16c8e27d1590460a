//! DELETE method handler for calendar objects and collections.

use salvo::http::StatusCode;
use salvo::{Depot, Request, Response, handler};

use almanac_service::caldav::backend::CalendarBackend;
use almanac_service::caldav::{folder, path};

use crate::api::dav::error::respond_service_error;
use crate::config_handler::get_config_from_depot;
use crate::db_handler::get_db_from_depot;

/// ## Summary
/// Handles DELETE: an object path removes the calendar file (dependent
/// rows cascade); a collection path removes the whole calendar.
#[handler]
#[tracing::instrument(skip_all, fields(path = %req.uri().path()))]
pub async fn delete(req: &mut Request, res: &mut Response, depot: &Depot) {
    tracing::info!("Handling DELETE request");

    let request_path = req.uri().path().to_string();

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

    // An object path ends in a UUID stem; anything else addresses the
    // collection itself.
    let result = if path::object_uid(&request_path).is_ok() {
        let backend = CalendarBackend::new(config.dav.caldav_prefix.clone());
        backend.delete_calendar_object(&mut conn, &request_path).await
    } else {
        match path::folder_id(&request_path) {
            Ok(id) => folder::delete_calendar(&mut conn, id).await,
            Err(err) => Err(err),
        }
    };

    match result {
        Ok(()) => {
            res.status_code(StatusCode::NO_CONTENT);
        }
        Err(err) => respond_service_error(res, &err),
    }
}
