//! REPORT method handler: calendar-query and calendar-multiget.

use salvo::http::StatusCode;
use salvo::writing::Text;
use salvo::{Depot, Request, Response, handler};

use almanac_service::caldav::backend::{CalendarBackend, CalendarQuery};
use almanac_service::error::ServiceError;

use crate::api::dav::error::respond_service_error;
use crate::api::dav::multistatus::{calendar_data_response, multistatus, not_found_response};
use crate::api::dav::xml::{ReportKind, extract_hrefs, extract_query_filter, report_kind};
use crate::config_handler::get_config_from_depot;
use crate::db_handler::get_db_from_depot;
use crate::middleware::auth::principal_from_depot;

/// ## Summary
/// Handles REPORT on calendar collections.
///
/// calendar-multiget resolves each href, reporting 404 per missing
/// member; calendar-query filters the collection by component kind and
/// time range. Both return 207 with inline calendar-data.
#[handler]
#[tracing::instrument(skip_all, fields(path = %req.uri().path()))]
pub async fn report(req: &mut Request, res: &mut Response, depot: &Depot) {
    tracing::debug!("Handling REPORT request");

    let path = req.uri().path().to_string();

    let body = match req.payload().await {
        Ok(bytes) => String::from_utf8_lossy(bytes).to_string(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read request body");
            res.status_code(StatusCode::BAD_REQUEST);
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

    let backend = CalendarBackend::new(config.dav.caldav_prefix.clone());
    let principal = principal_from_depot(depot).map(str::to_string);

    let result = match report_kind(&body) {
        Some(ReportKind::CalendarMultiget) => {
            multiget(&mut conn, &backend, principal.as_deref(), &body).await
        }
        Some(ReportKind::CalendarQuery) => {
            query(&mut conn, &backend, principal.as_deref(), &path, &body).await
        }
        Some(ReportKind::AddressbookMultiget) | None => {
            Err(ServiceError::InvalidQuery("unsupported report".to_string()))
        }
    };

    match result {
        Ok(responses) => {
            res.status_code(StatusCode::MULTI_STATUS);
            res.render(Text::Xml(multistatus(&responses)));
        }
        Err(err) => respond_service_error(res, &err),
    }
}

async fn multiget(
    conn: &mut almanac_db::db::connection::DbConnection<'_>,
    backend: &CalendarBackend,
    principal: Option<&str>,
    body: &str,
) -> Result<Vec<String>, ServiceError> {
    let mut responses = Vec::new();

    for href in extract_hrefs(body) {
        match backend.get_calendar_object(conn, principal, &href).await {
            Ok(object) => {
                responses.push(calendar_data_response(&object.path, &object.etag, &object.body));
            }
            Err(ServiceError::NotFound(_)) => responses.push(not_found_response(&href)),
            Err(err) => return Err(err),
        }
    }

    Ok(responses)
}

async fn query(
    conn: &mut almanac_db::db::connection::DbConnection<'_>,
    backend: &CalendarBackend,
    principal: Option<&str>,
    path: &str,
    body: &str,
) -> Result<Vec<String>, ServiceError> {
    let filter = extract_query_filter(body);
    let query = CalendarQuery {
        component: filter.component,
        start: filter.start,
        end: filter.end,
    };

    let objects = backend
        .query_calendar_objects(conn, principal, path, &query)
        .await?;

    Ok(objects
        .into_iter()
        .map(|object| calendar_data_response(&object.path, &object.etag, &object.body))
        .collect())
}
