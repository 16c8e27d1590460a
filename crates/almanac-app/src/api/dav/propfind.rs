//! PROPFIND method handler.
//!
//! Serves the fixed property set DAV clients discover collections with:
//! resource types, display names, and the object metadata (ETag, content
//! type, length, last-modified). Property negotiation beyond that set is
//! a concern of the layer above the backend.

use salvo::http::StatusCode;
use salvo::writing::Text;
use salvo::{Depot, Request, Response, handler};

use almanac_core::constants::{ADDRESSBOOK_CONTENT_TYPE, CALENDAR_CONTENT_TYPE};
use almanac_service::caldav::backend::CalendarBackend;
use almanac_service::carddav::backend::AddressbookBackend;

use crate::api::dav::error::respond_service_error;
use crate::api::dav::multistatus::{
    collection_response, multistatus, object_response, plain_collection_response,
};
use crate::config_handler::get_config_from_depot;
use crate::db_handler::get_db_from_depot;
use crate::middleware::auth::principal_from_depot;

/// ## Summary
/// Handles PROPFIND on home sets, collections, and objects.
///
/// Depth 0 describes the addressed resource; depth 1 adds its members.
#[handler]
#[tracing::instrument(skip_all, fields(path = %req.uri().path()))]
pub async fn propfind(req: &mut Request, res: &mut Response, depot: &Depot) {
    tracing::debug!("Handling PROPFIND request");

    let path = req.uri().path().to_string();
    let depth = req
        .headers()
        .get("Depth")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("0")
        .to_string();
    let list_members = depth != "0";

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

    let principal = principal_from_depot(depot).map(str::to_string);

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let Some(prefix) = segments.get(1) else {
        res.status_code(StatusCode::NOT_FOUND);
        return;
    };
    let rest = &segments[2..];

    let result = if *prefix == config.dav.caldav_prefix {
        caldav_propfind(
            &mut conn,
            &CalendarBackend::new(config.dav.caldav_prefix.clone()),
            principal.as_deref(),
            &path,
            rest,
            list_members,
        )
        .await
    } else if *prefix == config.dav.carddav_prefix {
        carddav_propfind(
            &mut conn,
            &AddressbookBackend::new(config.dav.carddav_prefix.clone()),
            principal.as_deref(),
            &path,
            rest,
            list_members,
        )
        .await
    } else {
        res.status_code(StatusCode::NOT_FOUND);
        return;
    };

    match result {
        Ok(responses) => {
            res.status_code(StatusCode::MULTI_STATUS);
            res.render(Text::Xml(multistatus(&responses)));
        }
        Err(err) => respond_service_error(res, &err),
    }
}

async fn caldav_propfind(
    conn: &mut almanac_db::db::connection::DbConnection<'_>,
    backend: &CalendarBackend,
    principal: Option<&str>,
    path: &str,
    rest: &[&str],
    list_members: bool,
) -> Result<Vec<String>, almanac_service::error::ServiceError> {
    let mut responses = Vec::new();

    match rest {
        [] => {
            let home_set = backend.calendar_home_set_path(principal)?;
            responses.push(plain_collection_response(&home_set, "Calendars"));
            if list_members {
                for (href, calendar) in backend.list_calendars(conn, principal).await? {
                    responses.push(collection_response(
                        &href,
                        &calendar.name,
                        calendar.description.as_deref(),
                        true,
                    ));
                }
            }
        }
        [_collection] => {
            let calendar = backend.get_calendar(conn, path).await?;
            let home_set = backend.calendar_home_set_path(principal)?;
            let href = format!("{home_set}{}/", calendar.id);
            responses.push(collection_response(
                &href,
                &calendar.name,
                calendar.description.as_deref(),
                true,
            ));
            if list_members {
                for object in backend.list_calendar_objects(conn, principal, path).await? {
                    responses.push(object_response(
                        &object.path,
                        &object.etag,
                        CALENDAR_CONTENT_TYPE,
                        object.size,
                        object.modified_at,
                    ));
                }
            }
        }
        _ => {
            let object = backend.get_calendar_object(conn, principal, path).await?;
            responses.push(object_response(
                &object.path,
                &object.etag,
                CALENDAR_CONTENT_TYPE,
                object.size,
                object.modified_at,
            ));
        }
    }

    Ok(responses)
}

async fn carddav_propfind(
    conn: &mut almanac_db::db::connection::DbConnection<'_>,
    backend: &AddressbookBackend,
    principal: Option<&str>,
    path: &str,
    rest: &[&str],
    list_members: bool,
) -> Result<Vec<String>, almanac_service::error::ServiceError> {
    let mut responses = Vec::new();

    match rest {
        [] => {
            let home_set = backend.addressbook_home_set_path(principal)?;
            responses.push(plain_collection_response(&home_set, "Contacts"));
            if list_members {
                for (href, book) in backend.list_addressbooks(conn, principal).await? {
                    responses.push(collection_response(
                        &href,
                        &book.name,
                        book.description.as_deref(),
                        false,
                    ));
                }
            }
        }
        [_collection] => {
            let home_set = backend.addressbook_home_set_path(principal)?;
            let books = backend.list_addressbooks(conn, principal).await?;
            let folder_id = almanac_service::caldav::path::folder_id(path)?;
            let book = books
                .into_iter()
                .find(|(_, b)| b.id == folder_id)
                .ok_or_else(|| {
                    almanac_service::error::ServiceError::NotFound(format!(
                        "addressbook {folder_id}"
                    ))
                })?;
            let href = format!("{home_set}{}/", book.1.id);
            responses.push(collection_response(
                &href,
                &book.1.name,
                book.1.description.as_deref(),
                false,
            ));
            if list_members {
                for object in backend.list_address_objects(conn, principal, path).await? {
                    responses.push(object_response(
                        &object.path,
                        &object.etag,
                        ADDRESSBOOK_CONTENT_TYPE,
                        object.size,
                        object.modified_at,
                    ));
                }
            }
        }
        _ => {
            let object = backend.get_address_object(conn, principal, path).await?;
            responses.push(object_response(
                &object.path,
                &object.etag,
                ADDRESSBOOK_CONTENT_TYPE,
                object.size,
                object.modified_at,
            ));
        }
    }

    Ok(responses)
}
