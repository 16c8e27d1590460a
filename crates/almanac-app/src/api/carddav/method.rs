//! CardDAV method handlers: the scalar mirror of the calendar path.

use salvo::http::{HeaderValue, StatusCode};
use salvo::writing::Text;
use salvo::{Depot, Request, Response, handler};

use almanac_core::constants::ADDRESSBOOK_CONTENT_TYPE;
use almanac_service::caldav::precondition::Preconditions;
use almanac_service::carddav::backend::AddressbookBackend;
use almanac_service::error::ServiceError;

use crate::api::dav::error::respond_service_error;
use crate::api::dav::multistatus::{address_data_response, multistatus, not_found_response};
use crate::api::dav::xml::{ReportKind, extract_displayname, extract_hrefs, report_kind};
use crate::config_handler::get_config_from_depot;
use crate::db_handler::get_db_from_depot;
use crate::middleware::auth::principal_from_depot;

macro_rules! require {
    ($res:expr, $expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(error = %e, "Request infrastructure unavailable");
                $res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
                return;
            }
        }
    };
}

/// ## Summary
/// Handles PUT for `.vcf` objects. Returns 201 or 204 with the new ETag.
#[handler]
#[tracing::instrument(skip_all, fields(path = %req.uri().path()))]
pub async fn put(req: &mut Request, res: &mut Response, depot: &Depot) {
    tracing::info!("Handling PUT request for address object");

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

    let config = require!(res, get_config_from_depot(depot));
    let provider = require!(res, get_db_from_depot(depot));
    let mut conn = require!(res, provider.get_connection().await);

    let card = match std::str::from_utf8(&body)
        .map_err(|e| ServiceError::InvalidAddressObject(format!("not valid UTF-8: {e}")))
        .and_then(|text| {
            almanac_rfc::vcard::parse::parse(text)
                .map_err(|e| ServiceError::InvalidAddressObject(format!("invalid vCard: {e}")))
        }) {
        Ok(card) => card,
        Err(err) => {
            respond_service_error(res, &err);
            return;
        }
    };

    let backend = AddressbookBackend::new(config.dav.carddav_prefix.clone());
    let principal = principal_from_depot(depot).map(str::to_string);

    match backend
        .put_address_object(&mut conn, principal.as_deref(), &path, &card, preconditions)
        .await
    {
        Ok((stored_path, outcome)) => {
            let status = if outcome.created {
                StatusCode::CREATED
            } else {
                StatusCode::NO_CONTENT
            };
            tracing::info!(path = %stored_path, etag = %outcome.etag, ?status, "Address object stored");
            res.status_code(status);
            if let Ok(value) = HeaderValue::from_str(&format!("\"{}\"", outcome.etag)) {
                #[expect(
                    clippy::let_underscore_must_use,
                    reason = "Header addition failure is non-fatal"
                )]
                let _ = res.add_header("ETag", value, true);
            }
        }
        Err(err) => respond_service_error(res, &err),
    }
}

/// ## Summary
/// Handles GET for `.vcf` objects.
#[handler]
#[tracing::instrument(skip_all, fields(path = %req.uri().path()))]
pub async fn get(req: &mut Request, res: &mut Response, depot: &Depot) {
    tracing::debug!("Handling GET request for address object");

    let path = req.uri().path().to_string();

    let config = require!(res, get_config_from_depot(depot));
    let provider = require!(res, get_db_from_depot(depot));
    let mut conn = require!(res, provider.get_connection().await);

    let backend = AddressbookBackend::new(config.dav.carddav_prefix.clone());
    let principal = principal_from_depot(depot).map(str::to_string);

    match backend
        .get_address_object(&mut conn, principal.as_deref(), &path)
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
                HeaderValue::from_static(ADDRESSBOOK_CONTENT_TYPE),
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

/// ## Summary
/// Handles DELETE for `.vcf` objects.
#[handler]
#[tracing::instrument(skip_all, fields(path = %req.uri().path()))]
pub async fn delete(req: &mut Request, res: &mut Response, depot: &Depot) {
    tracing::info!("Handling DELETE request for address object");

    let path = req.uri().path().to_string();

    let config = require!(res, get_config_from_depot(depot));
    let provider = require!(res, get_db_from_depot(depot));
    let mut conn = require!(res, provider.get_connection().await);

    let backend = AddressbookBackend::new(config.dav.carddav_prefix.clone());

    match backend.delete_address_object(&mut conn, &path).await {
        Ok(()) => {
            res.status_code(StatusCode::NO_CONTENT);
        }
        Err(err) => respond_service_error(res, &err),
    }
}

/// ## Summary
/// Creates an addressbook collection via extended MKCOL.
#[handler]
#[tracing::instrument(skip_all, fields(path = %req.uri().path()))]
pub async fn mkcol(req: &mut Request, res: &mut Response, depot: &Depot) {
    tracing::info!("Handling MKCOL request for addressbook");

    let requested_name = req
        .uri()
        .path()
        .split('/')
        .filter(|s| !s.is_empty())
        .next_back()
        .unwrap_or("contacts")
        .to_string();

    let body = match req.payload().await {
        Ok(bytes) => String::from_utf8_lossy(bytes).to_string(),
        Err(_) => String::new(),
    };
    let name = extract_displayname(&body).unwrap_or(requested_name);

    let config = require!(res, get_config_from_depot(depot));
    let provider = require!(res, get_db_from_depot(depot));
    let mut conn = require!(res, provider.get_connection().await);

    let backend = AddressbookBackend::new(config.dav.carddav_prefix.clone());

    match backend.create_addressbook(&mut conn, &name, None).await {
        Ok(book) => {
            tracing::info!(id = book.id, "Addressbook collection created");
            res.status_code(StatusCode::CREATED);
        }
        Err(err) => respond_service_error(res, &err),
    }
}

/// ## Summary
/// Handles REPORT on addressbook collections (addressbook-multiget).
#[handler]
#[tracing::instrument(skip_all, fields(path = %req.uri().path()))]
pub async fn report(req: &mut Request, res: &mut Response, depot: &Depot) {
    tracing::debug!("Handling REPORT request for addressbook");

    let body = match req.payload().await {
        Ok(bytes) => String::from_utf8_lossy(bytes).to_string(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read request body");
            res.status_code(StatusCode::BAD_REQUEST);
            return;
        }
    };

    if report_kind(&body) != Some(ReportKind::AddressbookMultiget) {
        res.status_code(StatusCode::BAD_REQUEST);
        return;
    }

    let config = require!(res, get_config_from_depot(depot));
    let provider = require!(res, get_db_from_depot(depot));
    let mut conn = require!(res, provider.get_connection().await);

    let backend = AddressbookBackend::new(config.dav.carddav_prefix.clone());
    let principal = principal_from_depot(depot).map(str::to_string);

    let mut responses = Vec::new();
    for href in extract_hrefs(&body) {
        match backend
            .get_address_object(&mut conn, principal.as_deref(), &href)
            .await
        {
            Ok(object) => {
                responses.push(address_data_response(&object.path, &object.etag, &object.body));
            }
            Err(ServiceError::NotFound(_)) => responses.push(not_found_response(&href)),
            Err(err) => {
                respond_service_error(res, &err);
                return;
            }
        }
    }

    res.status_code(StatusCode::MULTI_STATUS);
    res.render(Text::Xml(multistatus(&responses)));
}
