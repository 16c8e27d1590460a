//! OPTIONS method handler for `WebDAV` resources.

use salvo::http::HeaderValue;
use salvo::{Request, Response, handler};

/// ## Summary
/// Handles OPTIONS requests: advertises the DAV compliance classes and
/// the allowed methods.
///
/// ## Side Effects
/// Sets the `Allow` and `DAV` headers on the response.
#[handler]
#[tracing::instrument(skip_all, fields(path = %req.uri().path()))]
pub async fn options(req: &mut Request, res: &mut Response) {
    tracing::debug!("Handling OPTIONS request");

    let allow_methods = "OPTIONS, GET, HEAD, PUT, DELETE, PROPFIND, REPORT, MKCALENDAR, MKCOL";
    let dav_header = "1, 3, calendar-access, addressbook";

    #[expect(
        clippy::let_underscore_must_use,
        reason = "Header addition failure is non-fatal"
    )]
    let _ = res.add_header("Allow", HeaderValue::from_static(allow_methods), true);
    #[expect(
        clippy::let_underscore_must_use,
        reason = "Header addition failure is non-fatal"
    )]
    let _ = res.add_header("DAV", HeaderValue::from_static(dav_header), true);
    res.status_code(salvo::http::StatusCode::OK);
}
