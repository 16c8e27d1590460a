//! CalDAV method handlers.

use salvo::{Router, http::Method, routing::MethodFilter};

pub mod delete;
pub mod get;
pub mod mkcalendar;
pub mod put;
pub mod report;

/// ## Summary
/// Builds the CalDAV method router mounted under the calendar prefix.
///
/// ## Errors
/// Returns an error if a custom method filter fails to initialize.
pub fn routes() -> anyhow::Result<Router> {
    Ok(Router::with_path("{**rest}")
        .options(crate::api::dav::options::options)
        .get(get::get)
        .put(put::put)
        .delete(delete::delete)
        .push(
            Router::new()
                .filter_fn(|req, _| req.method().as_str() == "PROPFIND")
                .goal(crate::api::dav::propfind::propfind),
        )
        .push(
            Router::new()
                .filter(MethodFilter(Method::from_bytes(b"MKCALENDAR")?))
                .goal(mkcalendar::mkcalendar),
        )
        .push(
            Router::new()
                .filter_fn(|req, _| req.method().as_str() == "MKCOL")
                .goal(mkcalendar::mkcalendar),
        )
        .push(
            Router::new()
                .filter(MethodFilter(Method::from_bytes(b"REPORT")?))
                .goal(report::report),
        ))
}
