//! CardDAV method handlers.

use salvo::{Router, http::Method, routing::MethodFilter};

pub mod method;

/// ## Summary
/// Builds the CardDAV method router mounted under the contact prefix.
///
/// ## Errors
/// Returns an error if a custom method filter fails to initialize.
pub fn routes() -> anyhow::Result<Router> {
    Ok(Router::with_path("{**rest}")
        .options(crate::api::dav::options::options)
        .get(method::get)
        .put(method::put)
        .delete(method::delete)
        .push(
            Router::new()
                .filter_fn(|req, _| req.method().as_str() == "PROPFIND")
                .goal(crate::api::dav::propfind::propfind),
        )
        .push(
            Router::new()
                .filter_fn(|req, _| req.method().as_str() == "MKCOL")
                .goal(method::mkcol),
        )
        .push(
            Router::new()
                .filter(MethodFilter(Method::from_bytes(b"REPORT")?))
                .goal(method::report),
        ))
}
