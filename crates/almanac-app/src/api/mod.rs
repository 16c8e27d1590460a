//! HTTP API: the DAV method handlers and router assembly.

pub mod caldav;
pub mod carddav;
pub mod dav;

use salvo::Router;

use almanac_core::config::Settings;

use crate::middleware::auth::AuthMiddleware;

/// ## Summary
/// Constructs the DAV router: `/{principal}/{caldav_prefix}/...` and
/// `/{principal}/{carddav_prefix}/...`, all behind basic auth.
///
/// ## Errors
/// Returns an error if a method filter fails to initialize.
pub fn routes(settings: &Settings) -> anyhow::Result<Router> {
    Ok(Router::new()
        .hoop(AuthMiddleware)
        .options(dav::options::options)
        .push(
            Router::with_path("{principal}")
                .push(
                    Router::with_path(&settings.dav.caldav_prefix)
                        .push(caldav::routes()?),
                )
                .push(
                    Router::with_path(&settings.dav.carddav_prefix)
                        .push(carddav::routes()?),
                ),
        ))
}
