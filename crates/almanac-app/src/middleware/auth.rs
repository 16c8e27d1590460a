//! Basic authentication against the configured single user.
//!
//! The authenticated user name becomes the DAV principal; their home
//! sets live under `/{user}/...`. OPTIONS passes unauthenticated so
//! clients can probe capabilities.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use salvo::Depot;
use salvo::http::HeaderValue;
use tracing::error;

use crate::config_handler::get_config_from_depot;

/// Depot key the authenticated principal name is stored under.
pub const PRINCIPAL_KEY: &str = "almanac.principal";

/// Returns the authenticated principal, if the request carried one.
#[must_use]
pub fn principal_from_depot(depot: &Depot) -> Option<&str> {
    depot.get::<String>(PRINCIPAL_KEY).ok().map(String::as_str)
}

/// ## Summary
/// Middleware that authenticates the request and stores the principal in
/// the depot. Failure short-circuits with 401 and a Basic challenge.
pub struct AuthMiddleware;

#[salvo::async_trait]
impl salvo::Handler for AuthMiddleware {
    #[tracing::instrument(skip(self, req, depot, res, ctrl), fields(
        method = %req.method(),
        path = %req.uri().path()
    ))]
    async fn handle(
        &self,
        req: &mut salvo::Request,
        depot: &mut Depot,
        res: &mut salvo::Response,
        ctrl: &mut salvo::FlowCtrl,
    ) {
        if req.method() == salvo::http::Method::OPTIONS {
            return;
        }

        let config = match get_config_from_depot(depot) {
            Ok(cfg) => cfg,
            Err(e) => {
                error!(error = ?e, "Failed to get config from depot");
                res.status_code(salvo::http::StatusCode::INTERNAL_SERVER_ERROR);
                ctrl.skip_rest();
                return;
            }
        };

        let authorization = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok());

        match authorization.and_then(decode_basic) {
            Some((user, password))
                if user == config.auth.user && password == config.auth.password =>
            {
                tracing::debug!(user = %user, "Request authenticated");
                depot.insert(PRINCIPAL_KEY, user);
            }
            _ => {
                tracing::debug!("Request not authenticated, challenging");
                res.status_code(salvo::http::StatusCode::UNAUTHORIZED);
                #[expect(
                    clippy::let_underscore_must_use,
                    reason = "Header addition failure is non-fatal"
                )]
                let _ = res.add_header(
                    "WWW-Authenticate",
                    HeaderValue::from_static("Basic realm=\"almanac\""),
                    true,
                );
                ctrl.skip_rest();
            }
        }
    }
}

/// Decodes `Basic <base64(user:password)>` into its parts.
fn decode_basic(header: &str) -> Option<(String, String)> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}
