//! CORS policy for browser clients.
//!
//! Decided before authorization so that 401 and 500 responses carry the same
//! cross-origin headers as successes; a response without them is invisible to
//! browser-based error handling.
//!
//! Policy:
//! - Development: permissive (Allow-Origin: *), WITHOUT credentials.
//! - Production: allowlist of trusted origins from configuration, WITH
//!   credentials so browser callers can send secure cookies.

use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::Config;

/// Build the CORS layer for the configured trust policy.
///
/// IMPORTANT:
/// - Never combine wildcard origin (`Any`) with `allow_credentials(true)`.
pub fn layer(config: &Config) -> CorsLayer {
    let cors = if config.app_env.is_production() {
        // Production: exact-match allowlist. An empty allowlist intentionally
        // allows none, which is safer than accidentally allowing all.
        let allowed: Vec<HeaderValue> = config
            .api
            .trusted_origins
            .iter()
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _req| {
            allowed.iter().any(|v| v == origin)
        });

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_credentials(true)
    } else {
        // Development: permissive (no credentials)
        CorsLayer::new().allow_origin(Any)
    };

    cors.allow_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ])
    .allow_headers([
        header::AUTHORIZATION,
        header::CONTENT_TYPE,
        header::ACCEPT,
        HeaderName::from_static("x-request-id"),
    ])
    .max_age(std::time::Duration::from_secs(60 * 10))
}
