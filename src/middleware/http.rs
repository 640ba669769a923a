//! HTTP transport middleware (outside the request pipeline proper).
//!
//! Responsibility:
//! - Request-Id generation + propagation (X-Request-Id)
//! - Body size limits
//! - Global timeouts
//!
//! These sit outside the logged pipeline: a request id must exist before the
//! log entry opens, and a transport-level timeout can fire before the
//! pipeline ever runs.

use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::http::{StatusCode, header::HeaderName};
use axum::response::IntoResponse;
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::error::{ApiError, SERVER_ERROR};

/// Apply transport middleware to the given Router.
///
/// Defaults:
/// - Request-Id header: `x-request-id`
/// - Body limit: 1 MiB
/// - Timeout: 30 seconds
pub fn apply(router: Router) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");

    let layers = ServiceBuilder::new()
        // Make the service error `Infallible` by converting errors into
        // shaped responses.
        .layer(HandleErrorLayer::new(|err: BoxError| async move {
            if err.is::<tower::timeout::error::Elapsed>() {
                ApiError::Client {
                    status: StatusCode::REQUEST_TIMEOUT,
                    code: "request_timeout",
                    message: "The request took too long to process".into(),
                    log_context: None,
                }
                .into_response()
            } else {
                ApiError::server(SERVER_ERROR, err.to_string()).into_response()
            }
        }))
        // Generate a request id if missing, then propagate it to the response.
        .layer(SetRequestIdLayer::new(
            request_id_header.clone(),
            MakeRequestUuid,
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header))
        // Limit request body size (protects against accidental/hostile large payloads).
        .layer(RequestBodyLimitLayer::new(1024 * 1024))
        // Bound request time (protects against hanging upstreams / slow clients).
        .layer(TimeoutLayer::new(Duration::from_secs(30)));

    router.layer(layers)
}
