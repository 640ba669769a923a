//! Request logging: the outermost pipeline stage.
//!
//! Opens the LogEntry before any other stage and flushes it exactly once on
//! the way out. Inner stages convert all failures into responses, so the
//! normal tail handles those; a drop guard covers the remaining path where
//! the request future itself is dropped (transport timeout, disconnect)
//! before a response exists.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::error::ErrorLogFields;
use crate::logging::LogEntry;
use crate::state::AppState;

const REQUEST_CANCELLED: &str = "request_cancelled";

/// Flushes the entry with a cancellation marker if the request future is
/// dropped before the normal tail disarms it.
struct FlushOnDrop(Option<LogEntry>);

impl FlushOnDrop {
    fn disarm(&mut self) -> Option<LogEntry> {
        self.0.take()
    }
}

impl Drop for FlushOnDrop {
    fn drop(&mut self) {
        if let Some(mut entry) = self.0.take() {
            entry.set_error(
                REQUEST_CANCELLED,
                Some("request dropped before a response was produced".into()),
            );
            entry.write();
        }
    }
}

pub async fn request_logging(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let entry = LogEntry::start(
        state.config.logging.api_name.clone(),
        req.method().to_string(),
        req.uri().path().to_string(),
        request_id,
    );
    let mut guard = FlushOnDrop(Some(entry));

    let response = next.run(req).await;

    if let Some(mut entry) = guard.disarm() {
        entry.set_response_status(response.status().as_u16());
        if let Some(fields) = response.extensions().get::<ErrorLogFields>() {
            entry.set_error(fields.code, fields.detail.clone());
        }
        entry.end();
        entry.write();
    }

    response
}
