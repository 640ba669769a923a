/*
 * Responsibility
 * - Per-request LogEntry lifecycle: opened before any other stage, flushed
 *   exactly once on the way out with final status and duration
 * - Internal error context (codes, redacted detail) lands here, never in
 *   response bodies
 */
use std::time::Instant;

use chrono::{DateTime, Utc};

/// One structured log record per request.
///
/// `write` consumes the entry, so a request cannot flush it twice.
#[derive(Debug)]
pub struct LogEntry {
    api_name: String,
    method: String,
    path: String,
    request_id: Option<String>,
    started: Instant,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    status: Option<u16>,
    error_code: Option<&'static str>,
    error_detail: Option<String>,
}

impl LogEntry {
    pub fn start(
        api_name: impl Into<String>,
        method: impl Into<String>,
        path: impl Into<String>,
        request_id: Option<String>,
    ) -> Self {
        Self {
            api_name: api_name.into(),
            method: method.into(),
            path: path.into(),
            request_id,
            started: Instant::now(),
            start_time: Utc::now(),
            end_time: None,
            status: None,
            error_code: None,
            error_detail: None,
        }
    }

    pub fn set_response_status(&mut self, status: u16) {
        self.status = Some(status);
    }

    pub fn set_error(&mut self, code: &'static str, detail: Option<String>) {
        self.error_code = Some(code);
        self.error_detail = detail;
    }

    pub fn end(&mut self) {
        self.end_time = Some(Utc::now());
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    /// Flush the entry as a single structured event.
    pub fn write(mut self) {
        if self.end_time.is_none() {
            self.end();
        }
        let duration_ms = self.started.elapsed().as_millis() as u64;

        tracing::info!(
            target: "request",
            api = %self.api_name,
            method = %self.method,
            path = %self.path,
            request_id = self.request_id.as_deref().unwrap_or("-"),
            status = self.status.unwrap_or(0),
            error_code = self.error_code.unwrap_or(""),
            error_detail = self.error_detail.as_deref().unwrap_or(""),
            start_time = %self.start_time.to_rfc3339(),
            duration_ms,
            "request completed"
        );
    }
}
