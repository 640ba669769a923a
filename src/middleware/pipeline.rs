//! The ordered middleware pipeline, as data.
//!
//! The stage order is fixed at composition time and is the contract that
//! decides what headers and bodies reach the caller on success and failure:
//!
//! 1. LogStart            - opens the LogEntry first, flushes it last
//! 2. ExceptionTranslation - converts panics into the shaped 500 body
//! 3. Cors                - decided before authorization so 401/500 carry
//!                          cross-origin headers
//! 4. Authorization       - rejects with 401 before any business logic
//! 5. ResponseShaping     - fixed headers, closest to the outgoing response
//!
//! Logging end is the unwind of LogStart: there is no path that skips it,
//! because every inner stage resolves to a response.

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
use tower_http::catch_panic::CatchPanicLayer;

use crate::error::{ApiError, SERVER_ERROR};
use crate::middleware::{auth, cors, headers, logger};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LogStart,
    ExceptionTranslation,
    Cors,
    Authorization,
    ResponseShaping,
}

/// Run order, outermost first.
pub const STAGES: [Stage; 5] = [
    Stage::LogStart,
    Stage::ExceptionTranslation,
    Stage::Cors,
    Stage::Authorization,
    Stage::ResponseShaping,
];

/// Compose the pipeline around the given routes, once per process.
///
/// Layers applied later wrap earlier ones in axum, so the stage list is
/// folded in reverse to make its first entry the outermost layer.
pub fn compose(routes: Router, state: &AppState) -> Router {
    STAGES
        .iter()
        .rev()
        .fold(routes, |router, stage| apply_stage(router, *stage, state))
}

fn apply_stage(router: Router, stage: Stage, state: &AppState) -> Router {
    match stage {
        Stage::LogStart => {
            router.layer(from_fn_with_state(state.clone(), logger::request_logging))
        }
        Stage::ExceptionTranslation => router.layer(CatchPanicLayer::custom(translate_panic)),
        Stage::Cors => router.layer(cors::layer(&state.config)),
        Stage::Authorization => router.layer(from_fn_with_state(state.clone(), auth::authorize)),
        Stage::ResponseShaping => headers::apply(router),
    }
}

/// The single place an unshaped failure is caught and converted.
fn translate_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected panic".to_string()
    };

    ApiError::server(SERVER_ERROR, detail).into_response()
}
