//! Bearer token authorization: validates the credential, resolves the final
//! claims set and inserts it into request extensions for handlers.
//!
//! Runs after the CORS decision and before any business logic; a rejection
//! here means no handler executes.

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn authorize(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    // The specific failure reason travels to the request log via the error's
    // log fields; the caller only ever sees the generic 401 body.
    let claims = state.authorizer.authorize(token).await?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
