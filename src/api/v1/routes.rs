/*
 * Responsibility
 * - v1 URL structure; every route here sits behind the authorization stage
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::get_profile;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/profile", get(get_profile))
}
