/*
 * Responsibility
 * - Shared context bound to the Router (AppState)
 * - Clone-cheap: Arc inside; per-request state (claims, log entry) is never
 *   stored here
 */
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::Authorizer;

#[derive(Clone)]
pub struct AppState {
    pub authorizer: Arc<Authorizer>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(authorizer: Arc<Authorizer>, config: Arc<Config>) -> Self {
        Self { authorizer, config }
    }
}
