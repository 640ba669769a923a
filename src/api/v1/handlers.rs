/*
 * Responsibility
 * - Business handlers that consume the authorized claims
 */
use axum::Json;
use serde::Serialize;

use crate::api::v1::extractors::Claims;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub subject: String,
    pub scopes: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Return the caller's authorized identity, proving the pipeline attached
/// the final claims.
pub async fn get_profile(Claims(claims): Claims) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        subject: claims.base.subject,
        scopes: claims.base.scopes,
        extra: claims.extra.0,
    })
}
