/*!
 * Claims extractor
 *
 * Responsibility:
 * - Hand the authorized request's FinalClaims to handlers
 * - The authorizer middleware inserts FinalClaims into request extensions;
 *   absence means the route was mounted outside the pipeline
 */
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;
use crate::services::claims::FinalClaims;
use crate::state::AppState;

pub struct Claims(pub FinalClaims);

impl FromRequestParts<AppState> for Claims
where
    AppState: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<FinalClaims>()
            .cloned()
            .map(Claims)
            .ok_or_else(|| ApiError::unauthorized("no claims in request scope"))
    }
}
