//! Pluggable enrichment of a validated subject with extra claims.
//!
//! A provider may call out to a user store or another API, so it is async and
//! fallible. Provider failure is an internal problem (500), never reported to
//! the caller as an authorization failure.

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;

use super::{BaseClaims, ExtraClaims};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("claims lookup failed: {0}")]
    Lookup(String),
}

/// Produces extra claims for a validated subject.
///
/// Implementations must be cheap to share (`Arc<dyn ExtraClaimsProvider>`).
#[async_trait]
pub trait ExtraClaimsProvider: Send + Sync + 'static {
    async fn get_extra_claims(&self, base: &BaseClaims) -> Result<ExtraClaims, ProviderError>;
}

/// Sample enrichment standing in for a user-store lookup: derives a role and
/// tier from the token's own attributes, deterministically.
#[derive(Debug, Clone, Default)]
pub struct SampleClaimsProvider;

#[async_trait]
impl ExtraClaimsProvider for SampleClaimsProvider {
    async fn get_extra_claims(&self, base: &BaseClaims) -> Result<ExtraClaims, ProviderError> {
        let tier = if base.has_scope("premium") {
            "gold"
        } else {
            "standard"
        };

        Ok([
            ("user_role".to_string(), json!("end-user")),
            ("tier".to_string(), json!(tier)),
        ]
        .into_iter()
        .collect())
    }
}

/// No enrichment: returns an empty claims object. Used for offline runs and
/// as a baseline in tests.
#[derive(Debug, Clone, Default)]
pub struct NoopClaimsProvider;

#[async_trait]
impl ExtraClaimsProvider for NoopClaimsProvider {
    async fn get_extra_claims(&self, _base: &BaseClaims) -> Result<ExtraClaims, ProviderError> {
        Ok(ExtraClaims::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sample_provider_maps_premium_scope_to_gold() {
        let base = BaseClaims::new("sub", vec!["read".into(), "premium".into()], 0);
        let extra = SampleClaimsProvider.get_extra_claims(&base).await.unwrap();
        assert_eq!(extra.get("tier"), Some(&json!("gold")));
        assert_eq!(extra.get("user_role"), Some(&json!("end-user")));
    }

    #[tokio::test]
    async fn noop_provider_returns_empty_claims() {
        let base = BaseClaims::new("sub", vec![], 0);
        let extra = NoopClaimsProvider.get_extra_claims(&base).await.unwrap();
        assert!(extra.0.is_empty());
    }
}
