//! Orchestrates token validation, claims enrichment and the claims cache to
//! produce the final claims object for one request.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::error::ApiError;
use crate::services::auth::TokenValidator;
use crate::services::cache::ClaimsCache;
use crate::services::claims::{
    CachedClaimsEntry, ExtraClaimsProvider, FinalClaims, token_hash,
};

pub struct Authorizer {
    validator: TokenValidator,
    provider: Arc<dyn ExtraClaimsProvider>,
    cache: ClaimsCache,
    required_scopes: Vec<String>,
    /// Upper bound for a claims entry's lifetime; the token's own remaining
    /// lifetime caps it further.
    max_claims_ttl: Duration,
}

impl Authorizer {
    pub fn new(
        validator: TokenValidator,
        provider: Arc<dyn ExtraClaimsProvider>,
        cache: ClaimsCache,
        required_scopes: Vec<String>,
        max_claims_ttl: Duration,
    ) -> Self {
        Self {
            validator,
            provider,
            cache,
            required_scopes,
            max_claims_ttl,
        }
    }

    /// Produce the final claims for a bearer token, or the error that shapes
    /// the response: 401 for credential problems, 500 for provider/key
    /// infrastructure problems.
    ///
    /// Two concurrent first requests with the same token may both reach the
    /// provider; both then write equivalent cache entries. Accepted: the race
    /// costs a lookup, not correctness.
    pub async fn authorize(&self, raw_token: Option<&str>) -> Result<FinalClaims, ApiError> {
        let token = raw_token
            .ok_or_else(|| ApiError::unauthorized("no bearer token was supplied"))?;

        let base = self
            .validator
            .validate(token, &self.required_scopes)
            .await?;

        let hash = token_hash(token);
        let now = Utc::now().timestamp();

        // An unexpired cached entry short-circuits the provider call.
        if let Some(entry) = self.cache.get_claims_entry(&hash).await {
            if entry.expiry > now {
                return Ok(FinalClaims {
                    base,
                    extra: entry.extra,
                });
            }
        }

        let extra = self.provider.get_extra_claims(&base).await?;

        // TTL = token's remaining lifetime, capped by configuration. A token
        // on the edge of expiry is simply not cached.
        let remaining = base.expiry - now;
        if remaining > 0 {
            let ttl = Duration::from_secs((remaining as u64).min(self.max_claims_ttl.as_secs()));
            let entry = CachedClaimsEntry::from_claims(&base, extra.clone());
            self.cache.set_claims_entry(&hash, &entry, ttl).await;
        }

        Ok(FinalClaims { base, extra })
    }
}
