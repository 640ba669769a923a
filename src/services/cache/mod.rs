/*
 * Responsibility
 * - Process-wide claims cache: signing keys + per-token enriched claims
 * - Strategy selected at composition time: Valkey (shared) when a URL is
 *   configured, Noop (always miss) otherwise; Memory is a single-process
 *   backend chosen explicitly, never from configuration
 * - Backend failures degrade to a miss: authorization never depends on the
 *   cache being reachable, only on its performance
 */
use std::time::Duration;

use thiserror::Error;

use crate::config::CacheConfig;
use crate::services::auth::SigningKeySet;
use crate::services::claims::CachedClaimsEntry;

pub mod memory;
pub mod valkey;

pub use memory::MemoryCache;
pub use valkey::ValkeyCache;

/// Result type for raw cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-layer errors (transport/command/serialization).
///
/// Kept independent from `ApiError`: the caller decides the failure policy,
/// and for this cache the policy is always "treat as a miss".
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache connection error: {0}")]
    BackendConnection(String),
    #[error("cache command error: {0}")]
    BackendCommand(String),
    #[error("cache value error: {0}")]
    InvalidValue(String),
}

const SIGNING_KEYS_KEY: &str = "jwks:current";
const CLAIMS_KEY_PREFIX: &str = "claims";

fn claims_key(token_hash: &str) -> String {
    format!("{}:{}", CLAIMS_KEY_PREFIX, token_hash)
}

/// The claims cache, as a tagged strategy rather than a trait object so the
/// selected backend is visible in logs and composition code.
#[derive(Clone)]
pub enum ClaimsCache {
    Valkey(ValkeyCache),
    Memory(MemoryCache),
    Noop,
}

impl ClaimsCache {
    /// Select and connect the backend. No configured URL means no cache at
    /// all (always miss), and a configured but unreachable backend degrades
    /// to the same with a warning rather than failing startup.
    pub async fn from_config(config: &CacheConfig) -> Self {
        match &config.url {
            Some(url) => match ValkeyCache::new(url).await {
                Ok(cache) => Self::Valkey(cache),
                Err(e) => {
                    tracing::warn!(error = %e, "claims cache unreachable, degrading to no-op");
                    Self::Noop
                }
            },
            None => Self::Noop,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Valkey(_) => "valkey",
            Self::Memory(_) => "memory",
            Self::Noop => "noop",
        }
    }

    /// Replace the cached signing key set. Write failures are discarded.
    pub async fn set_signing_keys(&self, keys: &SigningKeySet, ttl: Duration) {
        if let Err(e) = self.try_set(SIGNING_KEYS_KEY.to_string(), keys, ttl).await {
            tracing::warn!(error = %e, backend = self.backend_name(), "signing key cache write failed");
        }
    }

    /// Current signing keys, or `None` on miss, expiry or backend failure.
    pub async fn get_signing_keys(&self) -> Option<SigningKeySet> {
        self.try_get(SIGNING_KEYS_KEY).await
    }

    /// Store an enriched claims entry under the token hash. The caller is
    /// responsible for capping `ttl` at the token's remaining lifetime.
    pub async fn set_claims_entry(&self, token_hash: &str, entry: &CachedClaimsEntry, ttl: Duration) {
        if let Err(e) = self.try_set(claims_key(token_hash), entry, ttl).await {
            tracing::warn!(error = %e, backend = self.backend_name(), "claims cache write failed");
        }
    }

    pub async fn get_claims_entry(&self, token_hash: &str) -> Option<CachedClaimsEntry> {
        self.try_get(&claims_key(token_hash)).await
    }

    async fn try_set<T: serde::Serialize>(
        &self,
        key: String,
        value: &T,
        ttl: Duration,
    ) -> CacheResult<()> {
        let serialized =
            serde_json::to_string(value).map_err(|e| CacheError::InvalidValue(e.to_string()))?;

        match self {
            Self::Valkey(cache) => cache.set_string_with_ttl(&key, &serialized, ttl).await,
            Self::Memory(cache) => {
                cache.set_string_with_ttl(&key, &serialized, ttl);
                Ok(())
            }
            Self::Noop => Ok(()),
        }
    }

    async fn try_get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self {
            Self::Valkey(cache) => match cache.get_string(key).await {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(error = %e, backend = self.backend_name(), "claims cache read failed");
                    None
                }
            },
            Self::Memory(cache) => cache.get_string(key),
            Self::Noop => None,
        }?;

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                // A corrupt entry is a miss, not a failure.
                tracing::warn!(error = %e, key, "discarding undecodable cache entry");
                None
            }
        }
    }
}
