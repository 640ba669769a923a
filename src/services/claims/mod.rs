/*
 * Responsibility
 * - Immutable claims value types: BaseClaims (from the verified token),
 *   ExtraClaims (provider-supplied), FinalClaims (both, request-scoped)
 * - CachedClaimsEntry: the cacheable projection, keyed by a token hash
 */
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub mod provider;

pub use provider::{ExtraClaimsProvider, NoopClaimsProvider, ProviderError, SampleClaimsProvider};

/// Claims read directly from a verified token payload.
///
/// Constructed only by the token validator; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseClaims {
    pub subject: String,
    pub scopes: Vec<String>,
    /// Token expiry, epoch seconds.
    pub expiry: i64,
}

impl BaseClaims {
    pub fn new(subject: impl Into<String>, scopes: Vec<String>, expiry: i64) -> Self {
        Self {
            subject: subject.into(),
            scopes,
            expiry,
        }
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

/// Provider-defined attributes. Opaque to the pipeline: a JSON object that is
/// attached to the request scope and cached as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtraClaims(pub serde_json::Map<String, serde_json::Value>);

impl ExtraClaims {
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }
}

impl FromIterator<(String, serde_json::Value)> for ExtraClaims {
    fn from_iter<T: IntoIterator<Item = (String, serde_json::Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The full claims set for one request. Owned by that request's extensions,
/// never shared across requests.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalClaims {
    pub base: BaseClaims,
    pub extra: ExtraClaims,
}

/// Cacheable claims projection, keyed by [`token_hash`] so the raw credential
/// is never written to the cache backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedClaimsEntry {
    pub subject: String,
    pub scopes: Vec<String>,
    /// Token expiry, epoch seconds. The entry's TTL never exceeds this.
    pub expiry: i64,
    pub extra: ExtraClaims,
}

impl CachedClaimsEntry {
    pub fn from_claims(base: &BaseClaims, extra: ExtraClaims) -> Self {
        Self {
            subject: base.subject.clone(),
            scopes: base.scopes.clone(),
            expiry: base.expiry,
            extra,
        }
    }
}

/// One-way hash of the raw access token, used as the claims cache key.
pub fn token_hash(raw_token: &str) -> String {
    let digest = Sha256::digest(raw_token.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_hash_is_stable_and_hex() {
        let h1 = token_hash("token-a");
        let h2 = token_hash("token-a");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(h1, token_hash("token-b"));
    }

    #[test]
    fn cached_entry_round_trips_through_json() {
        let base = BaseClaims::new("sub-1", vec!["read".into()], 1_900_000_000);
        let extra: ExtraClaims =
            [("tier".to_string(), serde_json::json!("gold"))].into_iter().collect();
        let entry = CachedClaimsEntry::from_claims(&base, extra.clone());

        let bytes = serde_json::to_string(&entry).unwrap();
        let back: CachedClaimsEntry = serde_json::from_str(&bytes).unwrap();
        assert_eq!(back, entry);
        assert_eq!(back.extra, extra);
    }

    #[test]
    fn has_scope_matches_exactly() {
        let base = BaseClaims::new("sub", vec!["read".into(), "write".into()], 0);
        assert!(base.has_scope("read"));
        assert!(!base.has_scope("rea"));
        assert!(!base.has_scope("admin"));
    }
}
