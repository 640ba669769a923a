//! Bearer token verification against the cached signing keys.
//!
//! Key lookup order: cached set first, then one fresh JWKS fetch when the
//! token's `kid` is unknown. Never more than one fetch per request, so a
//! caller presenting bogus `kid` values cannot force a refetch storm.

use std::time::Duration;

use jsonwebtoken::{DecodingKey, Validation, decode, decode_header, errors::ErrorKind};
use serde::Deserialize;
use thiserror::Error;

use crate::config::OauthConfig;
use crate::services::auth::jwks::{JwksClient, JwksError};
use crate::services::cache::ClaimsCache;
use crate::services::claims::BaseClaims;

/// Authorization failures: the caller's credential is missing or bad.
/// Always surfaced as a generic 401; the variant text is log-only context.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no bearer token was supplied")]
    MissingToken,
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("token header carries no kid")]
    MissingKid,
    #[error("token algorithm is not in the allow-list")]
    AlgorithmNotAllowed,
    #[error("no signing key found for kid '{0}'")]
    UnknownKey(String),
    #[error("token verification failed: {0}")]
    Verification(String),
    #[error("token is expired")]
    Expired,
    #[error("required scope '{0}' is missing")]
    MissingScope(String),
}

/// Validation outcome: either the caller is at fault (401) or the signing key
/// infrastructure is (500). The two must not be conflated in responses.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    KeyFetch(#[from] JwksError),
}

/// The JWT payload fields this API consumes.
#[derive(Debug, Deserialize)]
struct TokenPayload {
    sub: String,
    exp: i64,
    /// Space-separated scope string, per RFC 8693.
    #[serde(default)]
    scope: Option<String>,
}

pub struct TokenValidator {
    oauth: OauthConfig,
    jwks: JwksClient,
    cache: ClaimsCache,
    keys_ttl: Duration,
}

impl TokenValidator {
    pub fn new(oauth: OauthConfig, jwks: JwksClient, cache: ClaimsCache, keys_ttl: Duration) -> Self {
        Self {
            oauth,
            jwks,
            cache,
            keys_ttl,
        }
    }

    /// Verify signature, issuer and expiry, then enforce `required_scopes`.
    /// Returns the base claims exactly as carried by the token payload.
    pub async fn validate(
        &self,
        raw_token: &str,
        required_scopes: &[String],
    ) -> Result<BaseClaims, ValidateError> {
        let header = decode_header(raw_token).map_err(|e| AuthError::Malformed(e.to_string()))?;

        if !self.oauth.algorithms.contains(&header.alg) {
            return Err(AuthError::AlgorithmNotAllowed.into());
        }

        let kid = header.kid.ok_or(AuthError::MissingKid)?;

        // Cached keys first; on a kid miss, fetch fresh keys exactly once and
        // fail permanently if the kid is still unknown.
        let cached = self.cache.get_signing_keys().await;
        let jwk = match cached.as_ref().and_then(|set| set.find(&kid)) {
            Some(jwk) => jwk.clone(),
            None => {
                let fresh = self.jwks.fetch().await?;
                self.cache.set_signing_keys(&fresh, self.keys_ttl).await;
                fresh
                    .find(&kid)
                    .cloned()
                    .ok_or_else(|| AuthError::UnknownKey(kid.clone()))?
            }
        };

        let decoding_key =
            DecodingKey::from_jwk(&jwk).map_err(|e| AuthError::Verification(e.to_string()))?;

        let mut validation = Validation::new(header.alg);
        validation.algorithms = self.oauth.algorithms.clone();
        validation.set_issuer(&[&self.oauth.issuer]);
        validation.validate_aud = false;
        validation.leeway = self.oauth.clock_skew_seconds;

        let data = decode::<TokenPayload>(raw_token, &decoding_key, &validation)
            .map_err(auth_error_from_jwt)?;

        let scopes: Vec<String> = data
            .claims
            .scope
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let claims = BaseClaims::new(data.claims.sub, scopes, data.claims.exp);

        for required in required_scopes {
            if !claims.has_scope(required) {
                return Err(AuthError::MissingScope(required.clone()).into());
            }
        }

        Ok(claims)
    }
}

fn auth_error_from_jwt(e: jsonwebtoken::errors::Error) -> AuthError {
    match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::ImmatureSignature => AuthError::Verification("token not yet valid".into()),
        _ => AuthError::Verification(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use jsonwebtoken::Algorithm;

    fn validator(algorithms: Vec<Algorithm>) -> TokenValidator {
        let oauth = OauthConfig {
            issuer: "https://issuer.example".into(),
            jwks_endpoint: url::Url::parse("http://127.0.0.1:1/jwks").unwrap(),
            allowed_scopes: vec![],
            algorithms,
            clock_skew_seconds: 0,
        };
        let api = ApiConfig {
            trusted_origins: vec![],
            use_proxy: false,
            proxy_url: None,
        };
        let jwks = JwksClient::new(&oauth, &api).unwrap();
        TokenValidator::new(oauth, jwks, ClaimsCache::Noop, Duration::from_secs(60))
    }

    fn unsigned_token(header: serde_json::Value) -> String {
        let h = URL_SAFE_NO_PAD.encode(header.to_string());
        let p = URL_SAFE_NO_PAD.encode("{}");
        format!("{h}.{p}.sig")
    }

    #[tokio::test]
    async fn garbage_token_is_malformed() {
        let v = validator(vec![Algorithm::EdDSA]);
        let err = v.validate("not-a-jwt", &[]).await.unwrap_err();
        assert!(matches!(err, ValidateError::Auth(AuthError::Malformed(_))));
    }

    #[tokio::test]
    async fn disallowed_algorithm_is_rejected_before_key_lookup() {
        // The JWKS endpoint is unroutable, so reaching key lookup would fail
        // with KeyFetch instead of the expected AuthError.
        let v = validator(vec![Algorithm::EdDSA]);
        let token = unsigned_token(serde_json::json!({"alg": "RS256", "typ": "JWT", "kid": "k1"}));
        let err = v.validate(&token, &[]).await.unwrap_err();
        assert!(matches!(
            err,
            ValidateError::Auth(AuthError::AlgorithmNotAllowed)
        ));
    }

    #[tokio::test]
    async fn missing_kid_is_rejected_before_key_lookup() {
        let v = validator(vec![Algorithm::EdDSA]);
        let token = unsigned_token(serde_json::json!({"alg": "EdDSA", "typ": "JWT"}));
        let err = v.validate(&token, &[]).await.unwrap_err();
        assert!(matches!(err, ValidateError::Auth(AuthError::MissingKid)));
    }

    #[tokio::test]
    async fn unreachable_jwks_endpoint_is_a_key_fetch_failure() {
        let v = validator(vec![Algorithm::EdDSA]);
        let token = unsigned_token(serde_json::json!({"alg": "EdDSA", "typ": "JWT", "kid": "k1"}));
        let err = v.validate(&token, &[]).await.unwrap_err();
        assert!(matches!(err, ValidateError::KeyFetch(_)));
    }
}
