//! JWKS download client and the cached signing key set.
//!
//! The identity provider publishes public keys at a well-known endpoint. We
//! fetch the whole set, replace the cached copy atomically, and never mutate
//! a set in place.

use chrono::{DateTime, Utc};
use jsonwebtoken::jwk::{Jwk, JwkSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::{ApiConfig, OauthConfig};

#[derive(Debug, Error)]
pub enum JwksError {
    #[error("jwks client setup failed: {0}")]
    Setup(String),
    #[error("jwks download failed: {0}")]
    Transport(String),
    #[error("jwks endpoint returned status {0}")]
    Status(u16),
    #[error("jwks response was malformed: {0}")]
    Malformed(String),
    #[error("jwks endpoint returned an empty key set")]
    Empty,
}

/// A complete signing key set plus its fetch timestamp.
///
/// Invariant: non-empty. [`JwksClient::fetch`] rejects an empty response, so
/// a successfully constructed set always holds at least one key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningKeySet {
    pub keys: JwkSet,
    pub fetched_at: DateTime<Utc>,
}

impl SigningKeySet {
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.find(kid)
    }
}

/// Read-only client for the identity provider's key endpoint.
#[derive(Debug, Clone)]
pub struct JwksClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl JwksClient {
    /// Build the outbound client, honoring the forward-proxy settings used in
    /// locked-down deployments.
    pub fn new(oauth: &OauthConfig, api: &ApiConfig) -> Result<Self, JwksError> {
        let mut builder = reqwest::Client::builder().timeout(std::time::Duration::from_secs(10));

        if api.use_proxy {
            if let Some(proxy_url) = &api.proxy_url {
                let proxy = reqwest::Proxy::all(proxy_url.as_str())
                    .map_err(|e| JwksError::Setup(e.to_string()))?;
                builder = builder.proxy(proxy);
            }
        }

        let http = builder.build().map_err(|e| JwksError::Setup(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: oauth.jwks_endpoint.clone(),
        })
    }

    /// Fetch a fresh key set. Idempotent; the caller decides whether and how
    /// long to cache the result.
    pub async fn fetch(&self) -> Result<SigningKeySet, JwksError> {
        let response = self
            .http
            .get(self.endpoint.clone())
            .send()
            .await
            .map_err(|e| JwksError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(JwksError::Status(status.as_u16()));
        }

        let keys: JwkSet = response
            .json()
            .await
            .map_err(|e| JwksError::Malformed(e.to_string()))?;

        if keys.keys.is_empty() {
            return Err(JwksError::Empty);
        }

        Ok(SigningKeySet {
            keys,
            fetched_at: Utc::now(),
        })
    }
}
