//! Shared test fixtures: a deterministic Ed25519 issuer, an in-process JWKS
//! endpoint with a hit counter, and instrumented claims providers.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{Json, Router, extract::State, routing::get};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use ed25519_dalek::{Signer, SigningKey};
use jsonwebtoken::Algorithm;
use serde_json::{Value, json};

use resource_api::config::{ApiConfig, AppEnv, CacheConfig, Config, LoggingConfig, OauthConfig};
use resource_api::services::claims::{
    BaseClaims, ExtraClaims, ExtraClaimsProvider, ProviderError,
};

pub const ISSUER: &str = "https://issuer.test.example";
pub const KID: &str = "test-key-1";
pub const TRUSTED_ORIGIN: &str = "https://web.test.example";

fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[7u8; 32])
}

pub fn jwks_json() -> Value {
    let verifying_key = signing_key().verifying_key();
    json!({
        "keys": [{
            "kty": "OKP",
            "crv": "Ed25519",
            "alg": "EdDSA",
            "use": "sig",
            "kid": KID,
            "x": URL_SAFE_NO_PAD.encode(verifying_key.as_bytes()),
        }]
    })
}

/// Mint a signed token the way the identity provider would.
pub fn mint_token(kid: &str, sub: &str, scope: &str, exp: i64) -> String {
    let header = json!({"alg": "EdDSA", "typ": "JWT", "kid": kid});
    let payload = json!({"iss": ISSUER, "sub": sub, "scope": scope, "exp": exp});

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(payload.to_string()),
    );
    let signature = signing_key().sign(signing_input.as_bytes());

    format!(
        "{}.{}",
        signing_input,
        URL_SAFE_NO_PAD.encode(signature.to_bytes())
    )
}

/// A token that passes validation: known kid, required scope, one hour left.
pub fn valid_token(sub: &str) -> String {
    mint_token(KID, sub, "read premium", Utc::now().timestamp() + 3600)
}

pub struct JwksServer {
    pub url: String,
    pub hits: Arc<AtomicUsize>,
}

async fn jwks_handler(State(hits): State<Arc<AtomicUsize>>) -> Json<Value> {
    hits.fetch_add(1, Ordering::SeqCst);
    Json(jwks_json())
}

/// Serve the JWKS document on a local ephemeral port, counting fetches.
pub async fn start_jwks_server() -> JwksServer {
    let hits = Arc::new(AtomicUsize::new(0));

    let app = Router::new()
        .route("/jwks", get(jwks_handler))
        .with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind jwks listener");
    let addr: SocketAddr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve jwks");
    });

    JwksServer {
        url: format!("http://{}/jwks", addr),
        hits,
    }
}

/// Production-mode configuration pointing at the local JWKS server.
pub fn test_config(jwks_url: &str) -> Config {
    Config {
        addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        app_env: AppEnv::Production,
        oauth: OauthConfig {
            issuer: ISSUER.into(),
            jwks_endpoint: url::Url::parse(jwks_url).expect("jwks url"),
            allowed_scopes: vec!["read".into()],
            algorithms: vec![Algorithm::EdDSA],
            clock_skew_seconds: 0,
        },
        cache: CacheConfig {
            ttl_seconds: 900,
            url: None,
        },
        api: ApiConfig {
            trusted_origins: vec![TRUSTED_ORIGIN.into()],
            use_proxy: false,
            proxy_url: None,
        },
        logging: LoggingConfig {
            api_name: "test-api".into(),
        },
    }
}

/// Counts provider invocations and returns a fixed claims object.
#[derive(Clone)]
pub struct CountingProvider {
    pub calls: Arc<AtomicUsize>,
    extra: ExtraClaims,
}

impl CountingProvider {
    pub fn new(extra: ExtraClaims) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            extra,
        }
    }

    pub fn gold_tier() -> Self {
        Self::new([("tier".to_string(), json!("gold"))].into_iter().collect())
    }
}

#[async_trait]
impl ExtraClaimsProvider for CountingProvider {
    async fn get_extra_claims(&self, _base: &BaseClaims) -> Result<ExtraClaims, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.extra.clone())
    }
}

/// Always fails, standing in for an unreachable user store.
pub struct FailingProvider;

#[async_trait]
impl ExtraClaimsProvider for FailingProvider {
    async fn get_extra_claims(&self, _base: &BaseClaims) -> Result<ExtraClaims, ProviderError> {
        Err(ProviderError::Lookup("user store offline".into()))
    }
}
