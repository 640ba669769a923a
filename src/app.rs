/*
 * Responsibility
 * - Composition root: load Config -> build dependencies -> compose the
 *   pipeline once -> axum::serve()
 * - Startup failure still yields a well-formed 500 responder, never a crash
 */
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use tracing_subscriber::EnvFilter;

use crate::api;
use crate::config::Config;
use crate::error::{ApiError, STARTUP_ERROR};
use crate::middleware::{http, pipeline};
use crate::services::auth::{Authorizer, JwksClient, JwksError, TokenValidator};
use crate::services::cache::ClaimsCache;
use crate::services::claims::{ExtraClaimsProvider, SampleClaimsProvider};
use crate::state::AppState;

const FALLBACK_ADDR: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED),
    3000,
);

pub async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let (app, addr) = match compose_from_env().await {
        Ok(composed) => composed,
        Err(e) => {
            // Composition failed: log the raw error here, serve a minimal
            // handler that returns only the generic 500 body.
            tracing::error!(error = %e, "startup failed, serving fallback responder");
            (fallback_router(e.to_string()), FALLBACK_ADDR)
        }
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn compose_from_env() -> Result<(Router, SocketAddr)> {
    let config = Arc::new(Config::from_env()?);
    let addr = config.addr;

    let cache = ClaimsCache::from_config(&config.cache).await;
    let state = build_state(config, Arc::new(SampleClaimsProvider), cache)?;

    Ok((build_router(&state), addr))
}

/// Wire the authorizer from configuration, a claims provider and a cache
/// backend. Shared by `run` and the integration tests.
pub fn build_state(
    config: Arc<Config>,
    provider: Arc<dyn ExtraClaimsProvider>,
    cache: ClaimsCache,
) -> Result<AppState, JwksError> {
    let jwks = JwksClient::new(&config.oauth, &config.api)?;
    let keys_ttl = Duration::from_secs(config.cache.ttl_seconds);

    let validator = TokenValidator::new(config.oauth.clone(), jwks, cache.clone(), keys_ttl);
    let authorizer = Authorizer::new(
        validator,
        provider,
        cache,
        config.oauth.allowed_scopes.clone(),
        keys_ttl,
    );

    Ok(AppState::new(Arc::new(authorizer), config))
}

/// Compose the full router: business routes inside the ordered pipeline,
/// transport middleware outside it.
pub fn build_router(state: &AppState) -> Router {
    let routes = Router::new()
        .nest("/api/v1", api::v1::routes())
        .with_state(state.clone());

    let piped = pipeline::compose(routes, state);
    http::apply(piped)
}

/// A minimal responder for when composition itself failed: any request gets
/// the generic 500 body while the redacted detail goes to the log.
pub fn fallback_router(startup_error: String) -> Router {
    Router::new().fallback(move || {
        let detail = startup_error.clone();
        async move {
            tracing::error!(error = %detail, "request received after startup failure");
            ApiError::server(STARTUP_ERROR, detail)
        }
    })
}
