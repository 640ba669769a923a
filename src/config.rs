/*
 * Responsibility
 * - Load configuration from the environment (OAuth, cache, CORS, logging)
 * - Validate values at startup (missing/invalid => startup failure)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use jsonwebtoken::Algorithm;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// OAuth resource-side settings: who issued the tokens we accept, where the
/// signing keys live, and what the tokens must contain.
#[derive(Debug, Clone)]
pub struct OauthConfig {
    pub issuer: String,
    pub jwks_endpoint: Url,
    pub allowed_scopes: Vec<String>,
    /// Signature algorithm allow-list. Tokens signed with anything else are
    /// rejected before key lookup.
    pub algorithms: Vec<Algorithm>,
    pub clock_skew_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Upper bound on cached entry lifetime (signing keys and claims alike).
    /// Claims entries are additionally capped by the token's own expiry.
    pub ttl_seconds: u64,
    /// Valkey/Redis URL. Absent selects the no-op cache (always-miss).
    pub url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub trusted_origins: Vec<String>,
    pub use_proxy: bool,
    pub proxy_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Name stamped on every request log event.
    pub api_name: String,
}

pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub oauth: OauthConfig,
    pub cache: CacheConfig,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

fn csv(value: String) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let issuer =
            std::env::var("OAUTH_ISSUER").map_err(|_| ConfigError::Missing("OAUTH_ISSUER"))?;

        let jwks_endpoint = std::env::var("OAUTH_JWKS_ENDPOINT")
            .map_err(|_| ConfigError::Missing("OAUTH_JWKS_ENDPOINT"))?;
        let jwks_endpoint =
            Url::parse(&jwks_endpoint).map_err(|_| ConfigError::Invalid("OAUTH_JWKS_ENDPOINT"))?;

        let allowed_scopes = csv(std::env::var("OAUTH_ALLOWED_SCOPES").unwrap_or_default());

        let algorithms = csv(std::env::var("OAUTH_ALGORITHMS").unwrap_or_else(|_| "EdDSA".into()))
            .iter()
            .map(|name| {
                Algorithm::from_str(name).map_err(|_| ConfigError::Invalid("OAUTH_ALGORITHMS"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if algorithms.is_empty() {
            return Err(ConfigError::Invalid("OAUTH_ALGORITHMS"));
        }

        let clock_skew_seconds = std::env::var("OAUTH_CLOCK_SKEW_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);

        let ttl_seconds = std::env::var("CACHE_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(900);

        let cache_url = std::env::var("CACHE_URL").ok().filter(|s| !s.is_empty());

        let trusted_origins = csv(std::env::var("API_TRUSTED_ORIGINS").unwrap_or_default());

        let use_proxy = std::env::var("API_USE_PROXY")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1"))
            .unwrap_or(false);

        let proxy_url = std::env::var("API_PROXY_URL").ok().filter(|s| !s.is_empty());
        if use_proxy && proxy_url.is_none() {
            return Err(ConfigError::Missing("API_PROXY_URL"));
        }

        let api_name =
            std::env::var("LOG_API_NAME").unwrap_or_else(|_| "resource-api".to_string());

        Ok(Self {
            addr,
            app_env,
            oauth: OauthConfig {
                issuer,
                jwks_endpoint,
                allowed_scopes,
                algorithms,
                clock_skew_seconds,
            },
            cache: CacheConfig {
                ttl_seconds,
                url: cache_url,
            },
            api: ApiConfig {
                trusted_origins,
                use_proxy,
                proxy_url,
            },
            logging: LoggingConfig { api_name },
        })
    }
}
