//! Gateway configuration
//!
//! Built once at startup and handed to the router; nothing reads the
//! environment after that.

use auth::{HmacAlgorithm, TokenConfig, MAX_TOKEN_TTL_SECS};
use checkout_service::CheckoutConfig;
use error::AppError;

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub token: TokenConfig,
    pub checkout: CheckoutConfig,
}

impl GatewayConfig {
    pub fn new(token: TokenConfig) -> Self {
        Self {
            token,
            checkout: CheckoutConfig::default(),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// `JWT_SECRET` is required; everything else has a default.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Config("JWT_SECRET must be set".to_string()))?;
        let mut token = TokenConfig::new(secret);

        if let Some(algorithm) = lookup("JWT_ALGORITHM") {
            token = token.with_algorithm(algorithm.parse::<HmacAlgorithm>()?);
        }

        if let Some(ttl) = lookup("JWT_ACCESS_TTL_SECS") {
            token = token.with_access_ttl(parse_ttl("JWT_ACCESS_TTL_SECS", &ttl)?);
        }

        if let Some(ttl) = lookup("JWT_REFRESH_TTL_SECS") {
            token = token.with_refresh_ttl(parse_ttl("JWT_REFRESH_TTL_SECS", &ttl)?);
        }

        if let Some(header) = lookup("JWT_AUTH_HEADER") {
            let prefix = token.auth_header_prefix.clone();
            token = token.with_auth_header(header, prefix);
        }

        if let Some(prefix) = lookup("JWT_AUTH_HEADER_PREFIX") {
            let header = token.auth_header.clone();
            token = token.with_auth_header(header, prefix);
        }

        if let Some(cookie) = lookup("JWT_REFRESH_COOKIE") {
            token = token.with_refresh_cookie(cookie);
        }

        Ok(Self::new(token))
    }
}

fn parse_ttl(key: &str, value: &str) -> Result<i64, AppError> {
    match value.parse::<i64>() {
        Ok(secs) if (1..=MAX_TOKEN_TTL_SECS).contains(&secs) => Ok(secs),
        _ => Err(AppError::Config(format!(
            "{} must be between 1 and {} seconds, got {:?}",
            key, MAX_TOKEN_TTL_SECS, value
        ))),
    }
}
