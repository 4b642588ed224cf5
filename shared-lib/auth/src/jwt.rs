//! JWT encoding and decoding utilities.

use chrono::{Duration, Utc};
use error::{AppError, AuthError};
use hmac::{Hmac, Mac};
use jwt::{SignWithKey, VerifyWithKey};
use serde::Serialize;
use serde_json::Value;
use sha2::{Sha256, Sha384, Sha512};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::claims::{build_base_payload, build_user_payload, TokenClaims, TokenKind};
use crate::user::User;

type HmacSha256 = Hmac<Sha256>;
type HmacSha384 = Hmac<Sha384>;
type HmacSha512 = Hmac<Sha512>;

/// Raw, verified claim map.
pub type Payload = BTreeMap<String, Value>;

/// Default access token lifetime in seconds.
pub const ACCESS_TOKEN_TTL_SECS: i64 = 100;
/// Default refresh token lifetime in seconds (100 hours).
pub const REFRESH_TOKEN_TTL_SECS: i64 = 360_000;
/// Longest lifetime any token may be issued with (10 years).
pub const MAX_TOKEN_TTL_SECS: i64 = 315_360_000;

/// HMAC variant used to sign tokens. Exactly one is accepted per process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HmacAlgorithm {
    #[default]
    HS256,
    HS384,
    HS512,
}

impl fmt::Display for HmacAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
        };
        f.write_str(name)
    }
}

impl FromStr for HmacAlgorithm {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HS256" => Ok(Self::HS256),
            "HS384" => Ok(Self::HS384),
            "HS512" => Ok(Self::HS512),
            other => Err(AppError::Config(format!("unsupported JWT algorithm: {}", other))),
        }
    }
}

/// JWT configuration.
///
/// Built once at startup and shared read-only.
#[derive(Clone)]
pub struct TokenConfig {
    /// Secret key for signing tokens
    pub secret: String,
    pub algorithm: HmacAlgorithm,
    /// Access token validity duration in seconds
    pub access_ttl_secs: i64,
    /// Refresh token validity duration in seconds
    pub refresh_ttl_secs: i64,
    /// Header carrying the bearer token
    pub auth_header: String,
    /// Scheme prefix expected in the auth header, compared case-insensitively
    pub auth_header_prefix: String,
    /// Cookie carrying the refresh token
    pub refresh_cookie: String,
}

impl TokenConfig {
    /// Create a new JWT configuration with default lifetimes and transport names.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            algorithm: HmacAlgorithm::default(),
            access_ttl_secs: ACCESS_TOKEN_TTL_SECS,
            refresh_ttl_secs: REFRESH_TOKEN_TTL_SECS,
            auth_header: "Authorization".to_string(),
            auth_header_prefix: "JWT".to_string(),
            refresh_cookie: "refreshToken".to_string(),
        }
    }

    pub fn with_algorithm(mut self, algorithm: HmacAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_access_ttl(mut self, secs: i64) -> Self {
        self.access_ttl_secs = secs;
        self
    }

    pub fn with_refresh_ttl(mut self, secs: i64) -> Self {
        self.refresh_ttl_secs = secs;
        self
    }

    pub fn with_auth_header(mut self, header: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.auth_header = header.into();
        self.auth_header_prefix = prefix.into();
        self
    }

    pub fn with_refresh_cookie(mut self, name: impl Into<String>) -> Self {
        self.refresh_cookie = name.into();
        self
    }

    pub fn access_ttl(&self) -> Result<Duration, AuthError> {
        ttl_duration(self.access_ttl_secs)
    }

    pub fn refresh_ttl(&self) -> Result<Duration, AuthError> {
        ttl_duration(self.refresh_ttl_secs)
    }
}

/// Lifetimes outside `1..=MAX_TOKEN_TTL_SECS` are refused.
fn ttl_duration(secs: i64) -> Result<Duration, AuthError> {
    if !(1..=MAX_TOKEN_TTL_SECS).contains(&secs) {
        return Err(AuthError::TokenEncoding(format!(
            "token lifetime must be between 1 and {} seconds, got {}",
            MAX_TOKEN_TTL_SECS, secs
        )));
    }
    Duration::try_seconds(secs)
        .ok_or_else(|| AuthError::TokenEncoding(format!("token lifetime of {}s is out of range", secs)))
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("auth_header", &self.auth_header)
            .field("auth_header_prefix", &self.auth_header_prefix)
            .field("refresh_cookie", &self.refresh_cookie)
            .finish()
    }
}

/// Signs and verifies tokens with a fixed [`TokenConfig`].
#[derive(Debug, Clone)]
pub struct TokenCodec {
    config: TokenConfig,
}

impl TokenCodec {
    pub fn new(config: TokenConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Encode claims into a JWT token.
    pub fn encode(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        validate_claims(claims)?;
        self.sign(claims)
    }

    /// Sign an arbitrary payload after stamping fresh `iat`/`exp` onto it.
    pub fn create_token(&self, mut payload: Payload, validity: Duration) -> Result<String, AuthError> {
        if validity.num_seconds() <= 0 {
            return Err(AuthError::TokenEncoding(
                "token validity must be positive".to_string(),
            ));
        }
        let base = build_base_payload(validity)?;
        payload.insert("exp".to_string(), Value::from(base.exp));
        payload.insert("iat".to_string(), Value::from(base.iat));
        self.sign(&payload)
    }

    pub fn create_access_token(
        &self,
        user: &User,
        permissions: Option<&[String]>,
    ) -> Result<String, AuthError> {
        let claims = build_user_payload(user, TokenKind::Access, self.config.access_ttl()?, permissions)?;
        self.encode(&claims)
    }

    pub fn create_refresh_token(&self, user: &User) -> Result<String, AuthError> {
        let claims = build_user_payload(user, TokenKind::Refresh, self.config.refresh_ttl()?, None)?;
        self.encode(&claims)
    }

    /// Decode and validate a JWT token.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let payload = self.decode_payload(token)?;
        serde_json::from_value(Value::Object(payload.into_iter().collect())).map_err(|e| {
            tracing::warn!("Verified token has unexpected claims: {}", e);
            AuthError::MalformedToken(e.to_string())
        })
    }

    /// Decode a token and require it to be of `kind`.
    pub fn decode_expecting(&self, token: &str, kind: TokenKind) -> Result<TokenClaims, AuthError> {
        let claims = self.decode(token)?;
        if claims.kind != kind {
            tracing::warn!("Rejected {} token where {} was required", claims.kind, kind);
            return Err(AuthError::WrongTokenKind {
                expected: kind.to_string(),
                found: claims.kind.to_string(),
            });
        }
        Ok(claims)
    }

    /// Verify signature and expiry, returning the raw claim map.
    pub fn decode_payload(&self, token: &str) -> Result<Payload, AuthError> {
        let payload = self.verify(token)?;

        let exp = payload
            .get("exp")
            .and_then(Value::as_i64)
            .ok_or_else(|| AuthError::MalformedToken("missing or non-integer exp claim".to_string()))?;

        if Utc::now().timestamp() > exp {
            tracing::debug!("Token expired at {}", exp);
            return Err(AuthError::TokenExpired);
        }

        Ok(payload)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, AuthError> {
        let secret = self.config.secret.as_bytes();
        let signed = match self.config.algorithm {
            HmacAlgorithm::HS256 => claims.sign_with_key(&HmacSha256::new_from_slice(secret).map_err(key_error)?),
            HmacAlgorithm::HS384 => claims.sign_with_key(&HmacSha384::new_from_slice(secret).map_err(key_error)?),
            HmacAlgorithm::HS512 => claims.sign_with_key(&HmacSha512::new_from_slice(secret).map_err(key_error)?),
        };

        signed.map_err(|e| {
            tracing::error!("Failed to encode JWT: {}", e);
            AuthError::TokenEncoding(e.to_string())
        })
    }

    // The payload is parsed as an untyped map only; nothing is read from it
    // until the signature has been checked.
    fn verify(&self, token: &str) -> Result<Payload, AuthError> {
        let secret = self.config.secret.as_bytes();
        let verified: Result<Payload, jwt::Error> = match self.config.algorithm {
            HmacAlgorithm::HS256 => token.verify_with_key(&HmacSha256::new_from_slice(secret).map_err(key_error)?),
            HmacAlgorithm::HS384 => token.verify_with_key(&HmacSha384::new_from_slice(secret).map_err(key_error)?),
            HmacAlgorithm::HS512 => token.verify_with_key(&HmacSha512::new_from_slice(secret).map_err(key_error)?),
        };

        verified.map_err(|e| {
            tracing::warn!("Failed to decode JWT: {}", e);
            classify_jwt_error(e)
        })
    }
}

fn key_error(e: hmac::digest::InvalidLength) -> AuthError {
    tracing::error!("Failed to create HMAC key: {}", e);
    AuthError::TokenEncoding(e.to_string())
}

fn classify_jwt_error(err: jwt::Error) -> AuthError {
    match err {
        jwt::Error::InvalidSignature
        | jwt::Error::RustCryptoMac(_)
        | jwt::Error::AlgorithmMismatch(_, _) => AuthError::InvalidSignature,
        other => AuthError::MalformedToken(other.to_string()),
    }
}

fn validate_claims(claims: &TokenClaims) -> Result<(), AuthError> {
    if claims.exp <= claims.iat {
        return Err(AuthError::TokenEncoding(format!(
            "exp ({}) must be after iat ({})",
            claims.exp, claims.iat
        )));
    }
    if claims.email.is_empty() {
        return Err(AuthError::TokenEncoding("email claim is empty".to_string()));
    }
    if claims.user_id.is_empty() {
        return Err(AuthError::TokenEncoding("user_id claim is empty".to_string()));
    }
    if claims.kind == TokenKind::Refresh && claims.permissions.is_some() {
        return Err(AuthError::TokenEncoding(
            "refresh tokens cannot carry permissions".to_string(),
        ));
    }
    Ok(())
}
