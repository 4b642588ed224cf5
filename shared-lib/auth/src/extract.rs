//! Request credential extraction and user resolution.

use error::AuthError;
use http::header::COOKIE;
use http::HeaderMap;
use std::sync::Arc;

use crate::claims::TokenKind;
use crate::jwt::TokenCodec;
use crate::user::{User, UserStore};

/// Pull `<token>` out of a `<prefix> <token>` header value.
///
/// Anything other than exactly two whitespace-separated parts with a matching
/// prefix yields `None`.
pub fn extract_bearer(headers: &HeaderMap, header_name: &str, prefix: &str) -> Option<String> {
    let value = headers.get(header_name)?.to_str().ok()?;
    let mut parts = value.split_whitespace();

    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case(prefix) => {
            Some(token.to_string())
        }
        _ => None,
    }
}

/// Find cookie `name` across all `Cookie` headers.
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// Resolves request credentials to users.
///
/// Outcomes stay distinct: `Ok(None)` means no credential was sent, a decode
/// error means the credential is bad, and `UserNotFound` means it was valid but
/// the principal is gone.
#[derive(Clone)]
pub struct AuthExtractor {
    codec: Arc<TokenCodec>,
    users: Arc<dyn UserStore>,
}

impl AuthExtractor {
    pub fn new(codec: Arc<TokenCodec>, users: Arc<dyn UserStore>) -> Self {
        Self { codec, users }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Bearer token from the configured auth header.
    pub fn extract_bearer(&self, headers: &HeaderMap) -> Option<String> {
        let config = self.codec.config();
        extract_bearer(headers, &config.auth_header, &config.auth_header_prefix)
    }

    /// Refresh token from the configured cookie.
    pub fn extract_refresh_cookie(&self, headers: &HeaderMap) -> Option<String> {
        extract_cookie(headers, &self.codec.config().refresh_cookie)
    }

    /// Decode `token` and look up the active user named by its email claim.
    pub async fn resolve_user(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.codec.decode(token)?;
        self.find_user(&claims.email).await
    }

    /// Authenticate a request by its bearer access token.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Option<User>, AuthError> {
        let Some(token) = self.extract_bearer(headers) else {
            tracing::debug!("No bearer credential on request");
            return Ok(None);
        };
        let claims = self.codec.decode_expecting(&token, TokenKind::Access)?;
        self.find_user(&claims.email).await.map(Some)
    }

    /// Authenticate a request by its refresh cookie.
    pub async fn authenticate_refresh(&self, headers: &HeaderMap) -> Result<Option<User>, AuthError> {
        let Some(token) = self.extract_refresh_cookie(headers) else {
            return Ok(None);
        };
        let claims = self.codec.decode_expecting(&token, TokenKind::Refresh)?;
        self.find_user(&claims.email).await.map(Some)
    }

    async fn find_user(&self, email: &str) -> Result<User, AuthError> {
        self.users
            .find_active_by_email(email)
            .await
            .map_err(|e| {
                tracing::error!("User lookup failed: {}", e);
                AuthError::UserLookup(e.to_string())
            })?
            .ok_or_else(|| {
                tracing::warn!("Token for {} has no active user", email);
                AuthError::UserNotFound
            })
    }
}
