//! JWT claims and payload builders.

use chrono::{Duration, Utc};
use error::AuthError;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::user::User;

/// Token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived, carries authorization scope
    Access,
    /// Long-lived, only used to mint new access tokens
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issue and expiry timestamps shared by every token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasePayload {
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// JWT claims structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub email: String,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// Global id of the user
    pub user_id: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

impl TokenClaims {
    /// Whether the token grants `permission`. Refresh tokens grant nothing.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.kind == TokenKind::Access
            && self
                .permissions
                .as_ref()
                .is_some_and(|perms| perms.iter().any(|p| p == permission))
    }
}

/// Build `iat`/`exp` from a single clock reading.
pub fn build_base_payload(validity: Duration) -> Result<BasePayload, AuthError> {
    let now = Utc::now().timestamp();
    let exp = now.checked_add(validity.num_seconds()).ok_or_else(|| {
        AuthError::TokenEncoding(format!("token validity of {}s overflows exp", validity.num_seconds()))
    })?;
    Ok(BasePayload { exp, iat: now })
}

/// Build the claims for `user`.
///
/// Permissions are attached only to access tokens; passing them for a refresh
/// token is a caller bug and they are dropped.
pub fn build_user_payload(
    user: &User,
    kind: TokenKind,
    validity: Duration,
    permissions: Option<&[String]>,
) -> Result<TokenClaims, AuthError> {
    let base = build_base_payload(validity)?;

    let permissions = match (kind, permissions) {
        (TokenKind::Access, Some(perms)) if !perms.is_empty() => Some(perms.to_vec()),
        (TokenKind::Refresh, Some(perms)) if !perms.is_empty() => {
            tracing::warn!(
                "Dropping {} permissions passed for a refresh token of user {}",
                perms.len(),
                user.id
            );
            None
        }
        _ => None,
    };

    Ok(TokenClaims {
        exp: base.exp,
        iat: base.iat,
        email: user.email.clone(),
        kind,
        user_id: user.global_id(),
        is_staff: user.is_staff,
        is_superuser: user.is_superuser,
        permissions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_payload_window() {
        let payload = build_base_payload(Duration::seconds(100)).unwrap();
        assert_eq!(payload.exp - payload.iat, 100);
    }

    #[test]
    fn test_user_payload_fields() {
        let user = User::new(5, "staff@example.com").with_staff(true);
        let perms = vec!["MANAGE_ORDERS".to_string()];
        let claims = build_user_payload(&user, TokenKind::Access, Duration::seconds(100), Some(perms.as_slice())).unwrap();

        assert_eq!(claims.email, "staff@example.com");
        assert_eq!(claims.user_id, user.global_id());
        assert!(claims.is_staff);
        assert!(!claims.is_superuser);
        assert_eq!(claims.permissions, Some(perms));
        assert!(claims.has_permission("MANAGE_ORDERS"));
    }

    #[test]
    fn test_refresh_payload_is_scopeless() {
        let user = User::new(5, "staff@example.com");
        let perms = vec!["MANAGE_ORDERS".to_string()];
        let claims = build_user_payload(&user, TokenKind::Refresh, Duration::hours(100), Some(perms.as_slice())).unwrap();

        assert_eq!(claims.permissions, None);
        assert!(!claims.has_permission("MANAGE_ORDERS"));
    }

    #[test]
    fn test_empty_permissions_are_omitted() {
        let user = User::new(1, "a@example.com");
        let claims = build_user_payload(&user, TokenKind::Access, Duration::seconds(100), Some(&[][..])).unwrap();

        let json = serde_json::to_value(&claims).unwrap();
        assert!(json.get("permissions").is_none());
        assert_eq!(json["type"], "access");
    }
}
