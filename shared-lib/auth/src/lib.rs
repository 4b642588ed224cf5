//! Authentication library for the storefront.
//!
//! This crate issues and verifies signed access/refresh tokens and resolves
//! inbound request credentials to users.

mod claims;
mod extract;
mod global_id;
mod jwt;
mod user;

pub use claims::{build_base_payload, build_user_payload, BasePayload, TokenClaims, TokenKind};
pub use extract::{extract_bearer, extract_cookie, AuthExtractor};
pub use global_id::GlobalId;
pub use self::jwt::{
    HmacAlgorithm, Payload, TokenCodec, TokenConfig, ACCESS_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS,
};
pub use user::{InMemoryUserStore, User, UserStore, USER_TYPE_NAME};
