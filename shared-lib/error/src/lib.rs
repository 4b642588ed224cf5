//! Common error types for the storefront services.
//!
//! This crate provides unified error handling for the auth and checkout crates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Token and identity errors.
///
/// Decode failures (`MalformedToken`, `InvalidSignature`, `TokenExpired`) are kept
/// apart from `UserNotFound` so a caller can tell a bad credential from a
/// principal that no longer exists.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    TokenExpired,

    #[error("No active user matches the token")]
    UserNotFound,

    #[error("Token encoding failed: {0}")]
    TokenEncoding(String),

    #[error("Wrong token type: expected {expected}, found {found}")]
    WrongTokenKind { expected: String, found: String },

    #[error("User lookup failed: {0}")]
    UserLookup(String),
}

/// Checkout flow errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("Checkout step not found: {0}")]
    StepNotFound(String),

    #[error("Cart is empty or has no available products")]
    CartUnavailable,

    #[error("Checkout storage failed: {0}")]
    Storage(String),
}

/// Error response for API clients.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// HTTP status the boundary layer should answer with
    #[serde(skip)]
    pub status: u16,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status,
            details: None,
        }
    }

    /// Add details to the error response.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl From<AuthError> for ErrorResponse {
    fn from(err: AuthError) -> Self {
        let (status, code, message) = match &err {
            AuthError::MalformedToken(_) => (401, "AUTH_MALFORMED_TOKEN", "Token could not be parsed"),
            AuthError::InvalidSignature => (401, "AUTH_INVALID_SIGNATURE", "Token signature is invalid"),
            AuthError::TokenExpired => (401, "AUTH_TOKEN_EXPIRED", "Token has expired"),
            AuthError::UserNotFound => (401, "AUTH_USER_NOT_FOUND", "No active user for this token"),
            AuthError::TokenEncoding(_) => (500, "AUTH_TOKEN_ENCODING_FAILED", "Failed to create token"),
            AuthError::WrongTokenKind { .. } => (401, "AUTH_WRONG_TOKEN_TYPE", "Token type not accepted here"),
            AuthError::UserLookup(_) => (503, "AUTH_USER_LOOKUP_FAILED", "User lookup failed"),
        };
        Self::new(status, code, message).with_details(err.to_string())
    }
}

impl From<CheckoutError> for ErrorResponse {
    fn from(err: CheckoutError) -> Self {
        let (status, code, message) = match &err {
            CheckoutError::StepNotFound(_) => (404, "CHECKOUT_STEP_NOT_FOUND", "Checkout step not found"),
            CheckoutError::CartUnavailable => (409, "CHECKOUT_CART_UNAVAILABLE", "Cart cannot be checked out"),
            CheckoutError::Storage(_) => (500, "CHECKOUT_STORAGE_FAILED", "Checkout could not be saved"),
        };
        Self::new(status, code, message).with_details(err.to_string())
    }
}

impl From<AppError> for ErrorResponse {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Auth(e) => e.into(),
            AppError::Checkout(e) => e.into(),
            AppError::Config(msg) => Self::new(500, "CONFIG_ERROR", "Invalid configuration").with_details(msg),
        }
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;
