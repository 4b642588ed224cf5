//! Service Router
//!
//! Routes requests to the auth and checkout crates via InProcess calls and
//! converts their outcomes into `http` responses.

use std::sync::Arc;

use auth::{AuthExtractor, TokenCodec, User, UserStore};
use checkout_service::{
    AvailabilityCheck, CheckoutController, CheckoutRequest, CheckoutResponse, InMemoryRepository,
};
use error::{AuthError, ErrorResponse};
use http::header::{CONTENT_TYPE, LOCATION, SET_COOKIE};
use http::{HeaderMap, HeaderValue, Response, StatusCode};
use serde::Serialize;

use crate::config::GatewayConfig;

/// Freshly issued credentials
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub token: String,
    #[serde(skip)]
    pub refresh_token: String,
}

/// Service router that manages InProcess service calls
pub struct ServiceRouter {
    auth: AuthExtractor,
    checkout: CheckoutController<InMemoryRepository>,
}

impl ServiceRouter {
    pub fn new(
        config: &GatewayConfig,
        users: Arc<dyn UserStore>,
        availability: Arc<dyn AvailabilityCheck>,
    ) -> Self {
        let codec = Arc::new(TokenCodec::new(config.token.clone()));
        Self {
            auth: AuthExtractor::new(codec, users),
            checkout: CheckoutController::new(
                config.checkout.registry(),
                InMemoryRepository::new(),
                availability,
            ),
        }
    }

    pub fn auth(&self) -> &AuthExtractor {
        &self.auth
    }

    pub fn checkout_controller(&self) -> &CheckoutController<InMemoryRepository> {
        &self.checkout
    }

    /// Resolve the caller, if any, from the bearer header
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Option<User>, AuthError> {
        self.auth.authenticate(headers).await
    }

    /// Issue an access/refresh pair for `user`
    pub fn issue_tokens(&self, user: &User) -> Result<TokenPair, AuthError> {
        let codec = self.auth.codec();
        let permissions = (!user.permissions.is_empty()).then_some(user.permissions.as_slice());
        Ok(TokenPair {
            token: codec.create_access_token(user, permissions)?,
            refresh_token: codec.create_refresh_token(user)?,
        })
    }

    /// Token response: access token in the body, refresh token in a cookie
    pub fn token_response(&self, user: &User) -> Response<String> {
        let pair = match self.issue_tokens(user) {
            Ok(pair) => pair,
            Err(e) => return error_response(e.into()),
        };

        let config = self.auth.codec().config();
        let cookie = format!(
            "{}={}; Max-Age={}; Path=/; HttpOnly; Secure; SameSite=Lax",
            config.refresh_cookie, pair.refresh_token, config.refresh_ttl_secs
        );

        let mut response = json_response(StatusCode::OK, &pair);
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().insert(SET_COOKIE, value);
                response
            }
            Err(e) => internal_error(e),
        }
    }

    /// Checkout entry point; `step` is the optional path segment
    pub async fn checkout(&self, step: Option<&str>, request: CheckoutRequest) -> Response<String> {
        match self.checkout.handle_step(request, step).await {
            Ok(CheckoutResponse::Redirect(location)) => redirect(&location.path()),
            Ok(CheckoutResponse::Page(page)) => json_response(StatusCode::OK, &page),
            Err(e) => {
                tracing::debug!("Checkout request failed: {}", e);
                error_response(e.into())
            }
        }
    }
}

/// Render an [`ErrorResponse`] with its status
pub fn error_response(error: ErrorResponse) -> Response<String> {
    let status = StatusCode::from_u16(error.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    json_response(status, &error)
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<String> {
    match serde_json::to_string(body) {
        Ok(body) => {
            let mut response = Response::new(body);
            *response.status_mut() = status;
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        Err(e) => internal_error(e),
    }
}

fn redirect(path: &str) -> Response<String> {
    match HeaderValue::from_str(path) {
        Ok(location) => {
            let mut response = Response::new(String::new());
            *response.status_mut() = StatusCode::FOUND;
            response.headers_mut().insert(LOCATION, location);
            response
        }
        Err(e) => internal_error(e),
    }
}

fn internal_error(e: impl std::fmt::Display) -> Response<String> {
    tracing::error!("Failed to build response: {}", e);
    let mut response = Response::new(String::new());
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}
