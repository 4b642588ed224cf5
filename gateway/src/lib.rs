//! Gateway library for InProcess service calls
//!
//! This module exposes the gateway functionality as a library: token
//! authentication and checkout routing over `http` types.

pub mod config;
pub mod router;

pub use config::GatewayConfig;
pub use router::{error_response, ServiceRouter, TokenPair};
