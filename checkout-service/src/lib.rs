//! Checkout Service
//!
//! This crate drives the multi-step storefront checkout. Each request is
//! routed through a fixed step table that derives the next step from the
//! stored checkout state.

pub mod availability;
pub mod checkout;
pub mod controller;
pub mod models;
pub mod repository;
pub mod step;
pub mod steps;

pub use availability::{has_available_products, AllAvailable, AvailabilityCheck};
pub use checkout::{Checkout, StepRegistry};
pub use controller::{CheckoutController, CheckoutRequest, CheckoutResponse, Location, CART_PATH};
pub use models::{Address, Cart, CartLine, CheckoutState, FieldErrors, FormData, ShippingMethod};
pub use repository::{CheckoutRepository, InMemoryRepository};
pub use step::{Step, StepContext, StepName, StepPage};

/// Offers used when no catalogue is configured
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    pub shipping_methods: Vec<ShippingMethod>,
    pub payment_methods: Vec<String>,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            shipping_methods: vec![
                ShippingMethod::new("standard", "Standard delivery", 500),
                ShippingMethod::new("express", "Express delivery", 1500),
            ],
            payment_methods: vec!["card".to_string(), "bank-transfer".to_string()],
        }
    }
}

impl CheckoutConfig {
    /// Build the standard step table from this configuration
    pub fn registry(&self) -> StepRegistry {
        StepRegistry::standard(self.shipping_methods.clone(), self.payment_methods.clone())
    }
}
