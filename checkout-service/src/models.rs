//! Checkout models
//!
//! Domain models consumed and persisted by the checkout flow.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Submitted form fields, keyed by field name
pub type FormData = BTreeMap<String, String>;

/// Validation errors, keyed by field name
pub type FieldErrors = BTreeMap<String, String>;

pub(crate) const REQUIRED: &str = "This field is required.";

/// A single cart line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub variant_sku: String,
    pub quantity: u32,
    pub requires_shipping: bool,
}

impl CartLine {
    pub fn new(variant_sku: impl Into<String>, quantity: u32) -> Self {
        Self {
            variant_sku: variant_sku.into(),
            quantity,
            requires_shipping: true,
        }
    }

    /// Mark the line as a digital good
    pub fn digital(mut self) -> Self {
        self.requires_shipping = false;
        self
    }
}

/// Cart as resolved for the current request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub token: String,
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            lines: Vec::new(),
        }
    }

    pub fn with_line(mut self, line: CartLine) -> Self {
        self.lines.push(line);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.quantity == 0)
    }

    /// Whether any line needs a shipping address and method
    pub fn requires_shipping(&self) -> bool {
        self.lines.iter().any(|l| l.quantity > 0 && l.requires_shipping)
    }
}

/// Postal address collected by the shipping-address step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    pub street_address: String,
    pub city: String,
    pub postal_code: String,
    /// ISO 3166-1 alpha-2 country code
    pub country: String,
}

impl Address {
    /// Parse and validate an address form
    pub fn from_form(form: &FormData) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut field = |name: &str| -> String {
            let value = form.get(name).map(|v| v.trim().to_string()).unwrap_or_default();
            if value.is_empty() {
                errors.insert(name.to_string(), REQUIRED.to_string());
            }
            value
        };

        let address = Self {
            first_name: field("first_name"),
            last_name: field("last_name"),
            street_address: field("street_address"),
            city: field("city"),
            postal_code: field("postal_code"),
            country: field("country").to_ascii_uppercase(),
        };

        if !address.country.is_empty()
            && (address.country.len() != 2 || !address.country.chars().all(|c| c.is_ascii_alphabetic()))
        {
            errors.insert("country".to_string(), "Enter a two-letter country code.".to_string());
        }

        if errors.is_empty() {
            Ok(address)
        } else {
            Err(errors)
        }
    }
}

/// Shipping option offered at checkout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingMethod {
    pub id: String,
    pub name: String,
    pub price_cents: u64,
}

impl ShippingMethod {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price_cents: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price_cents,
        }
    }
}

/// Persisted checkout progress, keyed by cart token.
///
/// The current step is never stored; it is derived from these fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutState {
    pub cart_token: String,
    pub shipping_address: Option<Address>,
    pub shipping_method: Option<String>,
    pub payment_method: Option<String>,
    pub email: Option<String>,
    /// Set once the order has been placed
    pub order_token: Option<String>,
}

impl CheckoutState {
    pub fn new(cart_token: impl Into<String>) -> Self {
        Self {
            cart_token: cart_token.into(),
            ..Default::default()
        }
    }
}
