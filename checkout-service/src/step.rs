//! Checkout step capability and step names

use error::CheckoutError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::checkout::Checkout;
use crate::models::{CheckoutState, FieldErrors, FormData};

/// Every step the checkout knows about, in URL slug form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepName {
    ShippingAddress,
    ShippingMethod,
    Payment,
    Summary,
    /// Terminal step shown once everything else is complete
    Confirmation,
}

impl StepName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShippingAddress => "shipping-address",
            Self::ShippingMethod => "shipping-method",
            Self::Payment => "payment",
            Self::Summary => "summary",
            Self::Confirmation => "confirmation",
        }
    }

    pub fn path(&self) -> String {
        format!("/checkout/{}/", self.as_str())
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepName {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shipping-address" => Ok(Self::ShippingAddress),
            "shipping-method" => Ok(Self::ShippingMethod),
            "payment" => Ok(Self::Payment),
            "summary" => Ok(Self::Summary),
            "confirmation" => Ok(Self::Confirmation),
            other => Err(CheckoutError::StepNotFound(other.to_string())),
        }
    }
}

/// Data for rendering a step. Rendering itself happens outside this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepPage {
    pub step: StepName,
    pub checkout: CheckoutState,
    #[serde(default, skip_serializing_if = "FieldErrors::is_empty")]
    pub errors: FieldErrors,
    /// Step-specific context such as the offered shipping methods
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub context: serde_json::Value,
}

impl StepPage {
    pub fn new(step: StepName, checkout: &Checkout) -> Self {
        Self {
            step,
            checkout: checkout.state.clone(),
            errors: FieldErrors::new(),
            context: serde_json::Value::Null,
        }
    }

    pub fn with_errors(mut self, errors: FieldErrors) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = context;
        self
    }
}

/// What a step sees while processing a request
pub struct StepContext<'a> {
    pub checkout: &'a mut Checkout,
    /// Submitted fields; `None` for a plain view of the step
    pub form: Option<&'a FormData>,
}

/// A single checkout stage.
pub trait Step: Send + Sync {
    fn name(&self) -> StepName;

    /// Whether this step's data is already satisfied by the current state.
    fn is_complete(&self, checkout: &Checkout) -> bool;

    /// Handle a view or submission.
    ///
    /// `None` means the submission satisfied the step and the flow may advance.
    /// `Some(page)` must be shown as-is; nothing is saved.
    fn process(&self, ctx: &mut StepContext<'_>) -> Option<StepPage>;
}
