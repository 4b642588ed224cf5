//! Concrete checkout steps

use serde_json::json;
use uuid::Uuid;

use crate::checkout::Checkout;
use crate::models::{Address, FieldErrors, FormData, ShippingMethod, REQUIRED};
use crate::step::{Step, StepContext, StepName, StepPage};

fn required_field<'a>(form: &'a FormData, name: &str, errors: &mut FieldErrors) -> Option<&'a str> {
    match form.get(name).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        Some(value) => Some(value),
        None => {
            errors.insert(name.to_string(), REQUIRED.to_string());
            None
        }
    }
}

/// Collects the delivery address.
///
/// Changing a previously stored address clears the chosen shipping method,
/// since the offer depends on the destination.
#[derive(Debug, Default)]
pub struct ShippingAddressStep;

impl Step for ShippingAddressStep {
    fn name(&self) -> StepName {
        StepName::ShippingAddress
    }

    fn is_complete(&self, checkout: &Checkout) -> bool {
        !checkout.requires_shipping() || checkout.state.shipping_address.is_some()
    }

    fn process(&self, ctx: &mut StepContext<'_>) -> Option<StepPage> {
        let Some(form) = ctx.form else {
            return Some(StepPage::new(self.name(), ctx.checkout));
        };

        match Address::from_form(form) {
            Ok(address) => {
                let state = &mut ctx.checkout.state;
                if state.shipping_address.as_ref().is_some_and(|old| *old != address) {
                    tracing::debug!("Shipping address changed; clearing shipping method");
                    state.shipping_method = None;
                }
                state.shipping_address = Some(address);
                None
            }
            Err(errors) => Some(StepPage::new(self.name(), ctx.checkout).with_errors(errors)),
        }
    }
}

/// Lets the buyer pick one of the offered shipping methods.
#[derive(Debug)]
pub struct ShippingMethodStep {
    methods: Vec<ShippingMethod>,
}

impl ShippingMethodStep {
    pub fn new(methods: Vec<ShippingMethod>) -> Self {
        Self { methods }
    }

    fn is_offered(&self, id: &str) -> bool {
        self.methods.iter().any(|m| m.id == id)
    }

    fn page(&self, checkout: &Checkout) -> StepPage {
        StepPage::new(self.name(), checkout).with_context(json!({ "methods": self.methods }))
    }
}

impl Step for ShippingMethodStep {
    fn name(&self) -> StepName {
        StepName::ShippingMethod
    }

    fn is_complete(&self, checkout: &Checkout) -> bool {
        !checkout.requires_shipping()
            || checkout
                .state
                .shipping_method
                .as_deref()
                .is_some_and(|id| self.is_offered(id))
    }

    fn process(&self, ctx: &mut StepContext<'_>) -> Option<StepPage> {
        let Some(form) = ctx.form else {
            return Some(self.page(ctx.checkout));
        };

        let mut errors = FieldErrors::new();
        match required_field(form, "method", &mut errors) {
            Some(id) if self.is_offered(id) => {
                ctx.checkout.state.shipping_method = Some(id.to_string());
                None
            }
            Some(_) => {
                errors.insert("method".to_string(), "Select a valid shipping method.".to_string());
                Some(self.page(ctx.checkout).with_errors(errors))
            }
            None => Some(self.page(ctx.checkout).with_errors(errors)),
        }
    }
}

/// Records the payment method and the contact email for the order.
#[derive(Debug)]
pub struct PaymentStep {
    methods: Vec<String>,
}

impl PaymentStep {
    pub fn new(methods: Vec<String>) -> Self {
        Self { methods }
    }

    fn page(&self, checkout: &Checkout) -> StepPage {
        StepPage::new(self.name(), checkout).with_context(json!({ "methods": self.methods }))
    }
}

impl Step for PaymentStep {
    fn name(&self) -> StepName {
        StepName::Payment
    }

    fn is_complete(&self, checkout: &Checkout) -> bool {
        let state = &checkout.state;
        state.email.is_some()
            && state
                .payment_method
                .as_ref()
                .is_some_and(|m| self.methods.contains(m))
    }

    fn process(&self, ctx: &mut StepContext<'_>) -> Option<StepPage> {
        let Some(form) = ctx.form else {
            return Some(self.page(ctx.checkout));
        };

        let mut errors = FieldErrors::new();
        let method = required_field(form, "method", &mut errors);
        let email = required_field(form, "email", &mut errors);

        if let Some(m) = method {
            if !self.methods.iter().any(|known| known == m) {
                errors.insert("method".to_string(), "Select a valid payment method.".to_string());
            }
        }
        if let Some(e) = email {
            if !e.contains('@') {
                errors.insert("email".to_string(), "Enter a valid email address.".to_string());
            }
        }

        match (method, email) {
            (Some(method), Some(email)) if errors.is_empty() => {
                let state = &mut ctx.checkout.state;
                state.payment_method = Some(method.to_string());
                state.email = Some(email.to_string());
                None
            }
            _ => Some(self.page(ctx.checkout).with_errors(errors)),
        }
    }
}

/// Final review; submitting it places the order.
#[derive(Debug, Default)]
pub struct SummaryStep;

impl Step for SummaryStep {
    fn name(&self) -> StepName {
        StepName::Summary
    }

    fn is_complete(&self, checkout: &Checkout) -> bool {
        checkout.state.order_token.is_some()
    }

    fn process(&self, ctx: &mut StepContext<'_>) -> Option<StepPage> {
        if ctx.form.is_none() || ctx.checkout.state.order_token.is_some() {
            return Some(StepPage::new(self.name(), ctx.checkout));
        }

        let token = Uuid::new_v4().to_string();
        tracing::info!("Placing order {} for cart {}", token, ctx.checkout.cart.token);
        ctx.checkout.state.order_token = Some(token);
        None
    }
}

/// Terminal step. Always rendered, never advanced past.
#[derive(Debug, Default)]
pub struct ConfirmationStep;

impl Step for ConfirmationStep {
    fn name(&self) -> StepName {
        StepName::Confirmation
    }

    fn is_complete(&self, checkout: &Checkout) -> bool {
        checkout.state.order_token.is_some()
    }

    fn process(&self, ctx: &mut StepContext<'_>) -> Option<StepPage> {
        Some(StepPage::new(self.name(), ctx.checkout))
    }
}
