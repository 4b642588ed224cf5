//! Checkout session and step machine
//!
//! The current step is never stored. It is recomputed from the session state
//! on every request, walking the step table in its fixed order.

use error::CheckoutError;

use crate::models::{Cart, CheckoutState, ShippingMethod};
use crate::step::{Step, StepName};
use crate::steps::{ConfirmationStep, PaymentStep, ShippingAddressStep, ShippingMethodStep, SummaryStep};

/// Per-request checkout session: the request's cart plus its stored progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkout {
    pub cart: Cart,
    pub state: CheckoutState,
}

impl Checkout {
    pub fn new(cart: Cart, state: CheckoutState) -> Self {
        Self { cart, state }
    }

    pub fn requires_shipping(&self) -> bool {
        self.cart.requires_shipping()
    }

    /// Whether the order has been placed. A placed checkout is frozen.
    pub fn is_placed(&self) -> bool {
        self.state.order_token.is_some()
    }
}

/// Fixed, ordered table of checkout steps plus the terminal step.
pub struct StepRegistry {
    steps: Vec<Box<dyn Step>>,
    terminal: Box<dyn Step>,
}

impl StepRegistry {
    pub fn new(steps: Vec<Box<dyn Step>>, terminal: Box<dyn Step>) -> Self {
        Self { steps, terminal }
    }

    /// shipping-address, shipping-method, payment, summary, then confirmation.
    pub fn standard(shipping_methods: Vec<ShippingMethod>, payment_methods: Vec<String>) -> Self {
        Self::new(
            vec![
                Box::new(ShippingAddressStep) as Box<dyn Step>,
                Box::new(ShippingMethodStep::new(shipping_methods)),
                Box::new(PaymentStep::new(payment_methods)),
                Box::new(SummaryStep),
            ],
            Box::new(ConfirmationStep),
        )
    }

    /// Step names in table order, terminal last.
    pub fn sequence(&self) -> Vec<StepName> {
        self.steps
            .iter()
            .chain(std::iter::once(&self.terminal))
            .map(|s| s.name())
            .collect()
    }

    /// First step whose data is not yet satisfied, or the terminal step.
    ///
    /// Once the order is placed this is always the terminal step.
    pub fn get_next_step(&self, checkout: &Checkout) -> StepName {
        if checkout.is_placed() {
            return self.terminal.name();
        }
        self.steps
            .iter()
            .find(|step| !step.is_complete(checkout))
            .map(|step| step.name())
            .unwrap_or_else(|| self.terminal.name())
    }

    /// Resolve a step by slug.
    pub fn lookup(&self, name: &str) -> Result<&dyn Step, CheckoutError> {
        let parsed: StepName = name.parse()?;
        self.steps
            .iter()
            .chain(std::iter::once(&self.terminal))
            .find(|step| step.name() == parsed)
            .map(|step| &**step)
            .ok_or_else(|| CheckoutError::StepNotFound(name.to_string()))
    }

    /// A step is reachable when every step before it is complete.
    /// After the order is placed only the terminal step is.
    pub fn is_reachable(&self, name: StepName, checkout: &Checkout) -> bool {
        let next = self.get_next_step(checkout);
        if name == self.terminal.name() {
            return next == name;
        }
        if checkout.is_placed() {
            return false;
        }
        match (self.position(name), self.position(next)) {
            (Some(requested), Some(next)) => requested <= next,
            // Everything is complete, so every registered step may be revisited
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    fn position(&self, name: StepName) -> Option<usize> {
        self.steps.iter().position(|step| step.name() == name)
    }
}
