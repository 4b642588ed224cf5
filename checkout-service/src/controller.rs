//! Checkout controller
//!
//! Orchestrates a single checkout request: cart precondition, step
//! resolution, processing, then save-and-redirect.

use error::CheckoutError;
use std::sync::Arc;

use crate::availability::{has_available_products, AvailabilityCheck};
use crate::checkout::{Checkout, StepRegistry};
use crate::models::{Cart, CheckoutState, FormData};
use crate::repository::CheckoutRepository;
use crate::step::{StepContext, StepName, StepPage};

/// Cart overview path used when checkout cannot proceed
pub const CART_PATH: &str = "/cart/";

/// Inbound checkout request
#[derive(Debug, Clone, Default)]
pub struct CheckoutRequest {
    /// Cart attached to the session, if any
    pub cart: Option<Cart>,
    /// Submitted form; `None` for a plain view
    pub form: Option<FormData>,
}

impl CheckoutRequest {
    pub fn view(cart: Option<Cart>) -> Self {
        Self { cart, form: None }
    }

    pub fn submit(cart: Option<Cart>, form: FormData) -> Self {
        Self {
            cart,
            form: Some(form),
        }
    }
}

/// Redirect targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Cart,
    Step(StepName),
}

impl Location {
    pub fn path(&self) -> String {
        match self {
            Self::Cart => CART_PATH.to_string(),
            Self::Step(step) => step.path(),
        }
    }
}

/// Outcome of handling a checkout request
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutResponse {
    Redirect(Location),
    Page(StepPage),
}

/// Checkout controller for a fixed step table
pub struct CheckoutController<R> {
    registry: StepRegistry,
    repository: R,
    availability: Arc<dyn AvailabilityCheck>,
}

impl<R: CheckoutRepository> CheckoutController<R> {
    pub fn new(registry: StepRegistry, repository: R, availability: Arc<dyn AvailabilityCheck>) -> Self {
        Self {
            registry,
            repository,
            availability,
        }
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Handle a request for `step`, or for the resume point when `step` is `None`.
    pub async fn handle_step(
        &self,
        request: CheckoutRequest,
        step: Option<&str>,
    ) -> Result<CheckoutResponse, CheckoutError> {
        let Some(cart) = self.available_cart(request.cart) else {
            tracing::debug!("{}; redirecting to cart overview", CheckoutError::CartUnavailable);
            return Ok(CheckoutResponse::Redirect(Location::Cart));
        };

        let state = self
            .repository
            .load(&cart.token)
            .await
            .map_err(|e| CheckoutError::Storage(e.to_string()))?
            .unwrap_or_else(|| CheckoutState::new(cart.token.clone()));
        let mut checkout = Checkout::new(cart, state);

        let Some(requested) = step else {
            return Ok(self.redirect_to_next(&checkout));
        };

        let step = self.registry.lookup(requested)?;

        if !self.registry.is_reachable(step.name(), &checkout) {
            tracing::info!(
                "Step {} requested before its prerequisites for cart {}",
                step.name(),
                checkout.cart.token
            );
            return Ok(self.redirect_to_next(&checkout));
        }

        let page = step.process(&mut StepContext {
            checkout: &mut checkout,
            form: request.form.as_ref(),
        });
        if let Some(page) = page {
            return Ok(CheckoutResponse::Page(page));
        }

        self.repository.save(&checkout.state).await.map_err(|e| {
            tracing::error!("Failed to save checkout for cart {}: {}", checkout.cart.token, e);
            CheckoutError::Storage(e.to_string())
        })?;

        Ok(self.redirect_to_next(&checkout))
    }

    fn available_cart(&self, cart: Option<Cart>) -> Option<Cart> {
        cart.filter(|cart| has_available_products(cart, &*self.availability))
    }

    fn redirect_to_next(&self, checkout: &Checkout) -> CheckoutResponse {
        let next = self.registry.get_next_step(checkout);
        tracing::debug!("Next checkout step for cart {} is {}", checkout.cart.token, next);
        CheckoutResponse::Redirect(Location::Step(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::AllAvailable;
    use crate::models::{CartLine, ShippingMethod};
    use crate::repository::InMemoryRepository;
    use tokio_test::assert_ok;

    fn controller() -> CheckoutController<InMemoryRepository> {
        CheckoutController::new(
            StepRegistry::standard(
                vec![ShippingMethod::new("courier", "Courier", 1500)],
                vec!["card".to_string()],
            ),
            InMemoryRepository::new(),
            Arc::new(AllAvailable),
        )
    }

    fn cart() -> Cart {
        Cart::new("cart-1").with_line(CartLine::new("MUG", 1))
    }

    fn form(fields: &[(&str, &str)]) -> FormData {
        fields.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn address_form() -> FormData {
        form(&[
            ("first_name", "Ada"),
            ("last_name", "Lovelace"),
            ("street_address", "1 Main St"),
            ("city", "London"),
            ("postal_code", "N1"),
            ("country", "GB"),
        ])
    }

    fn redirect(step: StepName) -> CheckoutResponse {
        CheckoutResponse::Redirect(Location::Step(step))
    }

    #[tokio::test]
    async fn test_unavailable_cart_redirects_to_cart() {
        let controller = controller();
        let sold_out = Cart::new("c").with_line(CartLine::new("MUG", 0));

        for step in [None, Some("payment"), Some("gift-wrap")] {
            for cart in [None, Some(Cart::new("empty")), Some(sold_out.clone())] {
                let response = controller.handle_step(CheckoutRequest::view(cart), step).await;
                assert_eq!(response, Ok(CheckoutResponse::Redirect(Location::Cart)));
            }
        }
        assert_eq!(controller.repository().save_count(), 0);
    }

    #[tokio::test]
    async fn test_no_step_redirects_to_resume_point() {
        let controller = controller();
        let response = controller.handle_step(CheckoutRequest::view(Some(cart())), None).await;
        assert_eq!(response, Ok(redirect(StepName::ShippingAddress)));
    }

    #[tokio::test]
    async fn test_unknown_step_is_not_found() {
        let controller = controller();
        let response = controller
            .handle_step(CheckoutRequest::submit(Some(cart()), address_form()), Some("gift-wrap"))
            .await;
        assert_eq!(response, Err(CheckoutError::StepNotFound("gift-wrap".to_string())));
    }

    #[tokio::test]
    async fn test_page_response_is_returned_without_saving() {
        let controller = controller();
        let request = CheckoutRequest::submit(Some(cart()), form(&[("city", "London")]));

        let first = assert_ok!(controller.handle_step(request.clone(), Some("shipping-address")).await);
        let second = assert_ok!(controller.handle_step(request, Some("shipping-address")).await);

        assert!(matches!(first, CheckoutResponse::Page(ref page) if !page.errors.is_empty()));
        assert_eq!(first, second);
        assert_eq!(controller.repository().save_count(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_step_redirects_without_processing() {
        let controller = controller();
        let request = CheckoutRequest::submit(Some(cart()), form(&[("method", "card"), ("email", "a@b.co")]));

        let response = controller.handle_step(request, Some("payment")).await;
        assert_eq!(response, Ok(redirect(StepName::ShippingAddress)));
        assert_eq!(controller.repository().save_count(), 0);
    }

    #[tokio::test]
    async fn test_full_flow() {
        let controller = controller();
        let submit = |fields: FormData| CheckoutRequest::submit(Some(cart()), fields);

        let response = controller.handle_step(submit(address_form()), Some("shipping-address")).await;
        assert_eq!(response, Ok(redirect(StepName::ShippingMethod)));

        let response = controller
            .handle_step(submit(form(&[("method", "courier")])), Some("shipping-method"))
            .await;
        assert_eq!(response, Ok(redirect(StepName::Payment)));

        let response = controller
            .handle_step(submit(form(&[("method", "card"), ("email", "a@b.co")])), Some("payment"))
            .await;
        assert_eq!(response, Ok(redirect(StepName::Summary)));

        let response = controller.handle_step(submit(FormData::new()), Some("summary")).await;
        assert_eq!(response, Ok(redirect(StepName::Confirmation)));

        let page = controller
            .handle_step(CheckoutRequest::view(Some(cart())), Some("confirmation"))
            .await;
        match page {
            Ok(CheckoutResponse::Page(page)) => {
                assert_eq!(page.step, StepName::Confirmation);
                assert!(page.checkout.order_token.is_some());
            }
            other => panic!("expected confirmation page, got {:?}", other),
        }
        assert_eq!(controller.repository().save_count(), 4);
    }

    #[tokio::test]
    async fn test_revisiting_earlier_step_keeps_progress() {
        let controller = controller();
        let submit = |fields: FormData| CheckoutRequest::submit(Some(cart()), fields);

        controller.handle_step(submit(address_form()), Some("shipping-address")).await.unwrap();
        controller
            .handle_step(submit(form(&[("method", "courier")])), Some("shipping-method"))
            .await
            .unwrap();

        // Resubmitting the same address lands on the first unfinished step
        let response = controller.handle_step(submit(address_form()), Some("shipping-address")).await;
        assert_eq!(response, Ok(redirect(StepName::Payment)));

        // A different address re-opens shipping method
        let mut moved = address_form();
        moved.insert("city".to_string(), "Leeds".to_string());
        let response = controller.handle_step(submit(moved), Some("shipping-address")).await;
        assert_eq!(response, Ok(redirect(StepName::ShippingMethod)));
    }

    #[tokio::test]
    async fn test_placed_order_cannot_be_edited() {
        let controller = controller();
        let submit = |fields: FormData| CheckoutRequest::submit(Some(cart()), fields);

        controller.handle_step(submit(address_form()), Some("shipping-address")).await.unwrap();
        controller
            .handle_step(submit(form(&[("method", "courier")])), Some("shipping-method"))
            .await
            .unwrap();
        controller
            .handle_step(submit(form(&[("method", "card"), ("email", "a@b.co")])), Some("payment"))
            .await
            .unwrap();
        controller.handle_step(submit(FormData::new()), Some("summary")).await.unwrap();
        let placed = controller.repository().load("cart-1").await.unwrap().unwrap();

        let mut moved = address_form();
        moved.insert("city".to_string(), "Leeds".to_string());
        let response = controller.handle_step(submit(moved), Some("shipping-address")).await;
        assert_eq!(response, Ok(redirect(StepName::Confirmation)));

        let response = controller.handle_step(submit(FormData::new()), Some("summary")).await;
        assert_eq!(response, Ok(redirect(StepName::Confirmation)));

        let stored = controller.repository().load("cart-1").await.unwrap().unwrap();
        assert_eq!(stored, placed);
        assert_eq!(stored.shipping_address.map(|a| a.city), Some("London".to_string()));
        assert_eq!(stored.shipping_method, Some("courier".to_string()));
        assert_eq!(controller.repository().save_count(), 4);
    }

    #[tokio::test]
    async fn test_availability_predicate_is_consulted() {
        let controller = CheckoutController::new(
            StepRegistry::standard(vec![], vec![]),
            InMemoryRepository::new(),
            Arc::new(|line: &CartLine| line.variant_sku != "MUG"),
        );
        let response = controller.handle_step(CheckoutRequest::view(Some(cart())), None).await;
        assert_eq!(response, Ok(CheckoutResponse::Redirect(Location::Cart)));
    }
}
