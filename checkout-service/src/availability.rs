//! Product availability predicate
//!
//! Stock and pricing live outside this crate; checkout only asks whether a
//! line can currently be bought.

use crate::models::{Cart, CartLine};

/// Availability check for cart lines.
pub trait AvailabilityCheck: Send + Sync {
    fn is_available(&self, line: &CartLine) -> bool;
}

impl<F> AvailabilityCheck for F
where
    F: Fn(&CartLine) -> bool + Send + Sync,
{
    fn is_available(&self, line: &CartLine) -> bool {
        self(line)
    }
}

/// Treats every line with a positive quantity as available
#[derive(Debug, Default, Clone, Copy)]
pub struct AllAvailable;

impl AvailabilityCheck for AllAvailable {
    fn is_available(&self, line: &CartLine) -> bool {
        line.quantity > 0
    }
}

/// True when at least one line can currently be purchased.
pub fn has_available_products(cart: &Cart, check: &dyn AvailabilityCheck) -> bool {
    cart.lines
        .iter()
        .any(|line| line.quantity > 0 && check.is_available(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_available_products() {
        let cart = Cart::new("c")
            .with_line(CartLine::new("SOLD-OUT", 1))
            .with_line(CartLine::new("MUG", 1));

        assert!(has_available_products(&cart, &AllAvailable));

        let only_mugs = |line: &CartLine| line.variant_sku == "MUG";
        assert!(has_available_products(&cart, &only_mugs));

        let nothing = |_: &CartLine| false;
        assert!(!has_available_products(&cart, &nothing));
    }

    #[test]
    fn test_zero_quantity_lines_never_count() {
        let cart = Cart::new("c").with_line(CartLine::new("MUG", 0));
        let everything = |_: &CartLine| true;
        assert!(!has_available_products(&cart, &everything));
        assert!(!has_available_products(&Cart::new("empty"), &AllAvailable));
    }
}
