//! Pricing engine.
//!
//! Pure functions from cart contents and the applied discount code to order totals. The cart page
//! uses [`cart_summary`], which leaves shipping to the next step; the payment step uses
//! [`payment_summary`], which resolves it.
//!
//! Order of computation:
//! 1. `subtotal = Σ price × quantity`
//! 2. `discount` = the flat amount when the applied code is the valid one, capped at the subtotal
//! 3. `shipping` = deferred (counts as 0) or resolved against the free-shipping threshold
//! 4. `tax = round((subtotal − discount + shipping) × rate)`
//! 5. `total = subtotal − discount + shipping + tax`
//!
//! An empty cart prices to zero across the board whatever code is applied.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::aggregates::CartLineItem;
use crate::domain::value_objects::{DiscountCode, Money};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PricingConfig {
    /// The single code that unlocks the flat discount.
    pub discount_code: DiscountCode,
    pub flat_discount: Money,
    /// GST rate, 0.18.
    pub tax_rate: Decimal,
    /// Orders with a subtotal strictly above this ship free.
    pub free_shipping_threshold: Money,
    pub shipping_fee: Money,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            discount_code: DiscountCode::from_static("AURA10"),
            flat_discount: Money::new(500),
            tax_rate: Decimal::new(18, 2),
            free_shipping_threshold: Money::new(999),
            shipping_fee: Money::new(99),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "amount", rename_all = "lowercase")]
pub enum Shipping {
    /// Calculated at the payment step.
    Deferred,
    Charged(Money),
}

impl Shipping {
    pub fn amount(&self) -> Money {
        match self { Self::Deferred => Money::ZERO, Self::Charged(m) => *m }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PriceBreakdown {
    pub subtotal: Money,
    pub discount: Money,
    pub shipping: Shipping,
    pub tax: Money,
    pub total: Money,
}

impl PriceBreakdown {
    fn zero() -> Self {
        Self { subtotal: Money::ZERO, discount: Money::ZERO, shipping: Shipping::Charged(Money::ZERO), tax: Money::ZERO, total: Money::ZERO }
    }
}

/// Result of submitting a discount code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DiscountOutcome {
    Applied { code: DiscountCode, amount: Money },
    Rejected,
}

impl DiscountOutcome {
    pub fn is_applied(&self) -> bool { matches!(self, Self::Applied { .. }) }
}

pub fn subtotal(items: &[CartLineItem]) -> Money {
    items.iter().map(CartLineItem::line_total).sum()
}

/// Normalises a submitted code and checks it against the valid one. No partial matching.
pub fn check_code(raw: &str, config: &PricingConfig) -> DiscountOutcome {
    match DiscountCode::new(raw) {
        Ok(code) if code == config.discount_code => DiscountOutcome::Applied { code, amount: config.flat_discount },
        _ => DiscountOutcome::Rejected,
    }
}

fn discount_for(applied: Option<&DiscountCode>, config: &PricingConfig) -> Money {
    match applied {
        Some(code) if *code == config.discount_code => config.flat_discount,
        _ => Money::ZERO,
    }
}

/// Totals for the cart page; shipping stays deferred.
pub fn cart_summary(items: &[CartLineItem], applied: Option<&DiscountCode>, config: &PricingConfig) -> PriceBreakdown {
    summarize(items, applied, config, false)
}

/// Totals for the payment step, with shipping resolved.
pub fn payment_summary(items: &[CartLineItem], applied: Option<&DiscountCode>, config: &PricingConfig) -> PriceBreakdown {
    summarize(items, applied, config, true)
}

/// The flat discount is capped at the subtotal, so `subtotal - discount` never goes negative.
fn summarize(items: &[CartLineItem], applied: Option<&DiscountCode>, config: &PricingConfig, resolve_shipping: bool) -> PriceBreakdown {
    if items.is_empty() { return PriceBreakdown::zero(); }

    let subtotal = subtotal(items);
    let discount = discount_for(applied, config).min(subtotal);
    let shipping = if !resolve_shipping {
        Shipping::Deferred
    } else if subtotal > config.free_shipping_threshold {
        Shipping::Charged(Money::ZERO)
    } else {
        Shipping::Charged(config.shipping_fee)
    };
    let taxable = subtotal.subtract(discount).add(shipping.amount());
    let tax = taxable.apply_rate(config.tax_rate);
    PriceBreakdown { subtotal, discount, shipping, tax, total: taxable.add(tax) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Quantity;

    fn line(id: &str, price: i64, qty: i64) -> CartLineItem {
        CartLineItem::new(id, "Item", Money::new(price), Quantity::clamped(qty))
    }

    fn code(raw: &str) -> DiscountCode { DiscountCode::new(raw).unwrap() }

    #[test]
    fn test_subtotal() {
        assert_eq!(subtotal(&[line("1", 429, 2), line("2", 1499, 1)]), Money::new(2357));
    }

    #[test]
    fn test_tax_and_total() {
        let summary = cart_summary(&[line("1", 1000, 1)], None, &PricingConfig::default());
        assert_eq!(summary.tax, Money::new(180));
        assert_eq!(summary.total, Money::new(1180));
        assert_eq!(summary.shipping, Shipping::Deferred);
    }

    #[test]
    fn test_discount_codes() {
        let config = PricingConfig::default();
        assert_eq!(check_code("AURA10", &config), DiscountOutcome::Applied { code: code("AURA10"), amount: Money::new(500) });
        assert!(check_code("  aura10 ", &config).is_applied());
        assert_eq!(check_code("WRONG", &config), DiscountOutcome::Rejected);
        assert_eq!(check_code("AURA", &config), DiscountOutcome::Rejected);
        assert_eq!(check_code("", &config), DiscountOutcome::Rejected);

        let items = [line("1", 2000, 1)];
        let applied = code("aura10");
        let summary = cart_summary(&items, Some(&applied), &config);
        assert_eq!(summary.discount, Money::new(500));
        // (2000 - 500) * 1.18
        assert_eq!(summary.total, Money::new(1770));
        assert_eq!(cart_summary(&items, Some(&code("WRONG")), &config).discount, Money::ZERO);
    }

    #[test]
    fn test_empty_cart_collapses() {
        let config = PricingConfig::default();
        for summary in [cart_summary(&[], Some(&code("AURA10")), &config), payment_summary(&[], None, &config)] {
            assert_eq!(summary, PriceBreakdown::zero());
            assert_eq!(summary.shipping.amount(), Money::ZERO);
        }
    }

    #[test]
    fn test_discount_capped_at_subtotal() {
        let summary = cart_summary(&[line("1", 429, 1)], Some(&code("AURA10")), &PricingConfig::default());
        assert_eq!(summary.discount, Money::new(429));
        assert_eq!(summary.total, Money::ZERO);
    }

    #[test]
    fn test_payment_shipping_threshold() {
        let config = PricingConfig::default();
        let small = payment_summary(&[line("1", 429, 2)], None, &config);
        assert_eq!(small.shipping, Shipping::Charged(Money::new(99)));
        // (858 + 99) * 0.18 = 172.26
        assert_eq!(small.tax, Money::new(172));
        assert_eq!(small.total, Money::new(1129));

        let at_threshold = payment_summary(&[line("1", 999, 1)], None, &config);
        assert_eq!(at_threshold.shipping, Shipping::Charged(Money::new(99)));

        let large = payment_summary(&[line("1", 1000, 1)], None, &config);
        assert_eq!(large.shipping, Shipping::Charged(Money::ZERO));
        assert_eq!(large.total, Money::new(1180));
    }
}
