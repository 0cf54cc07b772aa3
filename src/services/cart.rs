//! Cart store: the session's cart and applied discount code, persisted after every change.

use std::sync::Arc;

use crate::domain::aggregates::{Cart, CartLineItem, ItemId};
use crate::domain::events::DomainEvent;
use crate::domain::value_objects::DiscountCode;
use crate::pricing::{self, DiscountOutcome, PriceBreakdown, PricingConfig};
use crate::storage::{self, KeyValueStore, CART_KEY, DISCOUNT_KEY};
use crate::Result;

/// Reads the persisted cart and applied code. Absent or malformed data yields an empty cart.
pub(crate) async fn load_cart(store: &dyn KeyValueStore) -> Result<(Cart, Option<DiscountCode>)> {
    let items: Vec<CartLineItem> = storage::load_json(store, CART_KEY).await?.unwrap_or_default();
    let applied = storage::load_json(store, DISCOUNT_KEY).await?;
    Ok((Cart::from_items(items), applied))
}

pub struct CartStore {
    store: Arc<dyn KeyValueStore>,
    pricing: Arc<PricingConfig>,
    cart: Cart,
    applied: Option<DiscountCode>,
}

impl CartStore {
    /// Hydrates from storage.
    pub async fn init(store: Arc<dyn KeyValueStore>, pricing: Arc<PricingConfig>) -> Result<Self> {
        let (cart, applied) = load_cart(store.as_ref()).await?;
        tracing::debug!(lines = cart.item_count(), discount = applied.is_some(), "cart hydrated");
        Ok(Self { store, pricing, cart, applied })
    }

    pub fn items(&self) -> &[CartLineItem] { self.cart.items() }
    pub fn is_empty(&self) -> bool { self.cart.is_empty() }
    pub fn unit_count(&self) -> u64 { self.cart.unit_count() }
    pub fn applied_code(&self) -> Option<&DiscountCode> { self.applied.as_ref() }

    /// Cart-page totals; shipping is left to the payment step.
    pub fn summary(&self) -> PriceBreakdown {
        pricing::cart_summary(self.cart.items(), self.applied.as_ref(), &self.pricing)
    }

    pub async fn add_to_cart(&mut self, item: CartLineItem) -> Result<()> {
        self.cart.add_item(item);
        self.persist_cart().await
    }

    /// No-op when the id is not in the cart.
    pub async fn remove_from_cart(&mut self, id: &ItemId) -> Result<()> {
        if self.cart.remove_item(id) { self.persist_cart().await?; }
        Ok(())
    }

    /// Quantity is clamped to at least one. No-op when the id is not in the cart.
    pub async fn update_quantity(&mut self, id: &ItemId, quantity: i64) -> Result<()> {
        if self.cart.update_quantity(id, quantity) { self.persist_cart().await?; }
        Ok(())
    }

    pub async fn clear_cart(&mut self) -> Result<()> {
        self.cart.clear();
        self.persist_cart().await
    }

    /// A rejected code leaves whatever was applied before untouched.
    pub async fn apply_code(&mut self, raw: &str) -> Result<DiscountOutcome> {
        let outcome = pricing::check_code(raw, &self.pricing);
        match &outcome {
            DiscountOutcome::Applied { code, amount } => {
                tracing::info!(code = %code, amount = %amount, "discount code applied");
                storage::save_json(self.store.as_ref(), DISCOUNT_KEY, code).await?;
                self.applied = Some(code.clone());
            }
            DiscountOutcome::Rejected => tracing::debug!("discount code rejected"),
        }
        Ok(outcome)
    }

    pub async fn remove_code(&mut self) -> Result<()> {
        self.applied = None;
        self.store.remove(DISCOUNT_KEY).await?;
        Ok(())
    }

    /// Writes back changes whose save did not go through. A cart with nothing pending is left alone,
    /// so a stale instance never overwrites what another one stored since.
    pub async fn flush(&mut self) -> Result<()> {
        if self.cart.has_pending_events() { self.persist_cart().await?; }
        Ok(())
    }

    async fn persist_cart(&mut self) -> Result<()> {
        storage::save_json(self.store.as_ref(), CART_KEY, self.cart.items()).await?;
        for event in self.cart.take_events() {
            if let DomainEvent::Cart(e) = event { tracing::debug!(event = ?e, "cart changed"); }
        }
        Ok(())
    }
}
