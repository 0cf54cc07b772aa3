//! Checkout hand-off between the independently loaded address and payment steps.

use std::sync::Arc;

use crate::domain::aggregates::{AddressForm, CheckoutSnapshot};
use crate::navigation::Route;
use crate::pricing::{self, PriceBreakdown, PricingConfig};
use crate::services::cart::load_cart;
use crate::storage::{self, KeyValueStore, CART_KEY, CHECKOUT_ADDRESS_KEY, DISCOUNT_KEY};
use crate::Result;

pub struct CheckoutHandoff {
    store: Arc<dyn KeyValueStore>,
    pricing: Arc<PricingConfig>,
}

impl CheckoutHandoff {
    pub fn new(store: Arc<dyn KeyValueStore>, pricing: Arc<PricingConfig>) -> Self {
        Self { store, pricing }
    }

    /// Validates the address form and persists the snapshot.
    ///
    /// On a validation failure nothing is written and the caller stays on the address step.
    pub async fn submit_address(&self, form: &AddressForm) -> Result<Route> {
        let snapshot = form.validate()?;
        storage::save_json(self.store.as_ref(), CHECKOUT_ADDRESS_KEY, &snapshot).await?;
        tracing::info!(city = %snapshot.shipping_address.city, same_as_shipping = snapshot.same_as_shipping, "checkout address saved");
        Ok(Route::Payment)
    }

    pub async fn load_snapshot(&self) -> Result<Option<CheckoutSnapshot>> {
        Ok(storage::load_json(self.store.as_ref(), CHECKOUT_ADDRESS_KEY).await?)
    }

    /// Payment-step totals, recomputed from the persisted cart with shipping resolved.
    pub async fn payment_summary(&self) -> Result<PriceBreakdown> {
        let (cart, applied) = load_cart(self.store.as_ref()).await?;
        Ok(pricing::payment_summary(cart.items(), applied.as_ref(), &self.pricing))
    }

    /// Confirmation step: the order is on record, so the cart, code and snapshot go.
    pub async fn complete(&self, order_id: &str) -> Result<()> {
        for key in [CART_KEY, DISCOUNT_KEY, CHECKOUT_ADDRESS_KEY] {
            self.store.remove(key).await?;
        }
        tracing::info!(order_id, "checkout completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{Address, CartLineItem};
    use crate::domain::value_objects::{Money, Quantity};
    use crate::pricing::Shipping;
    use crate::storage::MemoryStore;
    use crate::StorefrontError;

    fn address() -> Address {
        Address {
            full_name: "Arjun Rao".into(),
            phone: "9000000001".into(),
            email: "arjun@example.com".into(),
            address: "4 Temple Street".into(),
            city: "Pune".into(),
            state: "Maharashtra".into(),
            pincode: "411001".into(),
            landmark: Some("Near the post office".into()),
        }
    }

    fn handoff() -> (Arc<dyn KeyValueStore>, CheckoutHandoff) {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        (store.clone(), CheckoutHandoff::new(store, Arc::new(PricingConfig::default())))
    }

    #[tokio::test]
    async fn test_blank_city_blocks_the_step() {
        let (store, checkout) = handoff();
        let mut form = AddressForm::new(address());
        form.shipping_address.city = String::new();
        let err = checkout.submit_address(&form).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Validation(ref f) if f.contains("shippingAddress.city")));
        assert!(store.get(CHECKOUT_ADDRESS_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_snapshot_persisted_with_mirrored_billing() {
        let (_store, checkout) = handoff();
        let route = checkout.submit_address(&AddressForm::new(address())).await.unwrap();
        assert_eq!(route, Route::Payment);
        let snapshot = checkout.load_snapshot().await.unwrap().unwrap();
        assert_eq!(snapshot.billing_address, snapshot.shipping_address);
        assert!(snapshot.same_as_shipping);
    }

    #[tokio::test]
    async fn test_payment_summary_reads_persisted_cart() {
        let (store, checkout) = handoff();
        let items = vec![CartLineItem::new("1", "Plaster", Money::new(429), Quantity::clamped(2))];
        storage::save_json(store.as_ref(), CART_KEY, &items).await.unwrap();
        let summary = checkout.payment_summary().await.unwrap();
        assert_eq!(summary.shipping, Shipping::Charged(Money::new(99)));
        assert_eq!(summary.total, Money::new(1129));

        checkout.complete("ORD-1").await.unwrap();
        assert_eq!(checkout.payment_summary().await.unwrap().total, Money::ZERO);
    }
}
