//! Order recorder: turns a validated payment into an appended order record.

use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::domain::aggregates::{CheckoutSnapshot, Order, OrderError, PaymentForm};
use crate::domain::events::DomainEvent;
use crate::navigation::Route;
use crate::pricing::{self, PricingConfig};
use crate::services::cart::load_cart;
use crate::services::payment::PaymentGateway;
use crate::services::publisher::EventPublisher;
use crate::storage::{self, KeyValueStore, CHECKOUT_ADDRESS_KEY, ORDERS_KEY};
use crate::{Result, StorefrontError};

#[derive(Clone, Debug, Serialize)]
pub struct PlacedOrder {
    pub order: Order,
    pub redirect: Route,
}

pub struct OrderRecorder {
    store: Arc<dyn KeyValueStore>,
    pricing: Arc<PricingConfig>,
    gateway: Arc<dyn PaymentGateway>,
    publisher: Arc<dyn EventPublisher>,
}

impl OrderRecorder {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        pricing: Arc<PricingConfig>,
        gateway: Arc<dyn PaymentGateway>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self { store, pricing, gateway, publisher }
    }

    /// Validates the payment form, charges, and appends the order to the persisted list.
    ///
    /// Nothing is written unless the payment went through. The cart and checkout snapshot are left
    /// for the confirmation step to clear.
    pub async fn place_order(&self, form: &PaymentForm, customer_id: Option<String>, cancel: &CancellationToken) -> Result<PlacedOrder> {
        let details = form.validate()?;
        let method = form.method();

        let (cart, applied) = load_cart(self.store.as_ref()).await?;
        if cart.is_empty() { return Err(StorefrontError::EmptyCart); }
        let summary = pricing::payment_summary(cart.items(), applied.as_ref(), &self.pricing);

        let snapshot: Option<CheckoutSnapshot> = storage::load_json(self.store.as_ref(), CHECKOUT_ADDRESS_KEY).await?;
        let mut orders: Vec<Order> = storage::load_json(self.store.as_ref(), ORDERS_KEY).await?.unwrap_or_default();

        // only the orders write remains once the charge has gone through
        let receipt = self.gateway.charge(summary.total, method, cancel).await?;

        let mut order = Order::place(cart.items().to_vec(), summary.total, details, method)
            .map_err(|e| match e { OrderError::NoItems => StorefrontError::EmptyCart })?
            .with_customer(customer_id)
            .with_shipping_address(snapshot.map(|s| s.shipping_address));

        orders.push(order.clone());
        storage::save_json(self.store.as_ref(), ORDERS_KEY, &orders).await?;
        tracing::info!(order_id = order.order_id(), total = %order.total(), method = method.label(), payment_ref = %receipt.reference, "order placed");

        for event in order.take_events() {
            if let DomainEvent::Order(e) = event {
                if let Err(err) = self.publisher.publish(&e).await {
                    tracing::warn!(error = %err, order_id = order.order_id(), "failed to publish order event");
                }
            }
        }

        let redirect = Route::Confirmation { order_id: order.order_id().to_string(), payment_method: method };
        Ok(PlacedOrder { order, redirect })
    }

    /// Order history, oldest first.
    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        Ok(storage::load_json(self.store.as_ref(), ORDERS_KEY).await?.unwrap_or_default())
    }
}
