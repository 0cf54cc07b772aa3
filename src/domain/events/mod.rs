//! Domain events
use serde::Serialize;

use crate::domain::aggregates::{ItemId, PaymentMethod};
use crate::domain::value_objects::{Money, Quantity};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "aggregate", content = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    Cart(CartEvent),
    Order(OrderEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CartEvent {
    ItemAdded { item_id: ItemId, quantity: Quantity },
    ItemMerged { item_id: ItemId, quantity: Quantity },
    ItemRemoved { item_id: ItemId },
    QuantityChanged { item_id: ItemId, quantity: Quantity },
    Cleared,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: String, total: Money, payment_method: PaymentMethod },
}

impl OrderEvent {
    /// NATS subject the event is published under.
    pub fn subject(&self) -> &'static str {
        match self { Self::Placed { .. } => "storefront.orders.placed" }
    }
}
