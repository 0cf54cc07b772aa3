//! Cart Aggregate

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::events::{CartEvent, DomainEvent};
use crate::domain::value_objects::{Money, Quantity};

/// Identifier of a purchasable configuration or a shade.
///
/// Older stored carts carry numeric ids, newer ones strings. Both hydrate; ids are always written
/// back as strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawItemId", into = "String")]
pub struct ItemId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawItemId { Number(i64), Text(String) }

impl From<RawItemId> for ItemId {
    fn from(raw: RawItemId) -> Self {
        match raw { RawItemId::Number(n) => Self(n.to_string()), RawItemId::Text(s) => Self(s) }
    }
}

impl ItemId {
    pub fn new(value: impl Into<String>) -> Self { Self(value.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self { id.0 }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self { Self(value.to_string()) }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Part of a pigmented line item allocated to one colour.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadeAllocation {
    pub shade_id: ItemId,
    pub shade_name: String,
    pub shade_hex: String,
    pub quantity: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub image: String,
    pub price: Money,
    #[serde(default)]
    pub quantity: Quantity,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shades: Vec<ShadeAllocation>,
}

impl CartLineItem {
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>, price: Money, quantity: Quantity) -> Self {
        Self { id: id.into(), name: name.into(), subtitle: String::new(), image: String::new(), price, quantity, shades: vec![] }
    }

    pub fn with_shades(mut self, shades: Vec<ShadeAllocation>) -> Self {
        self.shades = shades;
        self.normalize();
        self
    }

    pub fn line_total(&self) -> Money { self.price.multiply(self.quantity) }
    pub fn is_pigmented(&self) -> bool { !self.shades.is_empty() }

    /// Drops empty shade allocations and re-syncs the line quantity to their sum.
    fn normalize(&mut self) {
        self.shades.retain(|s| s.quantity > 0);
        if self.is_pigmented() {
            let sum: i64 = self.shades.iter().map(|s| i64::from(s.quantity)).sum();
            self.quantity = Quantity::clamped(sum);
        }
    }

    /// Sets the line quantity. On pigmented lines the shade split follows: extra units go to the
    /// last shade and removed units come off the last shades first.
    fn resize(&mut self, target: Quantity) {
        self.shades.retain(|s| s.quantity > 0);
        let target_units = target.value();
        let allocated = self.shades.iter().fold(0u32, |sum, s| sum.saturating_add(s.quantity));
        if allocated < target_units {
            if let Some(last) = self.shades.last_mut() {
                last.quantity = last.quantity.saturating_add(target_units - allocated);
            }
        } else {
            let mut excess = allocated - target_units;
            for shade in self.shades.iter_mut().rev() {
                if excess == 0 { break; }
                let taken = excess.min(shade.quantity);
                shade.quantity -= taken;
                excess -= taken;
            }
            self.shades.retain(|s| s.quantity > 0);
        }
        self.quantity = target;
    }

    fn merge(&mut self, incoming: CartLineItem) {
        let target = self.quantity.add(incoming.quantity);
        for shade in incoming.shades {
            match self.shades.iter_mut().find(|s| s.shade_id == shade.shade_id) {
                Some(existing) => existing.quantity = existing.quantity.saturating_add(shade.quantity),
                None => self.shades.push(shade),
            }
        }
        self.resize(target);
        self.name = incoming.name;
        self.subtitle = incoming.subtitle;
        self.image = incoming.image;
        self.price = incoming.price;
    }
}

/// Ordered cart contents keyed by line item id.
#[derive(Clone, Debug, Default)]
pub struct Cart {
    items: Vec<CartLineItem>,
    events: Vec<DomainEvent>,
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    /// Rebuilds a cart from stored rows, folding any duplicated ids together.
    pub fn from_items(items: impl IntoIterator<Item = CartLineItem>) -> Self {
        let mut cart = Self::new();
        for item in items { cart.add_item(item); }
        cart.events.clear();
        cart
    }

    pub fn items(&self) -> &[CartLineItem] { &self.items }
    pub fn item(&self, id: &ItemId) -> Option<&CartLineItem> { self.items.iter().find(|i| &i.id == id) }
    pub fn item_count(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn unit_count(&self) -> u64 { self.items.iter().map(|i| u64::from(i.quantity.value())).sum() }

    /// Inserts the item, or accumulates it into the line that already has its id.
    pub fn add_item(&mut self, mut item: CartLineItem) {
        item.normalize();
        if let Some(existing) = self.items.iter_mut().find(|i| i.id == item.id) {
            existing.merge(item);
            let event = CartEvent::ItemMerged { item_id: existing.id.clone(), quantity: existing.quantity };
            self.raise_event(event);
        } else {
            self.raise_event(CartEvent::ItemAdded { item_id: item.id.clone(), quantity: item.quantity });
            self.items.push(item);
        }
    }

    /// Sets the quantity, clamped to at least one. Returns false when the id is not in the cart.
    ///
    /// For pigmented lines the shade allocations are re-split so they still sum to the quantity.
    pub fn update_quantity(&mut self, id: &ItemId, quantity: i64) -> bool {
        let Some(item) = self.items.iter_mut().find(|i| &i.id == id) else { return false };
        item.resize(Quantity::clamped(quantity));
        let event = CartEvent::QuantityChanged { item_id: item.id.clone(), quantity: item.quantity };
        self.raise_event(event);
        true
    }

    /// Returns false when the id is not in the cart.
    pub fn remove_item(&mut self, id: &ItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| &i.id != id);
        if self.items.len() == before { return false; }
        self.raise_event(CartEvent::ItemRemoved { item_id: id.clone() });
        true
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.raise_event(CartEvent::Cleared);
    }

    pub fn has_pending_events(&self) -> bool { !self.events.is_empty() }
    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: CartEvent) { self.events.push(DomainEvent::Cart(e)); }
}
