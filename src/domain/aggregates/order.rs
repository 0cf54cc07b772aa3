//! Order Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::{Address, CartLineItem};
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::validation::{not_blank, FieldErrors};
use crate::domain::value_objects::Money;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "card")]
    Card,
    #[serde(rename = "upi")]
    Upi,
    #[serde(rename = "netbanking")]
    NetBanking,
    #[serde(rename = "cod")]
    CashOnDelivery,
}

impl PaymentMethod {
    /// Human-readable name shown on the confirmation page.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Card => "Credit/Debit Card",
            Self::Upi => "UPI",
            Self::NetBanking => "Net Banking",
            Self::CashOnDelivery => "Cash on Delivery",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CardForm {
    #[validate(custom = "not_blank")]
    pub card_number: String,
    #[validate(custom = "not_blank")]
    pub card_name: String,
    #[validate(custom = "not_blank")]
    pub expiry_date: String,
    #[validate(custom = "not_blank")]
    pub cvv: String,
}

/// Payment step input, one variant per method.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum PaymentForm {
    #[serde(rename = "card")]
    Card(CardForm),
    #[serde(rename = "upi", rename_all = "camelCase")]
    Upi { upi_id: String },
    #[serde(rename = "netbanking", rename_all = "camelCase")]
    NetBanking { bank: String },
    #[serde(rename = "cod")]
    CashOnDelivery,
}

impl PaymentForm {
    pub fn method(&self) -> PaymentMethod {
        match self {
            Self::Card(_) => PaymentMethod::Card,
            Self::Upi { .. } => PaymentMethod::Upi,
            Self::NetBanking { .. } => PaymentMethod::NetBanking,
            Self::CashOnDelivery => PaymentMethod::CashOnDelivery,
        }
    }

    /// Checks the method's required fields and returns what may be stored on the order.
    pub fn validate(&self) -> Result<PaymentDetails, FieldErrors> {
        let mut errors = FieldErrors::new();
        let details = match self {
            Self::Card(card) => {
                if let Err(e) = card.validate() { errors.extend_from(None, &e); }
                PaymentDetails::Card { card_name: card.card_name.trim().to_string(), last4: last_four(&card.card_number) }
            }
            Self::Upi { upi_id } => {
                if not_blank(upi_id).is_err() { errors.insert("upiId", "is required"); }
                PaymentDetails::Upi { upi_id: upi_id.trim().to_string() }
            }
            Self::NetBanking { bank } => {
                if not_blank(bank).is_err() { errors.insert("bank", "please select a bank"); }
                PaymentDetails::NetBanking { bank: bank.trim().to_string() }
            }
            Self::CashOnDelivery => PaymentDetails::CashOnDelivery,
        };
        errors.into_result(details)
    }
}

fn last_four(card_number: &str) -> String {
    let digits: Vec<char> = card_number.chars().filter(char::is_ascii_digit).collect();
    digits[digits.len().saturating_sub(4)..].iter().collect()
}

/// Payment details kept on the order. Card numbers are reduced to their last four digits and the
/// CVV is never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PaymentDetails {
    #[serde(rename_all = "camelCase")]
    Card { card_name: String, last4: String },
    #[serde(rename_all = "camelCase")]
    Upi { upi_id: String },
    NetBanking { bank: String },
    CashOnDelivery,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus { #[default] Processing, Shipped, Delivered, Cancelled }

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    order_id: String,
    items: Vec<CartLineItem>,
    total: Money,
    payment_method: PaymentMethod,
    payment_details: PaymentDetails,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    shipping_address: Option<Address>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

impl PartialEq for Order {
    fn eq(&self, other: &Self) -> bool {
        self.order_id == other.order_id && self.items == other.items && self.total == other.total
            && self.payment_method == other.payment_method && self.payment_details == other.payment_details
            && self.timestamp == other.timestamp && self.status == other.status
            && self.customer_id == other.customer_id && self.shipping_address == other.shipping_address
    }
}

impl Order {
    pub fn place(items: Vec<CartLineItem>, total: Money, payment_details: PaymentDetails, payment_method: PaymentMethod) -> Result<Self, OrderError> {
        if items.is_empty() { return Err(OrderError::NoItems); }
        let order_id = format!("ORD-{}", Uuid::now_v7().simple().to_string().to_uppercase());
        let mut order = Self {
            order_id: order_id.clone(), items, total, payment_method, payment_details,
            timestamp: Utc::now(), status: OrderStatus::Processing, customer_id: None, shipping_address: None, events: vec![],
        };
        order.raise_event(DomainEvent::Order(OrderEvent::Placed { order_id, total, payment_method }));
        Ok(order)
    }

    pub fn with_customer(mut self, customer_id: Option<String>) -> Self { self.customer_id = customer_id; self }
    pub fn with_shipping_address(mut self, address: Option<Address>) -> Self { self.shipping_address = address; self }

    pub fn order_id(&self) -> &str { &self.order_id }
    pub fn items(&self) -> &[CartLineItem] { &self.items }
    pub fn total(&self) -> Money { self.total }
    pub fn payment_method(&self) -> PaymentMethod { self.payment_method }
    pub fn payment_details(&self) -> &PaymentDetails { &self.payment_details }
    pub fn timestamp(&self) -> DateTime<Utc> { self.timestamp }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn customer_id(&self) -> Option<&str> { self.customer_id.as_deref() }
    pub fn shipping_address(&self) -> Option<&Address> { self.shipping_address.as_ref() }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("order has no items")]
    NoItems,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Quantity;

    fn items() -> Vec<CartLineItem> {
        vec![CartLineItem::new("1", "Neutral Plaster", Money::new(429), Quantity::clamped(2))]
    }

    #[test]
    fn test_order_placed() {
        let mut order = Order::place(items(), Money::new(1111), PaymentDetails::CashOnDelivery, PaymentMethod::CashOnDelivery).unwrap();
        assert!(order.order_id().starts_with("ORD-"));
        assert_eq!(order.status(), OrderStatus::Processing);
        let events = order.take_events();
        assert!(matches!(&events[..], [DomainEvent::Order(OrderEvent::Placed { total, .. })] if *total == Money::new(1111)));
    }

    #[test]
    fn test_order_requires_items() {
        let err = Order::place(vec![], Money::ZERO, PaymentDetails::CashOnDelivery, PaymentMethod::CashOnDelivery).unwrap_err();
        assert_eq!(err, OrderError::NoItems);
    }

    #[test]
    fn test_card_validation_masks_number() {
        let form = PaymentForm::Card(CardForm {
            card_number: "4111 1111 1111 1234".into(),
            card_name: "Meera Iyer".into(),
            expiry_date: "12/28".into(),
            cvv: "123".into(),
        });
        let details = form.validate().unwrap();
        assert_eq!(details, PaymentDetails::Card { card_name: "Meera Iyer".into(), last4: "1234".into() });
        let json = serde_json::to_string(&details).unwrap();
        assert!(!json.contains("4111"));
    }

    #[test]
    fn test_payment_fields_required() {
        let errors = PaymentForm::Card(CardForm { card_number: "4111".into(), ..CardForm::default() }).validate().unwrap_err();
        assert!(errors.contains("cardName") && errors.contains("expiryDate") && errors.contains("cvv"));
        assert!(!errors.contains("cardNumber"));
        assert!(PaymentForm::Upi { upi_id: " ".into() }.validate().unwrap_err().contains("upiId"));
        assert!(PaymentForm::NetBanking { bank: String::new() }.validate().is_err());
        assert_eq!(PaymentForm::CashOnDelivery.validate().unwrap(), PaymentDetails::CashOnDelivery);
    }

    #[test]
    fn test_payment_form_json() {
        let form: PaymentForm = serde_json::from_str(r#"{"method":"upi","upiId":"meera@okaxis"}"#).unwrap();
        assert_eq!(form.method(), PaymentMethod::Upi);
        assert_eq!(form.method().label(), "UPI");
        let form: PaymentForm = serde_json::from_str(r#"{"method":"cod"}"#).unwrap();
        assert_eq!(form, PaymentForm::CashOnDelivery);
    }
}
