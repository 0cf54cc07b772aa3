//! Where the client goes after a checkout step succeeds.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::domain::aggregates::PaymentMethod;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Payment,
    Confirmation { order_id: String, payment_method: PaymentMethod },
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Self::Payment => "/payment".to_string(),
            Self::Confirmation { order_id, payment_method } => format!(
                "/order-confirmation?orderId={}&paymentMethod={}",
                urlencoding::encode(order_id),
                urlencoding::encode(payment_method.label()),
            ),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.path()) }
}

impl Serialize for Route {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.path())
    }
}
