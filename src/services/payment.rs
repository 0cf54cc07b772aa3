//! Payment gateway seam.
//!
//! There is no real gateway yet: [`SimulatedGateway`] waits a fixed delay and approves. The wait
//! runs against a cancellation token so a shutdown (or a real gateway timeout later) can abort it.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::aggregates::PaymentMethod;
use crate::domain::value_objects::Money;
use crate::{Result, StorefrontError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PaymentReceipt {
    pub reference: String,
    pub amount: Money,
    pub method: PaymentMethod,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, amount: Money, method: PaymentMethod, cancel: &CancellationToken) -> Result<PaymentReceipt>;
}

#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    delay: Duration,
}

impl SimulatedGateway {
    pub fn new(delay: Duration) -> Self { Self { delay } }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn charge(&self, amount: Money, method: PaymentMethod, cancel: &CancellationToken) -> Result<PaymentReceipt> {
        tracing::debug!(%amount, method = method.label(), delay_ms = self.delay.as_millis() as u64, "processing payment");
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::warn!(%amount, "payment cancelled before completion");
                Err(StorefrontError::PaymentCancelled)
            }
            _ = tokio::time::sleep(self.delay) => {
                Ok(PaymentReceipt { reference: format!("PAY-{}", Uuid::new_v4().simple()), amount, method })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulated_gateway_approves() {
        let gateway = SimulatedGateway::new(Duration::from_millis(5));
        let receipt = gateway.charge(Money::new(1180), PaymentMethod::Upi, &CancellationToken::new()).await.unwrap();
        assert_eq!(receipt.amount, Money::new(1180));
        assert!(receipt.reference.starts_with("PAY-"));
    }

    #[tokio::test]
    async fn test_cancelled_payment() {
        let gateway = SimulatedGateway::new(Duration::from_secs(60));
        let cancel = CancellationToken::new();
        let pending = gateway.charge(Money::new(1180), PaymentMethod::Card, &cancel);
        cancel.cancel();
        assert!(matches!(pending.await, Err(StorefrontError::PaymentCancelled)));
    }
}
