//! Per-session container for the cart, checkout and order services.
//!
//! A [`Storefront`] is created with [`Storefront::init`] when a session starts (or a request for it
//! arrives) and released with [`Storefront::dispose`]. The services inside share one store; the
//! pricing rules, payment gateway and event publisher in [`Services`] are shared by all sessions.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::pricing::PricingConfig;
use crate::services::{CartStore, CheckoutHandoff, EventPublisher, OrderRecorder, PaymentGateway, SimulatedGateway};
use crate::storage::KeyValueStore;
use crate::Result;

#[derive(Clone)]
pub struct Services {
    pub pricing: Arc<PricingConfig>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub publisher: Arc<dyn EventPublisher>,
}

impl Services {
    pub fn new(pricing: PricingConfig, gateway: Arc<dyn PaymentGateway>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { pricing: Arc::new(pricing), gateway, publisher }
    }

    /// Pricing and the simulated gateway from config.
    pub fn from_config(config: &StorefrontConfig, publisher: Arc<dyn EventPublisher>) -> Self {
        Self::new(config.pricing.clone(), Arc::new(SimulatedGateway::new(config.payment_delay)), publisher)
    }
}

pub struct Storefront {
    cart: CartStore,
    checkout: CheckoutHandoff,
    orders: OrderRecorder,
}

impl Storefront {
    pub async fn init(store: Arc<dyn KeyValueStore>, services: &Services) -> Result<Self> {
        let cart = CartStore::init(store.clone(), services.pricing.clone()).await?;
        let checkout = CheckoutHandoff::new(store.clone(), services.pricing.clone());
        let orders = OrderRecorder::new(store, services.pricing.clone(), services.gateway.clone(), services.publisher.clone());
        Ok(Self { cart, checkout, orders })
    }

    pub fn cart(&self) -> &CartStore { &self.cart }
    pub fn cart_mut(&mut self) -> &mut CartStore { &mut self.cart }
    pub fn checkout(&self) -> &CheckoutHandoff { &self.checkout }
    pub fn orders(&self) -> &OrderRecorder { &self.orders }

    /// Saves any cart change that is still pending. Every mutation persists on its own, so this only
    /// writes after an earlier save failed.
    pub async fn dispose(mut self) -> Result<()> {
        self.cart.flush().await
    }
}
