//! Aura Storefront
//!
//! Cart, pricing and checkout core for the Aura wall-plaster and incense store.
//!
//! ## Features
//! - Cart store with persisted line items and shade allocations
//! - Pricing engine (flat discount code, GST, free-shipping threshold)
//! - Checkout hand-off from the address step to the payment step
//! - Order recorder with a cancellable simulated payment
//! - Swappable per-session key-value persistence (memory, PostgreSQL)

pub mod config;
pub mod domain;
pub mod http;
pub mod navigation;
pub mod pricing;
pub mod services;
pub mod session;
pub mod storage;

use thiserror::Error;

pub use config::{ConfigError, StorefrontConfig};
pub use domain::validation::FieldErrors;
pub use navigation::Route;
pub use session::{Services, Storefront};
pub use storage::StorageError;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("{0}")]
    Validation(FieldErrors),

    #[error("cart is empty")]
    EmptyCart,

    #[error("payment was cancelled")]
    PaymentCancelled,

    #[error("payment failed: {0}")]
    PaymentFailed(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<FieldErrors> for StorefrontError {
    fn from(errors: FieldErrors) -> Self { Self::Validation(errors) }
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
