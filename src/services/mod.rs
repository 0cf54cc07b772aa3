//! Session-scoped services over a [`KeyValueStore`](crate::storage::KeyValueStore).
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod payment;
pub mod publisher;

pub use cart::CartStore;
pub use checkout::CheckoutHandoff;
pub use orders::{OrderRecorder, PlacedOrder};
pub use payment::{PaymentGateway, PaymentReceipt, SimulatedGateway};
pub use publisher::{EventPublisher, LogPublisher, NatsPublisher, PublishError};
