//! Aggregates module
pub mod cart;
pub mod checkout;
pub mod order;

pub use cart::{Cart, CartLineItem, ItemId, ShadeAllocation};
pub use checkout::{Address, AddressForm, CheckoutSnapshot};
pub use order::{CardForm, Order, OrderError, OrderStatus, PaymentDetails, PaymentForm, PaymentMethod};
