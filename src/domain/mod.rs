//! Storefront domain: value objects, aggregates and the events they raise.
pub mod aggregates;
pub mod events;
pub mod validation;
pub mod value_objects;
