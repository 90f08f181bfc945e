//! Shared types for the order fulfillment orchestrator.

pub mod event;
pub mod types;

pub use event::{DecodeError, OrderEvent, OrderStatus};
pub use types::{DeliveryAddress, OrderId, SagaId};
