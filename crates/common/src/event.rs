//! Queue payloads and order status values.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{DeliveryAddress, OrderId};

/// A message body that could not be decoded into an [`OrderEvent`].
///
/// Retrying will not fix a malformed body, so this is always permanent.
#[derive(Debug, Error)]
#[error("malformed order event: {source}")]
pub struct DecodeError {
    #[from]
    source: serde_json::Error,
}

/// An order that is ready to be fulfilled.
///
/// Publishers may attach extra fields (customer name, initial status);
/// those are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEvent {
    /// The order to fulfill.
    pub order_id: OrderId,

    /// Where the order goes. Older publishers do not send it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<DeliveryAddress>,
}

impl OrderEvent {
    pub fn new(order_id: impl Into<OrderId>) -> Self {
        Self {
            order_id: order_id.into(),
            delivery_address: None,
        }
    }

    pub fn with_delivery_address(mut self, address: impl Into<DeliveryAddress>) -> Self {
        self.delivery_address = Some(address.into());
        self
    }

    /// Decodes an event from a JSON message body.
    pub fn from_bytes(body: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Encodes the event as a JSON message body.
    pub fn to_bytes(&self) -> Vec<u8> {
        // A struct of an integer and an optional string always serializes.
        serde_json::to_vec(self).unwrap_or_default()
    }
}

/// Fulfillment status forwarded to the order service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// The order management system accepted the order.
    ProcessedByCms,
    /// A delivery route was planned.
    RouteOptimized,
    /// The warehouse acknowledged the package.
    PackageReceivedWms,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::ProcessedByCms => "PROCESSED_BY_CMS",
            OrderStatus::RouteOptimized => "ROUTE_OPTIMIZED",
            OrderStatus::PackageReceivedWms => "PACKAGE_RECEIVED_WMS",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
