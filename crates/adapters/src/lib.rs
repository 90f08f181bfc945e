//! Protocol adapters for the fulfillment downstream systems.
//!
//! Each adapter implements one of the saga's capability traits:
//! - [`SoapOrderCreationClient`]: order management over SOAP
//! - [`RestRouteClient`]: route optimization over HTTP/JSON
//! - [`TcpWarehouseClient`]: warehouse intake over raw TCP
//! - [`HttpStatusReporter`]: status updates to the order service

pub mod cms;
pub mod ros;
pub mod soap;
pub mod status;
pub mod wms;

use std::time::Duration;

use saga::AdapterError;

pub use cms::SoapOrderCreationClient;
pub use ros::{RestRouteClient, RouteOrder, RouteRequest};
pub use soap::{SoapError, SoapMessage};
pub use status::{HttpStatusReporter, StatusUpdate};
pub use wms::TcpWarehouseClient;

/// Builds the HTTP client shared by the HTTP based adapters.
///
/// Idle connections are not kept, so every call opens its own connection.
pub fn http_client(timeout: Option<Duration>) -> Result<reqwest::Client, AdapterError> {
    let mut builder = reqwest::Client::builder().pool_max_idle_per_host(0);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(AdapterError::transport)
}
