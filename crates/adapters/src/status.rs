//! HTTP status reporter for the order service.

use async_trait::async_trait;
use common::{OrderId, OrderStatus};
use saga::{AdapterError, StatusReporter};
use serde::{Deserialize, Serialize};

/// Body of `PUT <base>/<orderId>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

/// Pushes status transitions with `PUT <base>/<orderId>`.
#[derive(Debug, Clone)]
pub struct HttpStatusReporter {
    http: reqwest::Client,
    base_url: String,
}

impl HttpStatusReporter {
    /// `base_url` is the update endpoint without the order id, e.g.
    /// `http://localhost:8083/api/order/updateStatus`.
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The URL a status for this order is sent to.
    pub fn url_for(&self, order_id: OrderId) -> String {
        format!("{}/{}", self.base_url, order_id)
    }
}

#[async_trait]
impl StatusReporter for HttpStatusReporter {
    #[tracing::instrument(skip(self))]
    async fn report_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), AdapterError> {
        let response = self
            .http
            .put(self.url_for(order_id))
            .json(&StatusUpdate { status })
            .send()
            .await
            .map_err(AdapterError::transport)?;

        let http_status = response.status();
        if !http_status.is_success() {
            return Err(AdapterError::Remote(format!("HTTP {http_status}")));
        }
        Ok(())
    }
}
