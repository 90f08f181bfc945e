//! REST client for the route optimization system (ROS).

use async_trait::async_trait;
use common::{DeliveryAddress, OrderId};
use saga::{AdapterError, RoutePlan, RouteService};
use serde::{Deserialize, Serialize};

/// An order to place on a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOrder {
    pub order_id: OrderId,
    pub address: String,
}

/// Body of `POST /optimizeRoute`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub orders: Vec<RouteOrder>,
    pub vehicles: Vec<String>,
}

/// Calls the route optimizer over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct RestRouteClient {
    http: reqwest::Client,
    url: String,
}

impl RestRouteClient {
    /// `url` is the full optimize endpoint, e.g. `http://localhost:3002/optimizeRoute`.
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl RouteService for RestRouteClient {
    #[tracing::instrument(skip(self, vehicles), fields(url = %self.url))]
    async fn optimize_route(
        &self,
        order_id: OrderId,
        address: &DeliveryAddress,
        vehicles: &[String],
    ) -> Result<RoutePlan, AdapterError> {
        let request = RouteRequest {
            orders: vec![RouteOrder {
                order_id,
                address: address.to_string(),
            }],
            vehicles: vehicles.to_vec(),
        };

        let response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(AdapterError::transport)?;

        let status = response.status();
        let body = response.text().await.map_err(AdapterError::transport)?;

        if !status.is_success() {
            return Err(AdapterError::Remote(format!("HTTP {status}: {body}")));
        }

        serde_json::from_str(&body).map_err(AdapterError::protocol)
    }
}
