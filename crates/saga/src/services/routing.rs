//! Route optimization capability and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{DeliveryAddress, OrderId};
use serde::{Deserialize, Serialize};

use crate::error::AdapterError;

/// One stop on a planned route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStop {
    pub order_id: OrderId,
    pub address: String,
    /// Human readable arrival estimate, e.g. `"10 mins"`.
    pub estimated_time: String,
}

/// A route produced by the route optimizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlan {
    pub route_id: i64,
    pub route: Vec<RouteStop>,
}

/// Trait for route planning operations.
#[async_trait]
pub trait RouteService: Send + Sync {
    /// Plans a delivery route for an order.
    async fn optimize_route(
        &self,
        order_id: OrderId,
        address: &DeliveryAddress,
        vehicles: &[String],
    ) -> Result<RoutePlan, AdapterError>;
}

#[derive(Debug, Default)]
struct InMemoryRouteState {
    requests: Vec<(OrderId, DeliveryAddress, Vec<String>)>,
    next_id: i64,
    fail_on_optimize: bool,
}

/// In-memory route optimizer for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRouteService {
    state: Arc<RwLock<InMemoryRouteState>>,
}

impl InMemoryRouteService {
    /// Creates a new in-memory route optimizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to fail every optimize_route call.
    pub fn set_fail_on_optimize(&self, fail: bool) {
        self.state.write().unwrap().fail_on_optimize = fail;
    }

    /// Returns how many optimize_route calls were made, failed ones included.
    pub fn call_count(&self) -> usize {
        self.state.read().unwrap().requests.len()
    }

    /// Returns every request received, in arrival order.
    pub fn requests(&self) -> Vec<(OrderId, DeliveryAddress, Vec<String>)> {
        self.state.read().unwrap().requests.clone()
    }
}

#[async_trait]
impl RouteService for InMemoryRouteService {
    async fn optimize_route(
        &self,
        order_id: OrderId,
        address: &DeliveryAddress,
        vehicles: &[String],
    ) -> Result<RoutePlan, AdapterError> {
        let mut state = self.state.write().unwrap();
        state
            .requests
            .push((order_id, address.clone(), vehicles.to_vec()));

        if state.fail_on_optimize {
            return Err(AdapterError::Remote("No route available".to_string()));
        }

        state.next_id += 1;
        Ok(RoutePlan {
            route_id: state.next_id,
            route: vec![RouteStop {
                order_id,
                address: address.to_string(),
                estimated_time: "10 mins".to_string(),
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_optimize_route() {
        let service = InMemoryRouteService::new();
        let address = DeliveryAddress::new("123 Main Street");

        let plan = service
            .optimize_route(OrderId::new(42), &address, &["Van1".to_string()])
            .await
            .unwrap();

        assert_eq!(plan.route_id, 1);
        assert_eq!(plan.route.len(), 1);
        assert_eq!(plan.route[0].order_id, OrderId::new(42));
        assert_eq!(plan.route[0].address, "123 Main Street");
        assert_eq!(service.call_count(), 1);
    }

    #[tokio::test]
    async fn test_fail_on_optimize() {
        let service = InMemoryRouteService::new();
        service.set_fail_on_optimize(true);

        let result = service
            .optimize_route(OrderId::new(1), &DeliveryAddress::new("x"), &[])
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_route_plan_wire_shape() {
        let json = r#"{"routeId":77,"route":[{"orderId":42,"address":"123 Main Street","estimatedTime":"10 mins"}]}"#;
        let plan: RoutePlan = serde_json::from_str(json).unwrap();
        assert_eq!(plan.route_id, 77);
        assert_eq!(plan.route[0].estimated_time, "10 mins");
    }
}
