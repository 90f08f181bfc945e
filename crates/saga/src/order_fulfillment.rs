//! The fixed order fulfillment workflow.

use common::{DeliveryAddress, OrderStatus};
use serde::{Deserialize, Serialize};

/// The saga type identifier for order fulfillment.
pub const SAGA_TYPE: &str = "OrderFulfillment";

/// What happens to the rest of the saga when a step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Skip every later step and surface the failure.
    AbortRemaining,
    /// Log the failure and end the saga as if it had succeeded.
    Swallow,
}

/// One step of the order fulfillment saga, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaStep {
    /// Register the order with the order management system.
    CreateOrder,
    /// Plan a delivery route.
    OptimizeRoute,
    /// Hand the package over to the warehouse.
    NotifyWarehouse,
}

impl SagaStep {
    /// All steps in the order they run.
    pub const ALL: [SagaStep; 3] = [
        SagaStep::CreateOrder,
        SagaStep::OptimizeRoute,
        SagaStep::NotifyWarehouse,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SagaStep::CreateOrder => "create_order",
            SagaStep::OptimizeRoute => "optimize_route",
            SagaStep::NotifyWarehouse => "notify_warehouse",
        }
    }

    /// The status reported once this step succeeds.
    pub fn completion_status(&self) -> OrderStatus {
        match self {
            SagaStep::CreateOrder => OrderStatus::ProcessedByCms,
            SagaStep::OptimizeRoute => OrderStatus::RouteOptimized,
            SagaStep::NotifyWarehouse => OrderStatus::PackageReceivedWms,
        }
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        match self {
            SagaStep::CreateOrder | SagaStep::OptimizeRoute => FailurePolicy::AbortRemaining,
            SagaStep::NotifyWarehouse => FailurePolicy::Swallow,
        }
    }
}

impl std::fmt::Display for SagaStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Inputs the downstream systems need that queue events do not carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FulfillmentSettings {
    /// Free-text details sent with every order creation request.
    pub order_details: String,
    /// Used when an event has no delivery address of its own.
    pub fallback_address: DeliveryAddress,
    /// Vehicles offered to the route optimizer.
    pub vehicles: Vec<String>,
}

impl Default for FulfillmentSettings {
    fn default() -> Self {
        Self {
            order_details: "Mock Details".to_string(),
            fallback_address: DeliveryAddress::new("123 Main Street"),
            vehicles: vec!["Van1".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_run_in_declared_order() {
        let mut sorted = SagaStep::ALL;
        sorted.sort();
        assert_eq!(sorted, SagaStep::ALL);
    }

    #[test]
    fn completion_statuses() {
        let statuses: Vec<_> = SagaStep::ALL.iter().map(|s| s.completion_status()).collect();
        assert_eq!(
            statuses,
            vec![
                OrderStatus::ProcessedByCms,
                OrderStatus::RouteOptimized,
                OrderStatus::PackageReceivedWms,
            ]
        );
    }

    #[test]
    fn only_the_final_step_is_swallowed() {
        assert_eq!(
            SagaStep::CreateOrder.failure_policy(),
            FailurePolicy::AbortRemaining
        );
        assert_eq!(
            SagaStep::OptimizeRoute.failure_policy(),
            FailurePolicy::AbortRemaining
        );
        assert_eq!(
            SagaStep::NotifyWarehouse.failure_policy(),
            FailurePolicy::Swallow
        );
    }

    #[test]
    fn default_settings() {
        let settings = FulfillmentSettings::default();
        assert_eq!(settings.fallback_address.as_str(), "123 Main Street");
        assert_eq!(settings.vehicles, vec!["Van1"]);
        assert_eq!(settings.order_details, "Mock Details");
    }
}
