//! Order status reporting capability and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{OrderId, OrderStatus};

use crate::error::AdapterError;

/// Pushes status transitions to the order service.
///
/// Delivery is best effort: the coordinator logs failures and carries on.
#[async_trait]
pub trait StatusReporter: Send + Sync {
    async fn report_status(&self, order_id: OrderId, status: OrderStatus)
    -> Result<(), AdapterError>;
}

#[derive(Debug, Default)]
struct InMemoryStatusState {
    reports: Vec<(OrderId, OrderStatus)>,
    fail_on_report: bool,
}

/// In-memory status reporter for testing.
///
/// Records every report, including ones it was told to fail.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStatusReporter {
    state: Arc<RwLock<InMemoryStatusState>>,
}

impl InMemoryStatusReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_on_report(&self, fail: bool) {
        self.state.write().unwrap().fail_on_report = fail;
    }

    /// All reports in arrival order.
    pub fn reports(&self) -> Vec<(OrderId, OrderStatus)> {
        self.state.read().unwrap().reports.clone()
    }

    /// Reports for one order in arrival order.
    pub fn reports_for(&self, order_id: OrderId) -> Vec<OrderStatus> {
        self.state
            .read()
            .unwrap()
            .reports
            .iter()
            .filter(|(id, _)| *id == order_id)
            .map(|(_, status)| *status)
            .collect()
    }
}

#[async_trait]
impl StatusReporter for InMemoryStatusReporter {
    async fn report_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), AdapterError> {
        let mut state = self.state.write().unwrap();
        state.reports.push((order_id, status));

        if state.fail_on_report {
            return Err(AdapterError::Transport("Order service unreachable".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reports_are_recorded_per_order() {
        let reporter = InMemoryStatusReporter::new();
        reporter
            .report_status(OrderId::new(1), OrderStatus::ProcessedByCms)
            .await
            .unwrap();
        reporter
            .report_status(OrderId::new(2), OrderStatus::ProcessedByCms)
            .await
            .unwrap();
        reporter
            .report_status(OrderId::new(1), OrderStatus::RouteOptimized)
            .await
            .unwrap();

        assert_eq!(reporter.reports().len(), 3);
        assert_eq!(
            reporter.reports_for(OrderId::new(1)),
            vec![OrderStatus::ProcessedByCms, OrderStatus::RouteOptimized]
        );
    }

    #[tokio::test]
    async fn test_fail_on_report_still_records() {
        let reporter = InMemoryStatusReporter::new();
        reporter.set_fail_on_report(true);

        let result = reporter
            .report_status(OrderId::new(1), OrderStatus::ProcessedByCms)
            .await;
        assert!(result.is_err());
        assert_eq!(reporter.reports().len(), 1);
    }
}
