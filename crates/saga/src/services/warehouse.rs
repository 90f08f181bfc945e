//! Warehouse intake capability and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::OrderId;

use crate::error::AdapterError;

/// Trait for warehouse intake operations.
#[async_trait]
pub trait WarehouseService: Send + Sync {
    /// Tells the warehouse a package for this order is on its way.
    ///
    /// Returns the warehouse's acknowledgment text.
    async fn notify_warehouse(&self, order_id: OrderId) -> Result<String, AdapterError>;
}

#[derive(Debug, Default)]
struct InMemoryWarehouseState {
    notified: Vec<OrderId>,
    delays: HashMap<OrderId, Duration>,
    fail_on_notify: bool,
}

/// In-memory warehouse for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWarehouseService {
    state: Arc<RwLock<InMemoryWarehouseState>>,
}

impl InMemoryWarehouseService {
    /// Creates a new in-memory warehouse.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to fail every notify_warehouse call.
    pub fn set_fail_on_notify(&self, fail: bool) {
        self.state.write().unwrap().fail_on_notify = fail;
    }

    /// Holds back the answer for one order.
    pub fn set_delay(&self, order_id: OrderId, delay: Duration) {
        self.state.write().unwrap().delays.insert(order_id, delay);
    }

    /// Returns how many notify_warehouse calls were made, failed ones included.
    pub fn call_count(&self) -> usize {
        self.state.read().unwrap().notified.len()
    }

    /// Returns the notified orders in arrival order.
    pub fn notified(&self) -> Vec<OrderId> {
        self.state.read().unwrap().notified.clone()
    }
}

#[async_trait]
impl WarehouseService for InMemoryWarehouseService {
    async fn notify_warehouse(&self, order_id: OrderId) -> Result<String, AdapterError> {
        let (delay, fail) = {
            let mut state = self.state.write().unwrap();
            state.notified.push(order_id);
            (state.delays.get(&order_id).copied(), state.fail_on_notify)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if fail {
            return Err(AdapterError::Transport("Connection refused".to_string()));
        }

        Ok(format!("ACK:ORDER:{order_id}:RECEIVED"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_notify_returns_ack() {
        let service = InMemoryWarehouseService::new();
        let ack = service.notify_warehouse(OrderId::new(42)).await.unwrap();
        assert_eq!(ack, "ACK:ORDER:42:RECEIVED");
        assert_eq!(service.notified(), vec![OrderId::new(42)]);
    }

    #[tokio::test]
    async fn test_fail_on_notify() {
        let service = InMemoryWarehouseService::new();
        service.set_fail_on_notify(true);

        let result = service.notify_warehouse(OrderId::new(1)).await;
        assert!(matches!(result, Err(AdapterError::Transport(_))));
        assert_eq!(service.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_holds_back_answer() {
        let service = InMemoryWarehouseService::new();
        service.set_delay(OrderId::new(3), Duration::from_secs(5));

        let started = tokio::time::Instant::now();
        service.notify_warehouse(OrderId::new(3)).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(5));
    }
}
