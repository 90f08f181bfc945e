//! Order management capability and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::error::AdapterError;

/// Answer to a successful order creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    /// Status text chosen by the order management system.
    pub status: String,
    /// Order number assigned by the order management system.
    pub order_id: i64,
}

/// Client record held by the order management system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub client_name: String,
    pub client_id: i64,
}

/// Trait for order management operations.
#[async_trait]
pub trait OrderCreationService: Send + Sync {
    /// Registers an order with the order management system.
    async fn create_order(
        &self,
        order_id: OrderId,
        details: &str,
    ) -> Result<OrderCreated, AdapterError>;

    /// Looks up a client record.
    async fn get_client_info(&self, client_id: i64) -> Result<ClientInfo, AdapterError>;
}

#[derive(Debug, Default)]
struct InMemoryOrderCreationState {
    created: Vec<(OrderId, String)>,
    fail_on_create: bool,
}

/// In-memory order management service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderCreationService {
    state: Arc<RwLock<InMemoryOrderCreationState>>,
}

impl InMemoryOrderCreationService {
    /// Creates a new in-memory order management service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to fail every create_order call.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create = fail;
    }

    /// Returns how many create_order calls were made, failed ones included.
    pub fn call_count(&self) -> usize {
        self.state.read().unwrap().created.len()
    }

    /// Returns the orders that were submitted, with their details.
    pub fn created_orders(&self) -> Vec<(OrderId, String)> {
        self.state.read().unwrap().created.clone()
    }
}

#[async_trait]
impl OrderCreationService for InMemoryOrderCreationService {
    async fn create_order(
        &self,
        order_id: OrderId,
        details: &str,
    ) -> Result<OrderCreated, AdapterError> {
        let mut state = self.state.write().unwrap();
        state.created.push((order_id, details.to_string()));

        if state.fail_on_create {
            return Err(AdapterError::Remote("Order management unavailable".to_string()));
        }

        Ok(OrderCreated {
            status: "OrderCreated".to_string(),
            order_id: order_id.value(),
        })
    }

    async fn get_client_info(&self, client_id: i64) -> Result<ClientInfo, AdapterError> {
        Ok(ClientInfo {
            client_name: "Client".to_string(),
            client_id,
        })
    }
}
