//! Recording stand-in for the order service's status endpoint.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use adapters::StatusUpdate;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::put;
use axum::{Json, Router};
use common::{OrderId, OrderStatus};

/// Base path status updates are sent to; the order id is appended.
pub const UPDATE_PATH: &str = "/api/order/updateStatus";

#[derive(Debug, Default)]
struct RecorderState {
    updates: Mutex<Vec<(OrderId, OrderStatus)>>,
    unavailable: AtomicBool,
}

/// Records every status update it receives, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct OrderStatusRecorder {
    state: Arc<RecorderState>,
}

impl OrderStatusRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Router serving `PUT /api/order/updateStatus/{order_id}`.
    pub fn router(&self) -> Router {
        Router::new()
            .route(&format!("{UPDATE_PATH}/{{order_id}}"), put(record))
            .with_state(self.clone())
    }

    /// Answers 503 to every update while set; nothing is recorded.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn updates(&self) -> Vec<(OrderId, OrderStatus)> {
        self.state.updates.lock().unwrap().clone()
    }

    pub fn updates_for(&self, order_id: OrderId) -> Vec<OrderStatus> {
        self.updates()
            .into_iter()
            .filter(|(id, _)| *id == order_id)
            .map(|(_, status)| status)
            .collect()
    }
}

async fn record(
    State(recorder): State<OrderStatusRecorder>,
    Path(order_id): Path<i64>,
    Json(update): Json<StatusUpdate>,
) -> StatusCode {
    if recorder.state.unavailable.load(Ordering::SeqCst) {
        return StatusCode::SERVICE_UNAVAILABLE;
    }

    let order_id = OrderId::new(order_id);
    tracing::info!(%order_id, status = %update.status, "order status updated");
    recorder
        .state
        .updates
        .lock()
        .unwrap()
        .push((order_id, update.status));
    StatusCode::OK
}
