//! Mock route optimization system.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use adapters::RouteRequest;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use saga::{RoutePlan, RouteStop};

#[derive(Debug, Clone, Default)]
struct RosState {
    last_route_id: Arc<AtomicI64>,
}

/// Router serving `POST /optimizeRoute`.
pub fn router() -> Router {
    Router::new()
        .route("/optimizeRoute", post(optimize))
        .with_state(RosState::default())
}

/// Stop `i` on the route is estimated at `10 + 5 * i` minutes.
async fn optimize(
    State(state): State<RosState>,
    Json(request): Json<RouteRequest>,
) -> Result<Json<RoutePlan>, (StatusCode, Json<serde_json::Value>)> {
    tracing::info!(orders = request.orders.len(), vehicles = ?request.vehicles, "ROS request received");

    if request.orders.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "no orders to route" })),
        ));
    }

    let route = request
        .orders
        .into_iter()
        .enumerate()
        .map(|(index, order)| RouteStop {
            order_id: order.order_id,
            address: order.address,
            estimated_time: format!("{} mins", 10 + index * 5),
        })
        .collect();
    let route_id = state.last_route_id.fetch_add(1, Ordering::Relaxed) + 1;

    Ok(Json(RoutePlan { route_id, route }))
}
