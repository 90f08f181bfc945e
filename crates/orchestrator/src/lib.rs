//! Queue-driven order fulfillment orchestrator.
//!
//! Consumes order events from the broker, runs the fulfillment saga for each
//! one against the live downstream adapters, and exposes health and
//! Prometheus metrics over HTTP.

pub mod config;
pub mod consumer;
pub mod error;
pub mod routes;

use adapters::{
    HttpStatusReporter, RestRouteClient, SoapOrderCreationClient, TcpWarehouseClient,
};
use axum::Router;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{AdapterError, SagaCoordinator};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use consumer::{
    DispatchEnd, InboundMessage, OrderConsumer, Settlement, dispatch, handle_message,
};
pub use error::ConsumerError;

/// Coordinator wired to the real downstream systems.
pub type LiveCoordinator = SagaCoordinator<
    SoapOrderCreationClient,
    RestRouteClient,
    TcpWarehouseClient,
    HttpStatusReporter,
>;

/// Builds the coordinator from the configured endpoints.
pub fn build_coordinator(config: &Config) -> Result<LiveCoordinator, AdapterError> {
    let endpoints = &config.endpoints;
    let http = adapters::http_client(endpoints.timeout)?;

    Ok(SagaCoordinator::new(
        SoapOrderCreationClient::new(http.clone(), endpoints.cms_url.as_str()),
        RestRouteClient::new(http.clone(), endpoints.ros_url.as_str()),
        TcpWarehouseClient::new(endpoints.wms_addr.as_str()).with_timeout(endpoints.timeout),
        HttpStatusReporter::new(http, endpoints.status_url.as_str()),
        config.fulfillment.clone(),
    ))
}

/// Creates the router serving `/health` and `/metrics`.
pub fn create_app(metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .merge(metrics_router)
        .layer(TraceLayer::new_for_http())
}
