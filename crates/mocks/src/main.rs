//! Runs the mock CMS, ROS, WMS and order-status services side by side.

use std::net::SocketAddr;

use axum::Router;
use mocks::{OrderStatusRecorder, cms, ros, wms};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn port(var: &str, default: u16) -> u16 {
    std::env::var(var)
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(default)
}

async fn serve_http(name: &'static str, port: u16, router: Router) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "{name} mock listening");
    axum::serve(listener, router.layer(TraceLayer::new_for_http())).await
}

async fn serve_wms(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "WMS mock listening");
    wms::serve(listener).await
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let recorder = OrderStatusRecorder::new();

    let result = tokio::select! {
        r = serve_http("CMS", port("CMS_PORT", 3001), cms::router()) => r,
        r = serve_http("ROS", port("ROS_PORT", 3002), ros::router()) => r,
        r = serve_wms(port("WMS_PORT", 3003)) => r,
        r = serve_http("order status", port("STATUS_PORT", 8083), recorder.router()) => r,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received SIGINT, shutting down mocks");
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "mock server failed");
        std::process::exit(1);
    }
}
