//! Mock downstream systems for local runs and end-to-end tests.
//!
//! - [`cms`]: SOAP order management on `POST /cms`
//! - [`ros`]: route optimization on `POST /optimizeRoute`
//! - [`wms`]: TCP warehouse intake answering `ACK:<frame>`
//! - [`order_status`]: recorder for `PUT /api/order/updateStatus/{id}`

pub mod cms;
pub mod order_status;
pub mod ros;
pub mod wms;

use std::io;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;

pub use order_status::OrderStatusRecorder;

/// Serves `router` on an ephemeral localhost port in the background.
pub async fn spawn_http(router: Router) -> io::Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!(%addr, error = %e, "mock HTTP server stopped");
        }
    });
    Ok(addr)
}

/// Serves the TCP warehouse on an ephemeral localhost port in the background.
pub async fn spawn_wms() -> io::Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = wms::serve(listener).await {
            tracing::error!(%addr, error = %e, "mock WMS stopped");
        }
    });
    Ok(addr)
}

/// All four downstream mocks running on ephemeral ports.
pub struct MockServices {
    pub cms_url: String,
    pub ros_url: String,
    pub wms_addr: String,
    pub status_url: String,
    pub recorder: OrderStatusRecorder,
}

impl MockServices {
    pub async fn spawn() -> io::Result<Self> {
        let recorder = OrderStatusRecorder::new();

        let cms = spawn_http(cms::router()).await?;
        let ros = spawn_http(ros::router()).await?;
        let status = spawn_http(recorder.router()).await?;
        let wms = spawn_wms().await?;

        Ok(Self {
            cms_url: format!("http://{cms}/cms"),
            ros_url: format!("http://{ros}/optimizeRoute"),
            wms_addr: wms.to_string(),
            status_url: format!("http://{status}{}", order_status::UPDATE_PATH),
            recorder,
        })
    }
}
