//! Orchestrator entry point.

use std::future::IntoFuture;
use std::sync::Arc;

use orchestrator::{Config, OrderConsumer};
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, shutting down");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, shutting down");
        }
    }
}

/// Resolves once the stop flag is raised or its sender is gone.
async fn stopped(mut stop: watch::Receiver<bool>) {
    let _ = stop.wait_for(|stop| *stop).await;
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    let coordinator = match orchestrator::build_coordinator(&config) {
        Ok(coordinator) => Arc::new(coordinator),
        Err(e) => {
            tracing::error!(error = %e, "failed to build downstream adapters");
            std::process::exit(1);
        }
    };

    let consumer = match OrderConsumer::connect(&config.broker).await {
        Ok(consumer) => consumer,
        Err(e) => {
            tracing::error!(error = %e, url = %config.broker.url, "cannot subscribe to order events");
            std::process::exit(1);
        }
    };

    let (stop_tx, stop_rx) = watch::channel(false);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    tracing::info!(%addr, "serving health and metrics");
    let app = orchestrator::create_app(metrics_handle);
    let server = tokio::spawn(
        axum::serve(listener, app)
            .with_graceful_shutdown(stopped(stop_rx.clone()))
            .into_future(),
    );

    let consuming = consumer.run(coordinator, config.max_in_flight, stopped(stop_rx));
    tokio::pin!(consuming);
    let finished_early = tokio::select! {
        result = &mut consuming => Some(result),
        () = shutdown_signal() => None,
    };
    let result = match finished_early {
        Some(result) => result,
        None => {
            stop_tx.send_replace(true);
            consuming.await
        }
    };
    stop_tx.send_replace(true);

    if let Err(e) = consumer.close().await {
        tracing::warn!(error = %e, "broker connection did not close cleanly");
    }
    match server.await {
        Ok(Err(e)) => tracing::error!(error = %e, "HTTP server failed"),
        Err(e) => tracing::error!(error = %e, "HTTP server task failed"),
        Ok(Ok(())) => {}
    }

    if let Err(e) = result {
        tracing::error!(error = %e, "order consumer stopped");
        std::process::exit(1);
    }
    tracing::info!("orchestrator shut down");
}
