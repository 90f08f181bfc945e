//! Application configuration loaded from environment variables.

use std::time::Duration;

use common::DeliveryAddress;
use saga::FulfillmentSettings;

/// Where order events come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    pub url: String,
    pub exchange: String,
    pub queue: String,
    pub routing_key: String,
    pub consumer_tag: String,
    /// Broker-side cap on unacknowledged deliveries; unset means no cap.
    pub prefetch: Option<u16>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: "amqp://localhost:5672/%2f".to_string(),
            exchange: "order-exchange".to_string(),
            queue: "order-queue".to_string(),
            routing_key: "order-routing-key".to_string(),
            consumer_tag: "orchestrator".to_string(),
            prefetch: None,
        }
    }
}

/// Addresses of the downstream systems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub cms_url: String,
    pub ros_url: String,
    pub wms_addr: String,
    pub status_url: String,
    /// Per-call limit applied to every adapter; unset means wait indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            cms_url: "http://localhost:3001/cms".to_string(),
            ros_url: "http://localhost:3002/optimizeRoute".to_string(),
            wms_addr: "localhost:3003".to_string(),
            status_url: "http://localhost:8083/api/order/updateStatus".to_string(),
            timeout: None,
        }
    }
}

/// Orchestrator configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `AMQP_URL`, `ORDER_EXCHANGE`, `ORDER_QUEUE`, `ORDER_ROUTING_KEY`,
///   `AMQP_CONSUMER_TAG`, `AMQP_PREFETCH`: broker subscription
/// - `MAX_IN_FLIGHT`: cap on concurrently processed messages (default: none)
/// - `CMS_URL`, `ROS_URL`, `WMS_ADDR`, `ORDER_STATUS_URL`: downstream systems
/// - `ADAPTER_TIMEOUT_SECS`: per-call adapter timeout (default: none)
/// - `DELIVERY_ADDRESS`, `FLEET_VEHICLES`, `ORDER_DETAILS`: saga inputs
/// - `HOST` / `PORT`: health and metrics listener (default: `0.0.0.0:3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub broker: BrokerConfig,
    pub endpoints: EndpointConfig,
    pub fulfillment: FulfillmentSettings,
    pub max_in_flight: Option<usize>,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary variable source.
    ///
    /// Unset, empty and unparsable values all fall back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let string = |key: &str, default: String| var(key).unwrap_or(default);
        let parsed = |key: &str| var(key).and_then(|v| v.trim().parse::<u64>().ok());

        let defaults = Self::default();
        let broker = defaults.broker;
        let endpoints = defaults.endpoints;
        let fulfillment = defaults.fulfillment;

        let vehicles: Vec<String> = var("FLEET_VEHICLES")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            broker: BrokerConfig {
                url: string("AMQP_URL", broker.url),
                exchange: string("ORDER_EXCHANGE", broker.exchange),
                queue: string("ORDER_QUEUE", broker.queue),
                routing_key: string("ORDER_ROUTING_KEY", broker.routing_key),
                consumer_tag: string("AMQP_CONSUMER_TAG", broker.consumer_tag),
                prefetch: parsed("AMQP_PREFETCH").and_then(|n| u16::try_from(n).ok()),
            },
            endpoints: EndpointConfig {
                cms_url: string("CMS_URL", endpoints.cms_url),
                ros_url: string("ROS_URL", endpoints.ros_url),
                wms_addr: string("WMS_ADDR", endpoints.wms_addr),
                status_url: string("ORDER_STATUS_URL", endpoints.status_url),
                timeout: parsed("ADAPTER_TIMEOUT_SECS")
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs),
            },
            fulfillment: FulfillmentSettings {
                order_details: string("ORDER_DETAILS", fulfillment.order_details),
                fallback_address: var("DELIVERY_ADDRESS")
                    .map(DeliveryAddress::new)
                    .unwrap_or(fulfillment.fallback_address),
                vehicles: if vehicles.is_empty() {
                    fulfillment.vehicles
                } else {
                    vehicles
                },
            },
            max_in_flight: parsed("MAX_IN_FLIGHT")
                .filter(|n| *n > 0)
                .and_then(|n| usize::try_from(n).ok()),
            host: string("HOST", defaults.host),
            port: parsed("PORT")
                .and_then(|p| u16::try_from(p).ok())
                .unwrap_or(defaults.port),
            log_level: string("RUST_LOG", defaults.log_level),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            broker: BrokerConfig::default(),
            endpoints: EndpointConfig::default(),
            fulfillment: FulfillmentSettings::default(),
            max_in_flight: None,
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
        }
    }
}
