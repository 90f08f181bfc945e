//! Raw TCP client for the warehouse management system (WMS).
//!
//! Wire format: the client sends `ORDER:<orderId>:RECEIVED` and the warehouse
//! answers `ACK:<request>`. One request and one answer per connection.

use std::time::Duration;

use async_trait::async_trait;
use common::OrderId;
use saga::{AdapterError, WarehouseService};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// The intake frame for an order.
pub fn request_frame(order_id: OrderId) -> String {
    format!("ORDER:{order_id}:RECEIVED")
}

/// The acknowledgment the warehouse sends back for a frame.
pub fn ack_frame(request: &str) -> String {
    format!("ACK:{request}")
}

/// Notifies the warehouse over a fresh TCP connection per call.
#[derive(Debug, Clone)]
pub struct TcpWarehouseClient {
    addr: String,
    timeout: Option<Duration>,
}

impl TcpWarehouseClient {
    /// `addr` is a `host:port` pair.
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            timeout: None,
        }
    }

    /// Bounds the whole exchange, connect included.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    async fn exchange(&self, frame: &str) -> Result<String, AdapterError> {
        let mut stream = TcpStream::connect(&self.addr)
            .await
            .map_err(AdapterError::transport)?;
        stream
            .write_all(frame.as_bytes())
            .await
            .map_err(AdapterError::transport)?;

        let expected = ack_frame(frame);
        let mut received: Vec<u8> = Vec::with_capacity(expected.len());
        let mut buf = [0u8; 512];

        // Stop at the first byte that cannot belong to the expected answer.
        while received.len() < expected.len() {
            let n = stream
                .read(&mut buf)
                .await
                .map_err(AdapterError::transport)?;
            if n == 0 {
                break;
            }
            received.extend_from_slice(&buf[..n]);
            if !expected.as_bytes().starts_with(&received) {
                break;
            }
        }
        drop(stream);

        if received.is_empty() {
            return Err(AdapterError::Transport(
                "connection closed before acknowledgment".to_string(),
            ));
        }
        let answer = String::from_utf8(received).map_err(AdapterError::protocol)?;
        if answer != expected {
            return Err(AdapterError::Protocol(format!(
                "unexpected acknowledgment '{answer}'"
            )));
        }

        Ok(answer)
    }
}

#[async_trait]
impl WarehouseService for TcpWarehouseClient {
    #[tracing::instrument(skip(self), fields(addr = %self.addr))]
    async fn notify_warehouse(&self, order_id: OrderId) -> Result<String, AdapterError> {
        let frame = request_frame(order_id);

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.exchange(&frame))
                .await
                .map_err(|_| {
                    AdapterError::Transport(format!("no acknowledgment within {limit:?}"))
                })?,
            None => self.exchange(&frame).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// Accepts one connection, reads a chunk and answers with `reply(chunk)`.
    async fn one_shot_server<F>(reply: F) -> String
    where
        F: FnOnce(&str) -> Option<String> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 256];
            let n = socket.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            if let Some(answer) = reply(&request) {
                socket.write_all(answer.as_bytes()).await.unwrap();
            }
        });

        addr
    }

    #[test]
    fn frames() {
        assert_eq!(request_frame(OrderId::new(42)), "ORDER:42:RECEIVED");
        assert_eq!(ack_frame("ORDER:42:RECEIVED"), "ACK:ORDER:42:RECEIVED");
    }

    #[tokio::test]
    async fn test_acknowledged() {
        let addr = one_shot_server(|request| Some(ack_frame(request))).await;
        let client = TcpWarehouseClient::new(addr);

        let ack = client.notify_warehouse(OrderId::new(42)).await.unwrap();
        assert_eq!(ack, "ACK:ORDER:42:RECEIVED");
    }

    #[tokio::test]
    async fn test_split_acknowledgment_is_reassembled() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 256];
            let _ = socket.read(&mut buf).await.unwrap();
            socket.write_all(b"ACK:ORD").await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            socket.write_all(b"ER:7:RECEIVED").await.unwrap();
        });

        let ack = TcpWarehouseClient::new(addr)
            .notify_warehouse(OrderId::new(7))
            .await
            .unwrap();
        assert_eq!(ack, "ACK:ORDER:7:RECEIVED");
    }

    #[tokio::test]
    async fn test_unexpected_answer_is_protocol_error() {
        let addr = one_shot_server(|_| Some("NAK:busy".to_string())).await;

        let result = TcpWarehouseClient::new(addr)
            .notify_warehouse(OrderId::new(1))
            .await;
        assert!(matches!(result, Err(AdapterError::Protocol(_))));
    }

    #[tokio::test]
    async fn test_closed_without_answer_is_transport_error() {
        let addr = one_shot_server(|_| None).await;

        let result = TcpWarehouseClient::new(addr)
            .notify_warehouse(OrderId::new(1))
            .await;
        assert!(matches!(result, Err(AdapterError::Transport(_))));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let result = TcpWarehouseClient::new(addr)
            .notify_warehouse(OrderId::new(1))
            .await;
        assert!(matches!(result, Err(AdapterError::Transport(_))));
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let result = TcpWarehouseClient::new(addr)
            .with_timeout(Some(Duration::from_millis(50)))
            .notify_warehouse(OrderId::new(1))
            .await;
        assert!(matches!(result, Err(AdapterError::Transport(ref msg)) if msg.contains("within")));
    }
}
