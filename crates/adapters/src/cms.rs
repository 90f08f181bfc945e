//! SOAP client for the order management system (CMS).

use async_trait::async_trait;
use common::OrderId;
use reqwest::header::CONTENT_TYPE;
use saga::{AdapterError, ClientInfo, OrderCreated, OrderCreationService};

use crate::soap::{CMS_NS, SoapMessage};

/// Calls the order management system over SOAP 1.1.
#[derive(Debug, Clone)]
pub struct SoapOrderCreationClient {
    http: reqwest::Client,
    endpoint: String,
}

impl SoapOrderCreationClient {
    /// `endpoint` is the SOAP service URL, e.g. `http://localhost:3001/cms`.
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    /// Sends one operation and returns the matching `<operation>Response`.
    async fn call(&self, request: SoapMessage) -> Result<SoapMessage, AdapterError> {
        let operation = request.operation().to_string();

        let response = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", format!("{CMS_NS}/{operation}"))
            .body(request.to_xml())
            .send()
            .await
            .map_err(AdapterError::transport)?;

        let http_status = response.status();
        let body = response.text().await.map_err(AdapterError::transport)?;

        // Faults arrive with a 500, so read the body before judging the status.
        let message = match SoapMessage::from_xml(&body) {
            Ok(message) => message,
            Err(_) if !http_status.is_success() => {
                return Err(AdapterError::Remote(format!("HTTP {http_status}")));
            }
            Err(e) => return Err(AdapterError::protocol(e)),
        };

        if message.is_fault() {
            return Err(AdapterError::Remote(
                message
                    .fault_message()
                    .unwrap_or("unspecified SOAP fault")
                    .to_string(),
            ));
        }
        if !http_status.is_success() {
            return Err(AdapterError::Remote(format!("HTTP {http_status}")));
        }

        let expected = format!("{operation}Response");
        if message.operation() != expected {
            return Err(AdapterError::Protocol(format!(
                "expected {expected}, got {}",
                message.operation()
            )));
        }

        Ok(message)
    }
}

#[async_trait]
impl OrderCreationService for SoapOrderCreationClient {
    #[tracing::instrument(skip(self, details), fields(endpoint = %self.endpoint))]
    async fn create_order(
        &self,
        order_id: OrderId,
        details: &str,
    ) -> Result<OrderCreated, AdapterError> {
        let request = SoapMessage::new("createOrder")
            .with_field("clientId", order_id)
            .with_field("orderDetails", details);

        let response = self.call(request).await?;

        Ok(OrderCreated {
            status: response
                .field("status")
                .map_err(AdapterError::protocol)?
                .to_string(),
            order_id: response
                .parse_field("orderId")
                .map_err(AdapterError::protocol)?,
        })
    }

    #[tracing::instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn get_client_info(&self, client_id: i64) -> Result<ClientInfo, AdapterError> {
        let request = SoapMessage::new("getClientInfo").with_field("clientId", client_id);

        let response = self.call(request).await?;

        Ok(ClientInfo {
            client_name: response
                .field("clientName")
                .map_err(AdapterError::protocol)?
                .to_string(),
            client_id: response
                .parse_field("clientId")
                .map_err(AdapterError::protocol)?,
        })
    }
}
