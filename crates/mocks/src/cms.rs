//! Mock order management system speaking SOAP.

use adapters::SoapMessage;
use axum::Router;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::post;

/// Router serving `POST /cms`.
pub fn router() -> Router {
    Router::new().route("/cms", post(handle))
}

async fn handle(body: String) -> Response {
    let request = match SoapMessage::from_xml(&body) {
        Ok(request) => request,
        Err(e) => return fault(SoapMessage::fault("soap:Client", e)),
    };
    tracing::info!(operation = request.operation(), fields = ?request.fields(), "CMS request received");

    match answer(&request) {
        Ok(response) => xml(StatusCode::OK, response),
        Err(response) => fault(response),
    }
}

/// Builds the response for a request, or the fault to send instead.
fn answer(request: &SoapMessage) -> Result<SoapMessage, SoapMessage> {
    let response_name = match request.operation() {
        "createOrder" => "createOrderResponse",
        "getClientInfo" => "getClientInfoResponse",
        other => {
            return Err(SoapMessage::fault(
                "soap:Client",
                format!("Unknown operation {other}"),
            ));
        }
    };

    let client_id: i64 = request
        .parse_field("clientId")
        .map_err(|e| SoapMessage::fault("soap:Client", e))?;
    if client_id <= 0 {
        return Err(SoapMessage::fault("soap:Client", "Invalid clientId"));
    }

    let response = SoapMessage::new(response_name);
    Ok(match request.operation() {
        "createOrder" => response
            .with_field("status", "OrderCreated")
            .with_field("orderId", client_id),
        _ => response
            .with_field("clientName", "Client")
            .with_field("clientId", client_id),
    })
}

fn fault(message: SoapMessage) -> Response {
    xml(StatusCode::INTERNAL_SERVER_ERROR, message)
}

fn xml(status: StatusCode, message: SoapMessage) -> Response {
    (
        status,
        [(CONTENT_TYPE, "text/xml; charset=utf-8")],
        message.to_xml(),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn call(body: String) -> (StatusCode, SoapMessage) {
        let response = router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/cms")
                    .header("content-type", "text/xml")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let message = SoapMessage::from_xml(std::str::from_utf8(&bytes).unwrap()).unwrap();
        (status, message)
    }

    #[tokio::test]
    async fn test_create_order_echoes_client_id() {
        let request = SoapMessage::new("createOrder")
            .with_field("clientId", 42)
            .with_field("orderDetails", "Mock Details");

        let (status, response) = call(request.to_xml()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(response.operation(), "createOrderResponse");
        assert_eq!(response.field("status").unwrap(), "OrderCreated");
        assert_eq!(response.parse_field::<i64>("orderId").unwrap(), 42);
    }

    #[tokio::test]
    async fn test_get_client_info() {
        let request = SoapMessage::new("getClientInfo").with_field("clientId", 9);

        let (status, response) = call(request.to_xml()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(response.field("clientName").unwrap(), "Client");
        assert_eq!(response.parse_field::<i64>("clientId").unwrap(), 9);
    }

    #[tokio::test]
    async fn test_invalid_client_id_is_fault() {
        let request = SoapMessage::new("createOrder").with_field("clientId", 0);

        let (status, response) = call(request.to_xml()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.fault_message(), Some("Invalid clientId"));
    }

    #[tokio::test]
    async fn test_unknown_operation_is_fault() {
        let (status, response) = call(SoapMessage::new("deleteOrder").to_xml()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.is_fault());
    }

    #[tokio::test]
    async fn test_garbage_body_is_fault() {
        let (status, response) = call("<not-soap/>".to_string()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.is_fault());
    }
}
