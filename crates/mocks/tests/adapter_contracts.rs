//! Runs the real protocol adapters against the mock downstream systems.

use adapters::{
    HttpStatusReporter, RestRouteClient, SoapOrderCreationClient, TcpWarehouseClient, http_client,
};
use common::{DeliveryAddress, OrderId, OrderStatus};
use mocks::MockServices;
use saga::{
    AdapterError, OrderCreationService, RouteService, StatusReporter, WarehouseService,
};

async fn mocks() -> MockServices {
    MockServices::spawn().await.unwrap()
}

#[tokio::test]
async fn test_cms_create_order() {
    let services = mocks().await;
    let cms = SoapOrderCreationClient::new(http_client(None).unwrap(), &services.cms_url);

    let created = cms
        .create_order(OrderId::new(42), "Mock Details")
        .await
        .unwrap();

    assert_eq!(created.status, "OrderCreated");
    assert_eq!(created.order_id, 42);
}

#[tokio::test]
async fn test_cms_fault_is_remote_error() {
    let services = mocks().await;
    let cms = SoapOrderCreationClient::new(http_client(None).unwrap(), &services.cms_url);

    let err = cms
        .create_order(OrderId::new(0), "Mock Details")
        .await
        .unwrap_err();

    assert_eq!(err, AdapterError::Remote("Invalid clientId".to_string()));
}

#[tokio::test]
async fn test_cms_client_info() {
    let services = mocks().await;
    let cms = SoapOrderCreationClient::new(http_client(None).unwrap(), &services.cms_url);

    let info = cms.get_client_info(7).await.unwrap();

    assert_eq!(info.client_id, 7);
    assert_eq!(info.client_name, "Client");
}

#[tokio::test]
async fn test_ros_plan() {
    let services = mocks().await;
    let ros = RestRouteClient::new(http_client(None).unwrap(), &services.ros_url);
    let vehicles = vec!["Van1".to_string()];

    let plan = ros
        .optimize_route(
            OrderId::new(5),
            &DeliveryAddress::new("123 Main Street"),
            &vehicles,
        )
        .await
        .unwrap();
    let second = ros
        .optimize_route(
            OrderId::new(6),
            &DeliveryAddress::new("9 Side Road"),
            &vehicles,
        )
        .await
        .unwrap();

    assert_eq!(plan.route.len(), 1);
    assert_eq!(plan.route[0].order_id, OrderId::new(5));
    assert_eq!(plan.route[0].address, "123 Main Street");
    assert_eq!(plan.route[0].estimated_time, "10 mins");
    assert_eq!(second.route_id, plan.route_id + 1);
}

#[tokio::test]
async fn test_ros_wrong_path_is_remote_error() {
    let services = mocks().await;
    let url = services.ros_url.replace("/optimizeRoute", "/missing");
    let ros = RestRouteClient::new(http_client(None).unwrap(), url);

    let err = ros
        .optimize_route(OrderId::new(5), &DeliveryAddress::new("x"), &[])
        .await
        .unwrap_err();

    assert!(matches!(err, AdapterError::Remote(ref m) if m.starts_with("HTTP 404")));
}

#[tokio::test]
async fn test_wms_ack() {
    let services = mocks().await;
    let wms = TcpWarehouseClient::new(&services.wms_addr);

    let ack = wms.notify_warehouse(OrderId::new(42)).await.unwrap();

    assert_eq!(ack, "ACK:ORDER:42:RECEIVED");
}

#[tokio::test]
async fn test_wms_concurrent_connections() {
    let services = mocks().await;
    let wms = TcpWarehouseClient::new(&services.wms_addr);

    let (a, b) = tokio::join!(
        wms.notify_warehouse(OrderId::new(1)),
        wms.notify_warehouse(OrderId::new(2))
    );

    assert_eq!(a.unwrap(), "ACK:ORDER:1:RECEIVED");
    assert_eq!(b.unwrap(), "ACK:ORDER:2:RECEIVED");
}

#[tokio::test]
async fn test_status_reporter_put_recorded() {
    let services = mocks().await;
    let reporter = HttpStatusReporter::new(http_client(None).unwrap(), &services.status_url);

    reporter
        .report_status(OrderId::new(42), OrderStatus::ProcessedByCms)
        .await
        .unwrap();
    reporter
        .report_status(OrderId::new(42), OrderStatus::RouteOptimized)
        .await
        .unwrap();

    assert_eq!(
        services.recorder.updates_for(OrderId::new(42)),
        vec![OrderStatus::ProcessedByCms, OrderStatus::RouteOptimized]
    );
}

#[tokio::test]
async fn test_status_reporter_unavailable() {
    let services = mocks().await;
    services.recorder.set_unavailable(true);
    let reporter = HttpStatusReporter::new(http_client(None).unwrap(), &services.status_url);

    let err = reporter
        .report_status(OrderId::new(1), OrderStatus::PackageReceivedWms)
        .await
        .unwrap_err();

    assert!(matches!(err, AdapterError::Remote(_)));
    assert!(services.recorder.updates().is_empty());
}
