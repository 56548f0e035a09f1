//! End-to-end hub tests against a mocked PETLIBRO cloud

use std::sync::Arc;
use std::time::Duration;

use mockito::{Server, ServerGuard};
use serde_json::json;

use petlibro_api::PetLibroApi;
use petlibro_core::{CoordinatorMessage, DeviceKind, PetLibroHub, UpdateCoordinator};

async fn mock_cloud() -> (ServerGuard, Arc<PetLibroApi>) {
    let mut server = Server::new_async().await;

    server
        .mock("POST", "/member/auth/login")
        .with_status(200)
        .with_body(json!({"code": 0, "data": {"token": "tok"}}).to_string())
        .create_async()
        .await;
    server
        .mock("POST", "/device/device/list")
        .with_status(200)
        .with_body(
            json!({"code": 0, "data": [
                {
                    "deviceSn": "GSF42",
                    "productName": "Granary Smart Feeder",
                    "name": "Kitchen",
                },
                {
                    "deviceSn": "X1",
                    "productName": "Smart Toaster",
                },
            ]})
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("POST", "/device/device/baseInfo")
        .with_status(200)
        .with_body(
            json!({"code": 0, "data": {
                "deviceSn": "GSF42",
                "softwareVersion": "2.1.0",
                "mac": "AA:BB:CC:00:11:22",
            }})
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("POST", "/device/device/realInfo")
        .with_status(200)
        .with_body(
            json!({"code": 0, "data": {
                "online": true,
                "electricQuantity": 90,
                "surplusGrain": true,
            }})
            .to_string(),
        )
        // optional so later mocks for the same route take priority
        .expect_at_least(0)
        .create_async()
        .await;
    server
        .mock("POST", "/device/setting/getAttributeSetting")
        .with_status(200)
        .with_body(json!({"code": 0, "data": {"enableFeedingPlan": true}}).to_string())
        .create_async()
        .await;

    let api = Arc::new(PetLibroApi::with_base_url(server.url()).unwrap());
    api.login("user@example.com", "digest").await.unwrap();
    (server, api)
}

#[tokio::test]
async fn test_load_devices_skips_unsupported_products() {
    let (_server, api) = mock_cloud().await;

    let hub = PetLibroHub::new(api);
    hub.load_devices().await.unwrap();

    let devices = hub.devices();
    assert_eq!(devices.len(), 1);
    let device = hub.device("GSF42").unwrap();
    assert_eq!(device.kind(), DeviceKind::GranarySmartFeeder);
    assert_eq!(device.name(), "Kitchen");
    assert!(hub.device("X1").is_none());
}

#[tokio::test]
async fn test_refresh_merges_all_payloads() {
    let (_server, api) = mock_cloud().await;

    let hub = PetLibroHub::new(api);
    hub.load_devices().await.unwrap();
    assert!(hub.refresh_devices().await);

    let device = hub.device("GSF42").unwrap();
    assert_eq!(device.online(), Some(true));
    assert_eq!(device.electric_quantity(), Some(90));
    assert_eq!(device.food_low(), Some(false));
    assert_eq!(device.feeding_plan_state(), Some(true));
    assert_eq!(device.software_version().as_deref(), Some("2.1.0"));
    // the list payload survives the merge
    assert_eq!(device.name(), "Kitchen");
}

#[tokio::test]
async fn test_refresh_interleaves_with_rediscovery() {
    let (mut server, api) = mock_cloud().await;

    let hub = PetLibroHub::new(api);
    hub.load_devices().await.unwrap();

    // rediscovery now returns one extra appliance, forcing an insert while
    // the refresh cycle is mid-flight
    server
        .mock("POST", "/device/device/list")
        .with_status(200)
        .with_body(
            json!({"code": 0, "data": [
                {
                    "deviceSn": "GSF42",
                    "productName": "Granary Smart Feeder",
                    "name": "Kitchen",
                },
                {
                    "deviceSn": "GSF43",
                    "productName": "Granary Smart Feeder",
                    "name": "Pantry",
                },
            ]})
            .to_string(),
        )
        .create_async()
        .await;

    let (ok, loaded) = tokio::join!(hub.refresh_devices(), hub.load_devices());
    assert!(ok);
    loaded.unwrap();
    assert_eq!(hub.devices().len(), 2);
    assert!(hub.device("GSF43").is_some());
}

#[tokio::test]
async fn test_coordinator_broadcasts_update() {
    let (_server, api) = mock_cloud().await;

    let hub = Arc::new(PetLibroHub::new(api));
    hub.load_devices().await.unwrap();

    let coordinator = UpdateCoordinator::new(hub, Duration::from_secs(60));
    let mut rx = coordinator.subscribe();
    coordinator.refresh().await;

    assert_eq!(rx.recv().await.unwrap(), CoordinatorMessage::Updated);
    assert!(coordinator.last_update_success());
}

#[tokio::test]
async fn test_coordinator_reports_failure() {
    let (mut server, api) = mock_cloud().await;

    let hub = Arc::new(PetLibroHub::new(api));
    hub.load_devices().await.unwrap();

    // newer mocks shadow the healthy realInfo answer
    server
        .mock("POST", "/device/device/realInfo")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let coordinator = UpdateCoordinator::new(hub, Duration::from_secs(60));
    let mut rx = coordinator.subscribe();
    coordinator.refresh().await;

    assert_eq!(rx.recv().await.unwrap(), CoordinatorMessage::UpdateFailed);
    assert!(!coordinator.last_update_success());
}
