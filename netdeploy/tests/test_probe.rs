//! Reachability probe tests

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use netdeploy::models::device::DeviceRecord;
use netdeploy::probe::{self, ProbeOutcome};
use netdeploy::session::simulated::{SimulatedSessionFactory, SimulatorOptions};
use netdeploy::session::SessionFactory;

fn simulator(success_rate: f64) -> Arc<dyn SessionFactory> {
    Arc::new(SimulatedSessionFactory::new(SimulatorOptions {
        min_delay: Duration::ZERO,
        max_delay: Duration::from_millis(1),
        success_rate,
        seed: Some(7),
    }))
}

#[tokio::test]
async fn test_probe_finds_open_device_port() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let device = DeviceRecord::new(1, "127.0.0.1").unwrap().with_port(port);
    let outcome = probe::probe_device(&device, None).await;

    assert_eq!(outcome, ProbeOutcome::Tcp(port));
    assert!(outcome.is_reachable());
}

#[tokio::test]
async fn test_probe_reports_unresolvable_address_unreachable() {
    // The .invalid TLD never resolves, so every connect attempt fails fast
    let device = DeviceRecord::new(1, "switch.invalid").unwrap();
    let outcome = probe::probe_device(&device, None).await;

    assert_eq!(outcome, ProbeOutcome::Unreachable);
    assert!(!outcome.is_reachable());
}

#[tokio::test]
async fn test_probe_prefers_session_handshake() {
    // Address would never answer; a successful handshake settles it first
    let factory = simulator(1.0);
    let device = DeviceRecord::new(1, "switch.invalid").unwrap();
    let outcome = probe::probe_device(&device, Some(&factory)).await;

    assert_eq!(outcome, ProbeOutcome::Session);
}

#[tokio::test]
async fn test_failed_handshake_falls_back_to_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let factory = simulator(0.0);
    let device = DeviceRecord::new(1, "127.0.0.1").unwrap().with_port(port);
    let outcome = probe::probe_device(&device, Some(&factory)).await;

    assert_eq!(outcome, ProbeOutcome::Tcp(port));
}

#[tokio::test]
async fn test_probe_inventory_reports_per_device() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let devices = vec![
        DeviceRecord::new(1, "127.0.0.1").unwrap().with_port(port),
        DeviceRecord::new(2, "switch.invalid").unwrap(),
    ];
    let outcomes = probe::probe_inventory(&devices, None).await;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0], (1, ProbeOutcome::Tcp(port)));
    assert_eq!(outcomes[1], (2, ProbeOutcome::Unreachable));
}
