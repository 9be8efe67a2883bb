//! Device reachability probing
//!
//! Probes run independently of any deployment run: a protocol handshake is
//! attempted when a live backend exists, falling back to pure async TCP
//! connect checks. No external binaries (nmap, ping) are required, and
//! concurrency is bounded by a semaphore to avoid flooding the network
//! interface.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::models::device::DeviceRecord;
use crate::session::{ConnectParams, SessionFactory};
use crate::vendor::{self, VendorKind};

/// Fallback ports probed when the handshake is unavailable or fails
const FALLBACK_PORTS: &[u16] = &[22, 443, 80];

/// Max concurrent probes
const MAX_CONCURRENT: usize = 16;

/// Per-connect timeout for the TCP fallback
const TCP_TIMEOUT_MS: u64 = 500;

/// Protocol timeout for the handshake attempt
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// How a device answered a probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// The session backend completed a handshake and disconnected
    Session,

    /// A TCP port accepted a connection; login-level access unverified
    Tcp(u16),

    /// Nothing answered
    Unreachable,
}

impl ProbeOutcome {
    pub fn is_reachable(&self) -> bool {
        !matches!(self, ProbeOutcome::Unreachable)
    }
}

/// Probe one device. Never touches deployment run state.
pub async fn probe_device(
    device: &DeviceRecord,
    live: Option<&Arc<dyn SessionFactory>>,
) -> ProbeOutcome {
    if let Some(factory) = live {
        debug!("Testing session connectivity to {}...", device.address);
        let kind = device
            .model
            .as_deref()
            .and_then(vendor::lookup)
            .map(|profile| profile.kind)
            .unwrap_or(VendorKind::CiscoIos);
        let params = ConnectParams {
            kind,
            host: device.address.clone(),
            port: device.port,
            username: device
                .credentials
                .username
                .clone()
                .unwrap_or_else(|| "admin".to_string()),
            password: device
                .credentials
                .password
                .clone()
                .unwrap_or_else(|| SecretString::from("")),
            enable_password: None,
            timeout: HANDSHAKE_TIMEOUT,
        };

        match factory.connect(params).await {
            Ok(mut session) => {
                let _ = session.disconnect().await;
                info!("Session handshake with {} succeeded", device.hostname);
                return ProbeOutcome::Session;
            }
            Err(e) => {
                debug!("Session probe of {} failed: {}", device.hostname, e);
            }
        }
    }

    // TCP fallback: the device port first, then common management ports
    let timeout = Duration::from_millis(TCP_TIMEOUT_MS);
    let mut ports = vec![device.port];
    ports.extend(FALLBACK_PORTS.iter().copied().filter(|p| *p != device.port));

    for port in ports {
        let attempt = TcpStream::connect((device.address.as_str(), port));
        if let Ok(Ok(_)) = tokio::time::timeout(timeout, attempt).await {
            info!("{} answers on tcp/{}", device.hostname, port);
            return ProbeOutcome::Tcp(port);
        }
    }

    warn!("{} is not reachable", device.hostname);
    ProbeOutcome::Unreachable
}

/// Probe every device concurrently, bounded by a semaphore.
///
/// Outcomes are collected as `(device id, outcome)` pairs; devices share no
/// state with each other or with any active run.
pub async fn probe_inventory(
    devices: &[DeviceRecord],
    live: Option<Arc<dyn SessionFactory>>,
) -> Vec<(u32, ProbeOutcome)> {
    info!("Probing {} devices", devices.len());

    let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT));
    let mut handles = Vec::with_capacity(devices.len());

    for device in devices {
        let sem = Arc::clone(&semaphore);
        let live = live.clone();
        let device = device.clone();
        handles.push(tokio::spawn(async move {
            let _permit = sem.acquire().await.ok()?;
            Some((device.id, probe_device(&device, live.as_ref()).await))
        }));
    }

    let mut outcomes = Vec::new();
    for handle in handles {
        if let Ok(Some(outcome)) = handle.await {
            outcomes.push(outcome);
        }
    }

    info!(
        "Probe complete: {} of {} reachable",
        outcomes.iter().filter(|(_, o)| o.is_reachable()).count(),
        devices.len()
    );
    outcomes
}
