//! Device inventory models

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::errors::EngineError;

/// Default management port for SSH-reachable devices
pub const DEFAULT_PORT: u16 = 22;

/// Deployment status of a single device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    /// Loaded and waiting for a run
    #[default]
    Ready,

    /// Deployment attempt currently in flight
    InProgress,

    /// Last deployment attempt succeeded
    Success,

    /// Last deployment attempt failed
    Failed,
}

impl DeviceStatus {
    /// Display form used in run output and result exports
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Ready => "Ready",
            DeviceStatus::InProgress => "In Progress",
            DeviceStatus::Success => "Success",
            DeviceStatus::Failed => "Failed",
        }
    }
}

/// Login material for one device.
///
/// Any empty field falls back to the run-level defaults, and past those to
/// the vendor profile defaults, when connection parameters are resolved.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub enable_password: Option<SecretString>,
}

impl Credentials {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none() && self.enable_password.is_none()
    }
}

/// One target device loaded from inventory or added by hand
#[derive(Debug, Clone)]
pub struct DeviceRecord {
    /// Sequence-assigned identifier, stable for the lifetime of a loaded inventory
    pub id: u32,

    /// Management address, never empty
    pub address: String,

    /// Display hostname, synthesized from the inventory position when absent
    pub hostname: String,

    /// Vendor model display name resolving into the profile registry
    pub model: Option<String>,

    /// Per-device credential overrides
    pub credentials: Credentials,

    /// Management port
    pub port: u16,

    /// Deployment status, written only by the engine during a run
    pub status: DeviceStatus,
}

impl DeviceRecord {
    /// Create a device record with a synthesized `Device_<id>` hostname.
    ///
    /// Fails when `address` is empty after trimming.
    pub fn new(id: u32, address: &str) -> Result<Self, EngineError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(EngineError::ValidationError(format!(
                "device {} has an empty address",
                id
            )));
        }
        Ok(Self {
            id,
            address: address.to_string(),
            hostname: format!("Device_{}", id),
            model: None,
            credentials: Credentials::default(),
            port: DEFAULT_PORT,
            status: DeviceStatus::Ready,
        })
    }

    pub fn with_hostname(mut self, hostname: &str) -> Self {
        let hostname = hostname.trim();
        if !hostname.is_empty() {
            self.hostname = hostname.to_string();
        }
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        let model = model.trim();
        if !model.is_empty() {
            self.model = Some(model.to_string());
        }
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}
