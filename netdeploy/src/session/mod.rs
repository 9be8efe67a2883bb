//! Device session abstraction
//!
//! A session is a live or simulated connection handle to one remote device,
//! valid for the duration of one deployment attempt. The engine only ever
//! talks to sessions through these traits, so a deterministic fake can stand
//! in for a real backend.

pub mod simulated;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

use crate::vendor::VendorKind;

/// Default protocol timeout for deployment connections
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Parameters for opening a session to one device
#[derive(Debug, Clone)]
pub struct ConnectParams {
    /// Connect-handler family
    pub kind: VendorKind,

    /// Management address
    pub host: String,

    /// Management port
    pub port: u16,

    pub username: String,
    pub password: SecretString,

    /// Enable secret, if privileged mode must be entered
    pub enable_password: Option<SecretString>,

    /// Protocol timeout applied by the backend while connecting
    pub timeout: Duration,
}

/// Failure establishing a session
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("connection timed out")]
    Timeout,

    #[error("authentication rejected")]
    AuthFailed,

    #[error("{0}")]
    Other(String),
}

/// Failure on an established session (privilege, push, save, disconnect)
#[derive(Error, Debug)]
#[error("{0}")]
pub struct SessionError(pub String);

/// One connection to a device
#[async_trait]
pub trait DeviceSession: Send {
    /// Whether the session already runs in privileged mode
    async fn is_privileged(&mut self) -> bool;

    /// Enter privileged mode using the enable secret
    async fn enter_privileged(
        &mut self,
        enable_password: &SecretString,
    ) -> Result<(), SessionError>;

    /// Push configuration lines in order, returning the device output
    async fn push_config_lines(&mut self, lines: &[String]) -> Result<String, SessionError>;

    /// Run a single command, returning the device output
    async fn run_command(&mut self, command: &str) -> Result<String, SessionError>;

    /// Tear the connection down
    async fn disconnect(&mut self) -> Result<(), SessionError>;
}

/// Opens device sessions; the engine never constructs a concrete session itself
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Establish a session to one device
    async fn connect(&self, params: ConnectParams) -> Result<Box<dyn DeviceSession>, ConnectError>;

    /// Short backend name for logs
    fn backend_name(&self) -> &str;
}
