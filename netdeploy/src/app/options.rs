//! Application configuration options

use std::path::PathBuf;

use secrecy::SecretString;

use crate::deploy::engine::EngineOptions;
use crate::settings::Settings;

/// Command selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Command {
    /// Push the configuration payload to every inventory device
    #[default]
    Deploy,

    /// Reachability probe across the inventory
    Probe,

    /// Validate the configuration payload and exit
    Check,
}

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Selected command
    pub command: Command,

    /// Inventory CSV path
    pub inventory_path: PathBuf,

    /// Configuration payload path
    pub config_path: PathBuf,

    /// Results CSV path; no export when unset
    pub export_path: Option<PathBuf>,

    /// Vendor model profile name
    pub model: String,

    /// Run-level username, overrides per-device credentials
    pub username: Option<String>,

    /// Run-level password, overrides per-device credentials
    pub password: Option<SecretString>,

    /// Run-level enable secret
    pub enable_password: Option<SecretString>,

    /// Simulate deployments
    pub demo_mode: bool,

    /// Engine tuning
    pub engine: EngineOptions,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            command: Command::Deploy,
            inventory_path: PathBuf::new(),
            config_path: PathBuf::new(),
            export_path: None,
            model: Settings::default().default_model,
            username: None,
            password: None,
            enable_password: None,
            demo_mode: true,
            engine: EngineOptions::default(),
        }
    }
}
