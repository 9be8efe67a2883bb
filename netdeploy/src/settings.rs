//! Settings file management

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::EngineError;
use crate::logs::LogLevel;

/// Tool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Simulate deployments instead of touching devices
    #[serde(default = "default_true")]
    pub demo_mode: bool,

    /// Device model assumed when the inventory row has none
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Deployment timing
    #[serde(default)]
    pub deploy: DeploySettings,

    /// Directory for log files; stdout only when absent
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Directory results are exported into
    #[serde(default)]
    pub export_dir: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_model() -> String {
    "Cisco Catalyst 9300".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            demo_mode: true,
            default_model: default_model(),
            deploy: DeploySettings::default(),
            log_dir: None,
            export_dir: None,
        }
    }
}

/// Deployment timing settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeploySettings {
    /// Per-device connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Pause between consecutive devices in milliseconds
    #[serde(default = "default_inter_device_delay")]
    pub inter_device_delay_ms: u64,
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_inter_device_delay() -> u64 {
    500
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            inter_device_delay_ms: 500,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file.
    ///
    /// A missing file yields defaults; a file that exists but does not
    /// parse is an error.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(EngineError::IoError(e)),
        };

        let settings: Settings = serde_json::from_str(&text)?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Write settings to a JSON file.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        let text = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path.as_ref(), text).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let settings: Settings = serde_json::from_str(r#"{"demo_mode": false}"#).unwrap();
        assert!(!settings.demo_mode);
        assert_eq!(settings.log_level, LogLevel::Info);
        assert_eq!(settings.default_model, "Cisco Catalyst 9300");
        assert_eq!(settings.deploy.connect_timeout_secs, 30);
        assert_eq!(settings.deploy.inter_device_delay_ms, 500);
        assert!(settings.export_dir.is_none());
    }

    #[test]
    fn test_malformed_settings_rejected() {
        let result = serde_json::from_str::<Settings>(r#"{"demo_mode": "maybe"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_settings_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings =
            tokio_test::block_on(Settings::load(dir.path().join("absent.json"))).unwrap();
        assert!(settings.demo_mode);
        assert_eq!(settings.default_model, "Cisco Catalyst 9300");
    }

    #[test]
    fn test_settings_survive_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings = Settings::default();
        settings.demo_mode = false;
        settings.export_dir = Some("exports".to_string());

        tokio_test::block_on(async {
            settings.save(&path).await.unwrap();
            let loaded = Settings::load(&path).await.unwrap();
            assert!(!loaded.demo_mode);
            assert_eq!(loaded.export_dir.as_deref(), Some("exports"));
        });
    }
}
