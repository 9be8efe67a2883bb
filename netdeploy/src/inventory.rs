//! Device inventory import and export
//!
//! Inventories are CSV files with the columns `ip, hostname, model,
//! username, password`. Unknown columns are ignored. A missing hostname is
//! synthesized as `Device_<n>` from the 1-based row position; a missing
//! `ip` rejects the file.

use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::EngineError;
use crate::models::device::{Credentials, DeviceRecord};

/// One row in the inventory file shape
#[derive(Debug, Default, Serialize, Deserialize)]
struct InventoryRow {
    #[serde(default)]
    ip: String,
    #[serde(default)]
    hostname: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Parse inventory rows from CSV text
pub fn parse_csv(text: &str) -> Result<Vec<DeviceRecord>, EngineError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut devices = Vec::new();
    for (position, row) in reader.deserialize::<InventoryRow>().enumerate() {
        let row = row?;
        let id = position as u32 + 1;

        let credentials = Credentials {
            username: non_empty(row.username),
            password: non_empty(row.password).map(SecretString::from),
            enable_password: None,
        };
        let device = DeviceRecord::new(id, &row.ip)?
            .with_hostname(&row.hostname)
            .with_model(&row.model)
            .with_credentials(credentials);
        devices.push(device);
    }

    Ok(devices)
}

/// Load an inventory file
pub async fn load(path: impl AsRef<Path>) -> Result<Vec<DeviceRecord>, EngineError> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        EngineError::InventoryError(format!("cannot read {}: {}", path.display(), e))
    })?;
    let devices = parse_csv(&text)?;
    info!("Loaded {} devices from {}", devices.len(), path.display());
    Ok(devices)
}

/// Serialize devices back to the inventory file shape
pub fn to_csv(devices: &[DeviceRecord]) -> Result<String, EngineError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for device in devices {
        writer.serialize(InventoryRow {
            ip: device.address.clone(),
            hostname: device.hostname.clone(),
            model: device.model.clone().unwrap_or_default(),
            username: device.credentials.username.clone().unwrap_or_default(),
            password: device
                .credentials
                .password
                .as_ref()
                .map(|p| p.expose_secret().to_string())
                .unwrap_or_default(),
        })?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| EngineError::Internal(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| EngineError::Internal(e.to_string()))
}

/// Save an inventory file
pub async fn save(path: impl AsRef<Path>, devices: &[DeviceRecord]) -> Result<(), EngineError> {
    let path = path.as_ref();
    tokio::fs::write(path, to_csv(devices)?).await?;
    info!("Saved {} devices to {}", devices.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_rows() {
        let text = "ip,hostname,model,username,password\n\
                    10.0.0.1,core-sw1,Cisco Catalyst 9300,ops,s3cret\n\
                    10.0.0.2,core-sw2,Cisco Catalyst 9300,,\n";
        let devices = parse_csv(text).unwrap();
        assert_eq!(devices.len(), 2);

        assert_eq!(devices[0].id, 1);
        assert_eq!(devices[0].address, "10.0.0.1");
        assert_eq!(devices[0].hostname, "core-sw1");
        assert_eq!(devices[0].model.as_deref(), Some("Cisco Catalyst 9300"));
        assert_eq!(devices[0].credentials.username.as_deref(), Some("ops"));
        assert!(devices[0].credentials.password.is_some());

        assert!(devices[1].credentials.username.is_none());
        assert!(devices[1].credentials.password.is_none());
    }

    #[test]
    fn test_parse_synthesizes_missing_hostname() {
        let text = "ip,hostname\n10.0.0.1,\n10.0.0.2,edge-sw\n";
        let devices = parse_csv(text).unwrap();
        assert_eq!(devices[0].hostname, "Device_1");
        assert_eq!(devices[1].hostname, "edge-sw");
    }

    #[test]
    fn test_parse_ignores_unknown_columns() {
        let text = "ip,site,rack\n10.0.0.1,hq,r12\n";
        let devices = parse_csv(text).unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].hostname, "Device_1");
    }

    #[test]
    fn test_parse_rejects_empty_ip() {
        let text = "ip,hostname\n,orphan\n";
        assert!(parse_csv(text).is_err());
    }

    #[test]
    fn test_round_trip_shape() {
        let text = "ip,hostname,model,username,password\n\
                    10.0.0.1,core-sw1,Huawei S5720,ops,pw\n";
        let devices = parse_csv(text).unwrap();
        let rendered = to_csv(&devices).unwrap();
        let again = parse_csv(&rendered).unwrap();
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].address, "10.0.0.1");
        assert_eq!(again[0].hostname, "core-sw1");
        assert_eq!(again[0].model.as_deref(), Some("Huawei S5720"));
    }
}
