//! Deployment result export

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::errors::EngineError;
use crate::models::result::DeploymentResult;

/// One row of the export file
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "Device")]
    device: &'a str,
    #[serde(rename = "IP")]
    ip: &'a str,
    #[serde(rename = "Status")]
    status: &'a str,
    #[serde(rename = "Time")]
    time: String,
    #[serde(rename = "Message")]
    message: &'a str,
}

/// Render results as CSV, one row per result, in run order
pub fn to_csv(results: &[DeploymentResult]) -> Result<String, EngineError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for result in results {
        writer.serialize(ExportRow {
            device: &result.device,
            ip: &result.address,
            status: result.status.as_str(),
            time: result.timestamp_display(),
            message: &result.message,
        })?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| EngineError::Internal(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| EngineError::Internal(e.to_string()))
}

/// Write results to a CSV file
pub async fn write(
    path: impl AsRef<Path>,
    results: &[DeploymentResult],
) -> Result<(), EngineError> {
    if results.is_empty() {
        return Err(EngineError::ValidationError(
            "no deployment results to export".to_string(),
        ));
    }

    let path = path.as_ref();
    tokio::fs::write(path, to_csv(results)?).await?;
    info!("Exported {} results to {}", results.len(), path.display());
    Ok(())
}
