//! Run state, statistics, and per-device results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::device::{DeviceRecord, DeviceStatus};

/// Lifecycle state of the deployment engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    /// No run has been started yet
    #[default]
    Idle,

    /// A deployment worker is processing devices
    Running,

    /// The last run processed every device in its snapshot
    Completed,

    /// The last run was cancelled at a device boundary
    Stopped,
}

impl RunState {
    /// True while a worker owns the run
    pub fn is_active(&self) -> bool {
        matches!(self, RunState::Running)
    }
}

/// Aggregate counters for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub pending: usize,
    pub in_progress: usize,
}

impl RunStats {
    /// Counters for a freshly started run over `total` devices
    pub fn for_run(total: usize) -> Self {
        Self {
            total,
            pending: total,
            ..Default::default()
        }
    }

    /// Devices with a recorded outcome so far
    pub fn processed(&self) -> usize {
        self.successful + self.failed
    }

    /// Bookkeeping identity: every device is in exactly one bucket
    pub fn is_consistent(&self) -> bool {
        self.successful + self.failed + self.pending + self.in_progress == self.total
    }
}

/// Outcome of one device deployment attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentResult {
    /// Device hostname
    pub device: String,

    /// Device management address
    pub address: String,

    /// Final status, `Success` or `Failed`
    pub status: DeviceStatus,

    /// When the attempt started
    pub timestamp: DateTime<Utc>,

    /// Human-readable outcome message
    pub message: String,
}

impl DeploymentResult {
    pub fn success(
        device: &DeviceRecord,
        timestamp: DateTime<Utc>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            device: device.hostname.clone(),
            address: device.address.clone(),
            status: DeviceStatus::Success,
            timestamp,
            message: message.into(),
        }
    }

    pub fn failure(
        device: &DeviceRecord,
        timestamp: DateTime<Utc>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            device: device.hostname.clone(),
            address: device.address.clone(),
            status: DeviceStatus::Failed,
            timestamp,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == DeviceStatus::Success
    }

    /// Timestamp in the `YYYY-MM-DD HH:MM:SS` form used in exports
    pub fn timestamp_display(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_consistency() {
        let mut stats = RunStats::for_run(4);
        assert!(stats.is_consistent());

        stats.pending -= 1;
        stats.in_progress = 1;
        assert!(stats.is_consistent());

        stats.in_progress = 0;
        stats.successful += 1;
        assert!(stats.is_consistent());
        assert_eq!(stats.processed(), 1);

        stats.failed += 1;
        assert!(!stats.is_consistent());
    }
}
