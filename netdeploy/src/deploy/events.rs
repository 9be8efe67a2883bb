//! Events emitted by the deployment engine
//!
//! The worker never touches presentation state directly; it publishes these
//! onto a channel that the owning context drains on its own schedule.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::logs::LogLevel;
use crate::models::result::{DeploymentResult, RunStats};

/// Typed events published during a run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Free-form log line
    Log { level: LogLevel, text: String },

    /// Short status line describing what the engine is doing
    Status { text: String },

    /// Overall progress as a fraction in `0.0..=1.0`, monotonic within a run
    Progress { fraction: f64 },

    /// Outcome for one device, in processing order
    Result(DeploymentResult),

    /// Final stats snapshot, fired exactly once per run
    Completed { run_id: Uuid, stats: RunStats },
}
