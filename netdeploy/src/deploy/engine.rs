//! Deployment engine
//!
//! Owns the run state machine and drives the per-device deployment loop on a
//! background task. Devices are processed strictly in snapshot order, one at
//! a time; a run is cancelled cooperatively at device boundaries and no
//! per-device failure is ever fatal to the run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::deploy::events::EngineEvent;
use crate::errors::EngineError;
use crate::logs::LogLevel;
use crate::models::device::{DeviceRecord, DeviceStatus};
use crate::models::result::{DeploymentResult, RunState, RunStats};
use crate::payload::ConfigPayload;
use crate::session::{
    ConnectError, ConnectParams, DeviceSession, SessionError, SessionFactory, CONNECT_TIMEOUT,
};
use crate::vendor::{self, VendorProfile};

/// Engine tuning
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Protocol timeout for connections
    pub connect_timeout: Duration,

    /// Throttle between consecutive devices
    pub inter_device_delay: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            connect_timeout: CONNECT_TIMEOUT,
            inter_device_delay: Duration::from_millis(500),
        }
    }
}

/// Everything one run needs, snapshotted at start
#[derive(Clone)]
pub struct RunRequest {
    /// Devices to deploy to, processed in this order
    pub devices: Vec<DeviceRecord>,

    /// Raw configuration text
    pub payload: ConfigPayload,

    /// Run-level username, applied when a device carries none
    pub username: Option<String>,

    /// Run-level password, applied when a device carries none
    pub password: Option<SecretString>,

    /// Run-level enable secret
    pub enable_password: Option<SecretString>,

    /// Vendor model display name, resolved against the profile registry
    pub model: String,

    /// Force simulated sessions even when a live backend exists
    pub demo_mode: bool,
}

/// Mutable state shared between the engine handle and its worker
struct RunShared {
    state: RwLock<RunState>,
    running: AtomicBool,
    stats: RwLock<RunStats>,
    results: RwLock<Vec<DeploymentResult>>,
    devices: RwLock<Vec<DeviceRecord>>,
}

/// Cancellation token for a running deployment.
///
/// Cheap to clone and safe to trigger from signal handlers or other tasks;
/// the worker observes it at the next device boundary.
#[derive(Clone)]
pub struct StopHandle {
    shared: Arc<RunShared>,
    events: mpsc::UnboundedSender<EngineEvent>,
}

impl StopHandle {
    /// Request a cooperative stop; the device currently in flight finishes
    pub fn stop(&self) {
        if self.shared.running.swap(false, Ordering::SeqCst) {
            warn!("Deployment stop requested");
            let _ = self.events.send(EngineEvent::Log {
                level: LogLevel::Warn,
                text: "Deployment stopped by user".to_string(),
            });
        }
    }

    /// True while a worker is processing devices
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }
}

/// The deployment orchestrator
pub struct DeploymentEngine {
    options: EngineOptions,
    live: Option<Arc<dyn SessionFactory>>,
    simulated: Arc<dyn SessionFactory>,
    events: mpsc::UnboundedSender<EngineEvent>,
    shared: Arc<RunShared>,
}

impl DeploymentEngine {
    /// Create an engine and the receiving end of its event stream.
    ///
    /// `live` is the real network backend when one is configured; without
    /// it every run is forced into demo mode.
    pub fn new(
        options: EngineOptions,
        live: Option<Arc<dyn SessionFactory>>,
        simulated: Arc<dyn SessionFactory>,
    ) -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let engine = Self {
            options,
            live,
            simulated,
            events,
            shared: Arc::new(RunShared {
                state: RwLock::new(RunState::Idle),
                running: AtomicBool::new(false),
                stats: RwLock::new(RunStats::default()),
                results: RwLock::new(Vec::new()),
                devices: RwLock::new(Vec::new()),
            }),
        };
        (engine, receiver)
    }

    /// True when a live network backend was configured
    pub fn has_live_backend(&self) -> bool {
        self.live.is_some()
    }

    /// Cancellation token usable from other tasks
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            shared: Arc::clone(&self.shared),
            events: self.events.clone(),
        }
    }

    /// Current lifecycle state
    pub async fn state(&self) -> RunState {
        *self.shared.state.read().await
    }

    /// Counters of the current or last run
    pub async fn stats(&self) -> RunStats {
        *self.shared.stats.read().await
    }

    /// Results recorded so far, in processing order
    pub async fn results(&self) -> Vec<DeploymentResult> {
        self.shared.results.read().await.clone()
    }

    /// Device snapshot of the current or last run, with engine-written statuses
    pub async fn devices(&self) -> Vec<DeviceRecord> {
        self.shared.devices.read().await.clone()
    }

    /// Request a cooperative stop at the next device boundary
    pub fn stop(&self) {
        self.stop_handle().stop();
    }

    /// Start a deployment run.
    ///
    /// Preconditions are checked synchronously: a resolvable vendor model, a
    /// non-empty device list, and a non-blank payload. Violations reject the
    /// request without touching engine state or emitting events. A second
    /// start while a run is active is rejected with
    /// [`EngineError::RunInProgress`].
    pub async fn start(&self, mut request: RunRequest) -> Result<Uuid, EngineError> {
        let mut state = self.shared.state.write().await;
        if state.is_active() {
            return Err(EngineError::RunInProgress);
        }

        let profile = vendor::lookup(&request.model).ok_or_else(|| {
            EngineError::ValidationError(format!(
                "unknown device model: {} (known models: {})",
                request.model,
                vendor::model_names().join(", ")
            ))
        })?;
        if request.devices.is_empty() {
            return Err(EngineError::ValidationError(
                "device list is empty".to_string(),
            ));
        }
        if request.payload.is_blank() {
            return Err(EngineError::ValidationError(
                "configuration is empty".to_string(),
            ));
        }

        let run_id = Uuid::new_v4();
        let devices = std::mem::take(&mut request.devices);
        let total = devices.len();
        let demo = request.demo_mode || self.live.is_none();

        // Reset run-scoped state before the worker takes over
        *self.shared.stats.write().await = RunStats::for_run(total);
        self.shared.results.write().await.clear();
        *self.shared.devices.write().await = devices;
        self.shared.running.store(true, Ordering::SeqCst);
        *state = RunState::Running;
        drop(state);

        info!(
            "Starting deployment run {} for {} devices (model {})",
            run_id, total, profile.display_name
        );
        self.emit(EngineEvent::Log {
            level: LogLevel::Info,
            text: format!(
                "Deployment started in {} mode",
                if demo { "DEMO" } else { "REAL" }
            ),
        });
        if demo && !request.demo_mode {
            self.emit(EngineEvent::Log {
                level: LogLevel::Warn,
                text: "No live session backend available, outcomes will be simulated".to_string(),
            });
        }
        self.emit(EngineEvent::Status {
            text: "Deployment in progress...".to_string(),
        });

        let factory = match (&self.live, demo) {
            (Some(live), false) => Arc::clone(live),
            _ => Arc::clone(&self.simulated),
        };
        let ctx = RunContext {
            run_id,
            options: self.options.clone(),
            shared: Arc::clone(&self.shared),
            events: self.events.clone(),
            factory,
            profile,
            request,
            demo,
        };
        tokio::spawn(run_loop(ctx));

        Ok(run_id)
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }
}

/// Borrow-free bundle the worker task owns for the duration of one run
struct RunContext {
    run_id: Uuid,
    options: EngineOptions,
    shared: Arc<RunShared>,
    events: mpsc::UnboundedSender<EngineEvent>,
    factory: Arc<dyn SessionFactory>,
    profile: &'static VendorProfile,
    request: RunRequest,
    demo: bool,
}

impl RunContext {
    fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }

    fn log(&self, level: LogLevel, text: String) {
        self.emit(EngineEvent::Log { level, text });
    }
}

/// The per-run worker: sequential, snapshot order, cancellable at boundaries
async fn run_loop(ctx: RunContext) {
    let lines = ctx.request.payload.effective_lines();
    let total = ctx.shared.devices.read().await.len();
    let mut cancelled = false;

    for index in 0..total {
        if !ctx.shared.running.load(Ordering::SeqCst) {
            cancelled = true;
            break;
        }

        // Claim the device and mark it in flight
        let device = {
            let mut devices = ctx.shared.devices.write().await;
            devices[index].status = DeviceStatus::InProgress;
            devices[index].clone()
        };
        {
            let mut stats = ctx.shared.stats.write().await;
            stats.pending -= 1;
            stats.in_progress = 1;
            debug_assert!(stats.is_consistent());
        }
        ctx.emit(EngineEvent::Status {
            text: format!(
                "Deploying to {} ({} of {})",
                device.hostname,
                index + 1,
                total
            ),
        });

        let result = deploy_to_device(&ctx, &device, &lines).await;

        {
            let mut devices = ctx.shared.devices.write().await;
            devices[index].status = result.status;
        }
        {
            let mut stats = ctx.shared.stats.write().await;
            if result.is_success() {
                stats.successful += 1;
            } else {
                stats.failed += 1;
            }
            stats.in_progress = 0;
            debug_assert!(stats.is_consistent());
        }
        ctx.shared.results.write().await.push(result.clone());
        ctx.emit(EngineEvent::Result(result));
        ctx.emit(EngineEvent::Progress {
            fraction: (index + 1) as f64 / total as f64,
        });

        if index + 1 < total && !ctx.options.inter_device_delay.is_zero() {
            tokio::time::sleep(ctx.options.inter_device_delay).await;
        }
    }

    finish_run(&ctx, cancelled).await;
}

async fn finish_run(ctx: &RunContext, cancelled: bool) {
    ctx.shared.running.store(false, Ordering::SeqCst);
    *ctx.shared.state.write().await = if cancelled {
        RunState::Stopped
    } else {
        RunState::Completed
    };

    let stats = *ctx.shared.stats.read().await;
    let summary = format!(
        "Deployment complete: {} successful, {} failed",
        stats.successful, stats.failed
    );
    info!("Run {}: {}", ctx.run_id, summary);
    ctx.log(LogLevel::Info, summary);
    ctx.emit(EngineEvent::Status {
        text: if cancelled {
            "Deployment stopped".to_string()
        } else {
            "Deployment complete".to_string()
        },
    });
    ctx.emit(EngineEvent::Completed {
        run_id: ctx.run_id,
        stats,
    });
}

/// Deploy the payload to one device, never propagating its failure
async fn deploy_to_device(
    ctx: &RunContext,
    device: &DeviceRecord,
    lines: &[String],
) -> DeploymentResult {
    let started_at = Utc::now();

    if ctx.demo {
        ctx.log(
            LogLevel::Info,
            format!("DEMO: simulating deployment to {}", device.hostname),
        );
        return match ctx.factory.connect(connect_params(ctx, device)).await {
            Ok(mut session) => {
                let _ = session.disconnect().await;
                DeploymentResult::success(
                    device,
                    started_at,
                    "Configuration deployed successfully (DEMO)",
                )
            }
            Err(_) => DeploymentResult::failure(device, started_at, "Connection timeout (DEMO)"),
        };
    }

    ctx.log(
        LogLevel::Info,
        format!("Connecting to {} ({})...", device.hostname, device.address),
    );
    debug!(
        "Opening session to {}:{} via {} backend",
        device.address,
        device.port,
        ctx.factory.backend_name()
    );

    let mut session = match ctx.factory.connect(connect_params(ctx, device)).await {
        Ok(session) => session,
        Err(ConnectError::Timeout) => {
            ctx.log(
                LogLevel::Error,
                format!("Timeout connecting to {}", device.hostname),
            );
            return DeploymentResult::failure(
                device,
                started_at,
                "Connection timeout - Device unreachable",
            );
        }
        Err(ConnectError::AuthFailed) => {
            ctx.log(
                LogLevel::Error,
                format!("Authentication failed for {}", device.hostname),
            );
            return DeploymentResult::failure(
                device,
                started_at,
                "Authentication failed - Check credentials",
            );
        }
        Err(ConnectError::Other(message)) => {
            ctx.log(
                LogLevel::Error,
                format!("Error deploying to {}: {}", device.hostname, message),
            );
            return DeploymentResult::failure(device, started_at, format!("Error: {}", message));
        }
    };

    match configure_device(ctx, device, session.as_mut(), lines, started_at).await {
        Ok(result) => result,
        Err(error) => {
            ctx.log(
                LogLevel::Error,
                format!("Error deploying to {}: {}", device.hostname, error),
            );
            DeploymentResult::failure(device, started_at, format!("Error: {}", error))
        }
    }
}

/// Privilege, push, save, and disconnect on an established session.
///
/// The effective-line check sits after the connection is opened; a
/// comment-only payload still costs a connect attempt and fails on the
/// open session.
async fn configure_device(
    ctx: &RunContext,
    device: &DeviceRecord,
    session: &mut dyn DeviceSession,
    lines: &[String],
    started_at: DateTime<Utc>,
) -> Result<DeploymentResult, SessionError> {
    if !session.is_privileged().await {
        if let Some(enable) = resolve_enable_password(ctx, device) {
            session.enter_privileged(&enable).await?;
        }
    }

    if lines.is_empty() {
        ctx.log(
            LogLevel::Warn,
            format!("No valid config for {}", device.hostname),
        );
        let _ = session.disconnect().await;
        return Ok(DeploymentResult::failure(
            device,
            started_at,
            "No valid configuration lines to deploy",
        ));
    }

    ctx.log(
        LogLevel::Info,
        format!("Sending configuration to {}...", device.hostname),
    );
    session.push_config_lines(lines).await?;
    session.run_command(ctx.profile.kind.save_command()).await?;
    session.disconnect().await?;

    ctx.log(
        LogLevel::Info,
        format!("Successfully deployed to {}", device.hostname),
    );
    Ok(DeploymentResult::success(
        device,
        started_at,
        "Configuration deployed and saved successfully",
    ))
}

fn connect_params(ctx: &RunContext, device: &DeviceRecord) -> ConnectParams {
    let username = ctx
        .request
        .username
        .clone()
        .or_else(|| device.credentials.username.clone())
        .unwrap_or_else(|| "admin".to_string());
    let password = ctx
        .request
        .password
        .clone()
        .or_else(|| device.credentials.password.clone())
        .unwrap_or_else(|| SecretString::from(""));

    ConnectParams {
        kind: ctx.profile.kind,
        host: device.address.clone(),
        port: device.port,
        username,
        password,
        enable_password: resolve_enable_password(ctx, device),
        timeout: ctx.options.connect_timeout,
    }
}

/// Enable secret resolution: run-level, then per-device, then profile default
fn resolve_enable_password(ctx: &RunContext, device: &DeviceRecord) -> Option<SecretString> {
    ctx.request
        .enable_password
        .clone()
        .or_else(|| device.credentials.enable_password.clone())
        .or_else(|| {
            let enable = ctx.profile.default_enable_password;
            if enable.is_empty() {
                None
            } else {
                Some(SecretString::from(enable))
            }
        })
}
