//! Main application run loop

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use colored::Colorize;
use tracing::info;

use crate::app::options::{AppOptions, Command};
use crate::deploy::engine::{DeploymentEngine, RunRequest};
use crate::deploy::events::EngineEvent;
use crate::errors::EngineError;
use crate::export;
use crate::inventory;
use crate::logs::LogLevel;
use crate::models::result::RunStats;
use crate::payload::ConfigPayload;
use crate::probe::{self, ProbeOutcome};
use crate::session::simulated::SimulatedSessionFactory;
use crate::session::SessionFactory;

/// Run the deployment tool.
///
/// Engine events are rendered to stdout; tracing output is reserved for the
/// log file so the two streams never interleave. `shutdown_signal` requests
/// a cooperative stop of an active run.
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), EngineError> {
    match options.command {
        Command::Check => check(&options).await,
        Command::Probe => probe_run(&options).await,
        Command::Deploy => deploy(options, shutdown_signal).await,
    }
}

/// Validate the payload and report findings without touching any device
async fn check(options: &AppOptions) -> Result<(), EngineError> {
    let payload = load_payload(&options.config_path).await?;
    let report = payload.validate();

    for error in &report.errors {
        println!("{} {}", "error:".red().bold(), error);
    }
    for warning in &report.warnings {
        println!("{} {}", "warning:".yellow().bold(), warning);
    }

    if report.has_errors() {
        return Err(EngineError::ConfigError(format!(
            "configuration has {} error(s)",
            report.errors.len()
        )));
    }

    println!(
        "{} {} effective configuration lines",
        "ok:".green().bold(),
        payload.effective_lines().len()
    );
    Ok(())
}

/// Probe every inventory device and print a reachability report
async fn probe_run(options: &AppOptions) -> Result<(), EngineError> {
    let devices = inventory::load(&options.inventory_path).await?;
    println!(
        "Probing {} devices from {}",
        devices.len(),
        options.inventory_path.display()
    );

    let outcomes = probe::probe_inventory(&devices, None).await;

    let mut reachable = 0usize;
    for (id, outcome) in &outcomes {
        let label = devices
            .iter()
            .find(|d| d.id == *id)
            .map(|d| format!("{} ({})", d.hostname, d.address))
            .unwrap_or_else(|| format!("device {}", id));
        match outcome {
            ProbeOutcome::Session => {
                reachable += 1;
                println!("  {} {}", "reachable".green(), label);
            }
            ProbeOutcome::Tcp(port) => {
                reachable += 1;
                println!("  {} {} (tcp/{})", "reachable".green(), label, port);
            }
            ProbeOutcome::Unreachable => {
                println!("  {} {}", "unreachable".red(), label);
            }
        }
    }

    println!("{} of {} devices reachable", reachable, devices.len());
    Ok(())
}

/// Load inventory and payload, run a deployment to completion, export
async fn deploy(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), EngineError> {
    let devices = inventory::load(&options.inventory_path).await?;
    println!(
        "Loaded {} devices from {}",
        devices.len(),
        options.inventory_path.display()
    );
    let payload = load_payload(&options.config_path).await?;

    // No live backend is wired into the binary; every run is simulated.
    let simulated: Arc<dyn SessionFactory> = Arc::new(SimulatedSessionFactory::default());
    let (engine, mut events) = DeploymentEngine::new(options.engine.clone(), None, simulated);
    let stop_handle = engine.stop_handle();

    engine
        .start(RunRequest {
            devices,
            payload,
            username: options.username.clone(),
            password: options.password.clone(),
            enable_password: options.enable_password.clone(),
            model: options.model.clone(),
            demo_mode: options.demo_mode,
        })
        .await?;

    tokio::pin!(shutdown_signal);
    let mut shutdown_fired = false;
    let stats = loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(EngineEvent::Completed { stats, .. }) => break stats,
                Some(event) => render_event(&event),
                None => break engine.stats().await,
            },
            _ = &mut shutdown_signal, if !shutdown_fired => {
                shutdown_fired = true;
                stop_handle.stop();
            }
        }
    };

    render_summary(&stats);

    if let Some(path) = &options.export_path {
        let results = engine.results().await;
        export::write(path, &results).await?;
        println!("Results exported to {}", path.display());
    }

    Ok(())
}

async fn load_payload(path: &Path) -> Result<ConfigPayload, EngineError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| EngineError::ConfigError(format!("cannot read {}: {}", path.display(), e)))?;
    info!("Loaded configuration from {}", path.display());
    Ok(ConfigPayload::new(text))
}

fn render_event(event: &EngineEvent) {
    match event {
        EngineEvent::Log { level, text } => match level {
            LogLevel::Error => println!("{}", text.red()),
            LogLevel::Warn => println!("{}", text.yellow()),
            _ => println!("{}", text),
        },
        EngineEvent::Status { text } => println!("{}", text.bold()),
        EngineEvent::Progress { fraction } => {
            println!("Progress: {:.0}%", fraction * 100.0);
        }
        EngineEvent::Result(result) => {
            let status = if result.is_success() {
                result.status.as_str().green()
            } else {
                result.status.as_str().red()
            };
            println!(
                "  [{}] {} ({}): {}",
                status, result.device, result.address, result.message
            );
        }
        EngineEvent::Completed { .. } => {}
    }
}

fn render_summary(stats: &RunStats) {
    let line = format!(
        "{} devices processed: {} successful, {} failed",
        stats.processed(),
        stats.successful,
        stats.failed
    );
    if stats.failed == 0 {
        println!("{}", line.green().bold());
    } else {
        println!("{}", line.yellow().bold());
    }
}
