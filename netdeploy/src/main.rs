//! NetDeploy - Entry Point
//!
//! Pushes a text configuration payload to a batch of network switches and
//! routers listed in a CSV inventory. Without an embedded live session
//! backend every run is simulated, so the binary is safe to point at a
//! production inventory.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use netdeploy::app::options::{AppOptions, Command};
use netdeploy::app::run::run;
use netdeploy::deploy::engine::EngineOptions;
use netdeploy::logs::{init_logging, LogLevel, LogOptions};
use netdeploy::settings::Settings;
use netdeploy::utils::version_info;

use secrecy::SecretString;
use tracing::info;

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        println!("{}", serde_json::to_string_pretty(&version).unwrap());
        return;
    }

    if cli_args.contains_key("help") {
        print_usage();
        return;
    }

    let command = if cli_args.contains_key("probe") {
        Command::Probe
    } else if cli_args.contains_key("check") {
        Command::Check
    } else {
        Command::Deploy
    };

    let inventory_path = cli_args.get("inventory").map(PathBuf::from);
    let config_path = cli_args.get("config").map(PathBuf::from);

    let needs_inventory = matches!(command, Command::Deploy | Command::Probe);
    let needs_config = matches!(command, Command::Deploy | Command::Check);
    if needs_inventory && inventory_path.is_none() {
        eprintln!("Missing required flag --inventory=<path>");
        print_usage();
        return;
    }
    if needs_config && config_path.is_none() {
        eprintln!("Missing required flag --config=<path>");
        print_usage();
        return;
    }

    // Retrieve the settings file
    let settings_path = cli_args
        .get("settings")
        .map(String::as_str)
        .unwrap_or("config/settings.json");
    let settings = match Settings::load(settings_path).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to read settings file: {}", e);
            return;
        }
    };

    // Initialize logging; stdout stays reserved for rendered output
    let log_level = match cli_args.get("log-level") {
        Some(value) => match value.parse::<LogLevel>() {
            Ok(level) => level,
            Err(e) => {
                eprintln!("{}", e);
                return;
            }
        },
        None => settings.log_level.clone(),
    };
    let log_dir = cli_args
        .get("log-dir")
        .cloned()
        .or_else(|| settings.log_dir.clone())
        .map(PathBuf::from);
    let log_options = LogOptions {
        log_level,
        stdout: false,
        log_dir,
        json_format: false,
    };
    let _guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            println!("Failed to initialize logging: {e}");
            None
        }
    };

    let timeout_secs = match parse_flag(&cli_args, "timeout", settings.deploy.connect_timeout_secs)
    {
        Ok(value) => value,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };
    let delay_ms = match parse_flag(&cli_args, "delay-ms", settings.deploy.inter_device_delay_ms) {
        Ok(value) => value,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };

    let export_path = cli_args
        .get("export")
        .map(PathBuf::from)
        .or_else(|| match command {
            Command::Deploy => settings
                .export_dir
                .as_ref()
                .map(|dir| PathBuf::from(dir).join(default_export_name())),
            _ => None,
        });

    let options = AppOptions {
        command,
        inventory_path: inventory_path.unwrap_or_default(),
        config_path: config_path.unwrap_or_default(),
        export_path,
        model: cli_args
            .get("model")
            .cloned()
            .unwrap_or_else(|| settings.default_model.clone()),
        username: cli_args.get("username").cloned(),
        password: cli_args
            .get("password")
            .map(|p| SecretString::from(p.as_str())),
        enable_password: cli_args
            .get("enable")
            .map(|p| SecretString::from(p.as_str())),
        demo_mode: settings.demo_mode || cli_args.contains_key("demo"),
        engine: EngineOptions {
            connect_timeout: Duration::from_secs(timeout_secs),
            inter_device_delay: Duration::from_millis(delay_ms),
        },
    };

    info!("Running NetDeploy {} with options: {:?}", version.version, options);
    let result = run(options, await_shutdown_signal()).await;
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn parse_flag(
    cli_args: &HashMap<String, String>,
    key: &str,
    fallback: u64,
) -> Result<u64, String> {
    match cli_args.get(key) {
        Some(value) => value
            .parse::<u64>()
            .map_err(|_| format!("Invalid value for --{}: {}", key, value)),
        None => Ok(fallback),
    }
}

fn default_export_name() -> String {
    format!(
        "deployment_results_{}.csv",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    )
}

fn print_usage() {
    println!("netdeploy {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: netdeploy [--probe|--check|--version] [flags]");
    println!();
    println!("Flags:");
    println!("  --inventory=<path>   Device inventory CSV (deploy, probe)");
    println!("  --config=<path>      Configuration payload file (deploy, check)");
    println!("  --model=<name>       Vendor model profile (default from settings)");
    println!("  --username=<name>    Override device usernames");
    println!("  --password=<secret>  Override device passwords");
    println!("  --enable=<secret>    Enable secret for privileged mode");
    println!("  --demo               Force simulated deployment");
    println!("  --export=<path>      Write results CSV after the run");
    println!("  --settings=<path>    Settings file (default config/settings.json)");
    println!("  --log-level=<level>  trace|debug|info|warn|error");
    println!("  --log-dir=<path>     Write a run log file into this directory");
    println!("  --timeout=<secs>     Per-device connection timeout");
    println!("  --delay-ms=<millis>  Pause between devices");
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).unwrap();
        let mut sigint = signal(SignalKind::interrupt()).unwrap();

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
        info!("Ctrl+C received, shutting down...");
    }
}
