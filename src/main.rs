//! telemetryd - Main entry point
//!
//! Loads the device configuration, wires up the MQTT transport and the
//! simulated peripherals, and runs the supervisory loop until a shutdown
//! signal arrives.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use telemetryd::config::DeviceConfig;
use telemetryd::device::SimulatedPeripherals;
use telemetryd::observability::init_default_logging;
use telemetryd::supervisor::Supervisor;
use telemetryd::transport::MqttTransport;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

/// Connectivity supervisor for a networked telemetry device
#[derive(Parser)]
#[command(name = "telemetryd")]
#[command(about = "Connectivity supervisor for a networked telemetry device")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the supervisory loop
    Run,
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    info!("Starting telemetryd v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run => run_supervisor(config).await,
        Commands::Config { show } => handle_config_command(config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }

    info!("Shutdown complete");
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<DeviceConfig, Box<dyn std::error::Error>> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(DeviceConfig::load_from_file(path)?)
        }
        None => {
            let default_paths = vec!["telemetryd.toml", "config/telemetryd.toml"];

            for path_str in default_paths {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    info!("Loading configuration from: {}", path.display());
                    return Ok(DeviceConfig::load_from_file(&path)?);
                }
            }

            error!(
                "No configuration file found. Please provide one with -c/--config or create telemetryd.toml"
            );
            process::exit(1);
        }
    }
}

async fn run_supervisor(config: DeviceConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!("Supervising device: {}", config.device.id);

    let transport = MqttTransport::new(&config.device.id, config.mqtt.clone());
    let peripherals = SimulatedPeripherals::new();
    let mut supervisor = Supervisor::new(&config, transport, peripherals);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!("Signal handling failed: {}", e);
        }
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    supervisor.run(shutdown_rx).await?;
    Ok(())
}

async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    tokio::select! {
        _ = sigint.recv() => info!("Received SIGINT"),
        _ = sigterm.recv() => info!("Received SIGTERM"),
    }
    Ok(())
}

fn handle_config_command(
    config: DeviceConfig,
    show: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("Current configuration:");
        println!("{}", toml::to_string_pretty(&config)?);
    }

    info!("Configuration validation complete");
    Ok(())
}
