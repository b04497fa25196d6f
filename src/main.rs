use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use dot_ai_server::config::loader::{load_or_default, ConfigError};
use dot_ai_server::config::validation::validate_config;
use dot_ai_server::config::{ObservabilityConfig, SessionDirectoryConfig};
use dot_ai_server::lifecycle::{fault_channel, ExitOutcome, LifecycleController, SignalListener};
use dot_ai_server::observability::{logging, metrics};
use dot_ai_server::protocol::StdioServer;
use dot_ai_server::service::DeploymentAgent;

#[derive(Parser)]
#[command(name = "dot-ai-server", version)]
#[command(about = "JSON-RPC stdio server for the dot-ai deployment agent", long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long, env = "DOT_AI_CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured log level.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    let outcome = run(Cli::parse()).await;
    outcome.terminate()
}

async fn run(cli: Cli) -> ExitOutcome {
    let mut config = match load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            let _ = logging::init_logging(&ObservabilityConfig::default());
            return ExitOutcome::fatal(format!("Failed to load configuration: {}", e));
        }
    };
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
        if let Err(errors) = validate_config(&config) {
            let _ = logging::init_logging(&ObservabilityConfig::default());
            return ExitOutcome::fatal(format!(
                "Failed to load configuration: {}",
                ConfigError::Validation(errors)
            ));
        }
    }

    if let Err(e) = logging::init_logging(&config.observability) {
        return ExitOutcome::fatal(format!("Failed to initialize logging: {}", e));
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_format = ?config.observability.log_format,
        shutdown_timeout_secs = config.lifecycle.shutdown_timeout_secs,
        stage_timeout_secs = ?config.lifecycle.stage_timeout_secs,
        "dot-ai-server starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::warn!(
                        error = %e,
                        "Metrics exporter unavailable; continuing without it"
                    );
                }
            }
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let (faults, fault_listener) = fault_channel();
    faults.install_panic_hook();

    let signals = match SignalListener::install() {
        Ok(signals) => signals,
        Err(e) => return ExitOutcome::fatal(format!("Failed to install signal handlers: {}", e)),
    };

    let controller = LifecycleController::new(
        config.lifecycle.clone(),
        SessionDirectoryConfig::from_env(),
        fault_listener,
    );

    let controller_task = tokio::spawn(controller.run(
        DeploymentAgent::new,
        move |service, metadata| StdioServer::new(service, metadata).with_faults(faults),
        signals,
    ));

    match controller_task.await {
        Ok(outcome) => outcome,
        Err(e) => ExitOutcome::fatal(format!("Uncaught fault in lifecycle controller: {}", e)),
    }
}
