#![forbid(unsafe_code)]

use clap::Parser;
use pirsch_proxy_lib::config::{load_from_path, LoggingConfig, TelemetryConfig};
use pirsch_proxy_lib::telemetry::{init_metrics, init_tracing, start_observability_server};
use pirsch_proxy_lib::{run, setup_clients, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Pirsch analytics proxy")]
struct Cli {
    /// Path to configuration TOML file
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "PIRSCH_PROXY_CONFIG",
        default_value = "config.toml"
    )]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cfg = match load_from_path(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            let _ = init_tracing(&LoggingConfig::default(), &TelemetryConfig::default());
            error!(%err, path = %cli.config.display(), "failed to load configuration");
            std::process::exit(1);
        }
    };

    if let Err(err) = init_tracing(&cfg.logging, &cfg.telemetry) {
        eprintln!("failed to initialize tracing: {err}");
        std::process::exit(1);
    }
    info!(listen = %cfg.server.listen, clients = cfg.clients.len(), "configuration loaded");

    let metrics = match cfg.telemetry.metrics_port {
        Some(port) => match init_metrics() {
            Ok((metrics, registry)) => Some((metrics, registry, port)),
            Err(err) => {
                error!(%err, "failed to initialize metrics");
                std::process::exit(1);
            }
        },
        None => None,
    };

    let clients = match setup_clients(&cfg).await {
        Ok(clients) => clients,
        Err(err) => {
            error!(%err, "error connecting client");
            std::process::exit(1);
        }
    };

    let client_count = clients.len();
    let state = match AppState::new(&cfg, clients, metrics.as_ref().map(|(m, _, _)| m.clone())) {
        Ok(state) => Arc::new(state),
        Err(err) => {
            error!(%err, "failed to set up request handling");
            std::process::exit(1);
        }
    };

    if let Some((_, registry, port)) = metrics {
        tokio::spawn(async move {
            if let Err(err) = start_observability_server(port, registry, client_count).await {
                error!(%err, "observability server exited with error");
            }
        });
    }

    if let Err(err) = run(&cfg, state).await {
        error!(%err, "proxy exited with error");
        std::process::exit(1);
    }
}
