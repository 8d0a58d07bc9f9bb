//! manipulator-link main entry point
//!
//! This binary wires the gateway together: CLI parsing, logging setup,
//! configuration loading, the simulated facility, the gateway server and
//! the operational HTTP surface (health and metrics).

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use manipulator_link::config::{Config, DEFAULT_CONFIG_PATH};
use manipulator_link::facility::{DeviceFacility, SimulatedFacility};
use manipulator_link::gateway::GatewayServer;
use manipulator_link::monitoring::Monitor;
use manipulator_link::{APP_NAME, VERSION};
use std::sync::Arc;
use tokio::signal;

/// Real-time manipulator control gateway
#[derive(Parser, Debug)]
#[command(name = APP_NAME, version = VERSION, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the gateway
    Start,

    /// Print version information
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    info!("Starting {} v{}", APP_NAME, VERSION);

    if let Err(e) = run(cli).await {
        error!("Gateway failed: {}", e);
        std::process::exit(1);
    }
}

/// Initialize structured logging with tracing
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Dispatch the parsed command.
async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Start => {
            info!("Starting gateway with config: {}", cli.config);
            let config = Config::load_or_default(&cli.config)?;

            let monitor = Arc::new(Monitor::new());
            let facility: Arc<dyn DeviceFacility> =
                Arc::new(SimulatedFacility::new(&config.facility));
            info!(
                "Simulated facility ready with manipulators {:?}",
                config.facility.device_ids
            );

            // Start the gateway server
            let server =
                GatewayServer::bind(&config.server.listen_addr(), facility, monitor.clone())
                    .await?;
            let gateway = tokio::spawn(server.run());

            // Operational HTTP surface (health + metrics)
            let app = create_http_server(monitor);
            let http_addr = config.http.listen_addr();
            let listener = tokio::net::TcpListener::bind(&http_addr).await?;
            info!("HTTP server listening on {}", http_addr);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            info!("Shutting down gateway");
            gateway.abort();
            Ok(())
        }
        Commands::Version => {
            println!("{} v{}", APP_NAME, VERSION);
            Ok(())
        }
    }
}

/// Assemble the operational HTTP surface
fn create_http_server(monitor: Arc<Monitor>) -> Router {
    Router::new()
        .route("/healthz", get(|| async { (StatusCode::OK, "OK") }))
        .route("/metrics", get(move || metrics(monitor.clone())))
}

/// Metrics endpoint (Prometheus format)
async fn metrics(monitor: Arc<Monitor>) -> impl IntoResponse {
    let stats = monitor.snapshot();

    // Gateway info and session gauges come from the stats snapshot; the
    // counters come from the collector export
    let mut output = format!(
        "# HELP manipulator_link_info Gateway information\n\
         # TYPE manipulator_link_info gauge\n\
         manipulator_link_info{{version=\"{}\"}} 1\n\n",
        VERSION
    );

    output.push_str(&format!(
        "# HELP manipulator_link_session_active Whether a client session is attached\n\
         # TYPE manipulator_link_session_active gauge\n\
         manipulator_link_session_active {}\n\n",
        stats.session_active as u8
    ));

    if let Some(uptime) = stats.session_uptime() {
        output.push_str(&format!(
            "# HELP manipulator_link_session_uptime_seconds Uptime of the attached session\n\
             # TYPE manipulator_link_session_uptime_seconds gauge\n\
             manipulator_link_session_uptime_seconds {}\n\n",
            uptime.as_secs()
        ));
    }

    output.push_str(&monitor.metrics().export_prometheus());

    (StatusCode::OK, output)
}

/// Resolve once Ctrl+C or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Ctrl+C received"),
        _ = sigterm => info!("SIGTERM received"),
    }
}
