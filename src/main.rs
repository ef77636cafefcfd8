mod assess;
mod config;
mod db;
mod eapi;
mod handlers;
mod jobs;
mod models;
mod report;
mod router;
mod utils;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use assess::FleetAssessor;
use config::Config;
use db::Store;
use eapi::{DeviceApi, EapiClient};
use jobs::AssessmentService;

#[derive(Parser)]
#[command(
    name = "fabric-audit",
    version,
    about = "BGP and MLAG control-plane assessment for Arista switch fleets"
)]
struct Cli {
    /// Device inventory file, one management address per line
    #[arg(long, global = true)]
    devices: Option<String>,

    /// eAPI username
    #[arg(long, global = true)]
    username: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess the fleet once and write the HTML report and topology file
    Run,
    /// Serve the assessment API and run the scheduler
    Serve,
}

/// Application state shared across handlers
pub struct AppState {
    pub store: Store,
    pub config: Config,
    pub assessment_service: Arc<AssessmentService>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fabric_audit=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut cfg = Config::load();
    if let Some(devices) = cli.devices {
        cfg.devices_file = devices;
    }
    if let Some(username) = cli.username {
        cfg.eapi.username = username;
    }
    if cfg.eapi.password.is_empty() {
        tracing::warn!("EAPI_PASSWORD not set - devices will likely reject the session");
    }

    let api: Arc<dyn DeviceApi> = Arc::new(EapiClient::new(cfg.eapi.clone())?);

    match cli.command {
        Commands::Run => run_once(cfg, api).await,
        Commands::Serve => serve(cfg, api).await,
    }
}

async fn run_once(cfg: Config, api: Arc<dyn DeviceApi>) -> anyhow::Result<()> {
    tracing::info!("Device list: {}", cfg.devices_file);
    let devices = utils::load_devices(&cfg.devices_file).await?;
    if devices.is_empty() {
        anyhow::bail!("No devices listed in {}", cfg.devices_file);
    }

    let report = FleetAssessor::new(api, cfg.concurrency)
        .with_precheck(cfg.precheck)
        .with_topology(!cfg.topology_path.is_empty())
        .run(devices)
        .await;

    report::write_outputs(&report, &cfg.report_path, &cfg.topology_path).await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to serialize report")?
    );
    println!("{}", report.summary());
    if report.has_errors() {
        tracing::warn!("Some devices could not be fully assessed, see {}", cfg.report_path);
    }
    Ok(())
}

async fn serve(cfg: Config, api: Arc<dyn DeviceApi>) -> anyhow::Result<()> {
    tracing::info!("Starting Fabric Audit Server");
    tracing::info!("Database: {}", cfg.db_path);
    tracing::info!("Device list: {}", cfg.devices_file);
    tracing::info!("Listen: {}", cfg.listen_addr);

    // Initialize database
    let store = Store::with_pool_size(&cfg.db_path, cfg.db_max_connections).await?;
    tracing::info!("Database initialized (pool_size={})", cfg.db_max_connections);

    // Initialize assessment service and its scheduler
    let assessment_service = AssessmentService::new(store.clone(), cfg.clone(), api);
    assessment_service.start_scheduler();

    let state = Arc::new(AppState {
        store,
        config: cfg.clone(),
        assessment_service,
    });

    let app = router::build(state);

    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr).await?;
    tracing::info!("Fabric Audit listening on {}", cfg.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Fabric Audit shutting down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
