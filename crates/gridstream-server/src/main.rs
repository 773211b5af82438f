use anyhow::Result;
use clap::Parser;
use gridstream_core::catalog::SimulatorCatalog;
use gridstream_core::session::SessionRegistry;
use gridstream_core::simulator::SimulatorBuilders;
use gridstream_execution::SessionService;
use gridstream_server::{AppState, routes};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gridstream")]
#[command(about = "GridStream - streaming 2D grid simulation sessions", long_about = None)]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Path to a simulator catalog TOML; the builtin catalog is used
    /// when omitted.
    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .compact()
        .init();

    let args = Args::parse();

    let catalog = match &args.catalog {
        Some(path) => SimulatorCatalog::load(path)?,
        None => SimulatorCatalog::builtin(),
    };
    info!(simulators = catalog.len(), "catalog loaded");

    let mut builders = SimulatorBuilders::new();
    gridstream_sim::register_builtins(&mut builders);

    let registry = Arc::new(SessionRegistry::new(catalog, builders));
    let state = AppState {
        service: SessionService::new(registry),
    };

    let listener = tokio::net::TcpListener::bind((args.host.as_str(), args.port)).await?;
    info!("gridstream listening on http://{}", listener.local_addr()?);

    axum::serve(listener, routes::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
