//! ScoringGateway server
//!
//! Loads the players snapshot and leagues, then serves the REST API until
//! Ctrl+C.

use anyhow::{Context, Result};
use clap::Parser;
use player_registry::PlayerRegistry;
use scoring_gateway::{create_routes, initialize_logging, load_config};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use valuation_engine::ScoringEngine;

/// Player valuation and trade/waiver scoring server
#[derive(Parser)]
#[command(name = "scoring-gateway")]
#[command(about = "REST API for fantasy trade analysis and waiver wire recommendations")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Players snapshot JSON file
    #[arg(long)]
    players: Option<PathBuf>,

    /// Leagues JSON file
    #[arg(long)]
    leagues: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(players) = cli.players {
        config.data.players_file = players;
    }
    if let Some(leagues) = cli.leagues {
        config.data.leagues_file = Some(leagues);
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate()?;

    initialize_logging(&config.logging)?;
    info!("Starting ScoringGateway v{}", env!("CARGO_PKG_VERSION"));

    let registry = Arc::new(PlayerRegistry::new());
    let engine = Arc::new(ScoringEngine::new(config.valuation.clone(), registry.clone()));

    let snapshot = engine
        .load_snapshot_file(&config.data.players_file)
        .await
        .with_context(|| format!("Failed to load players from {:?}", config.data.players_file))?;
    info!("Loaded {} players at snapshot version {}", snapshot.len(), snapshot.version);

    if let Some(leagues_file) = &config.data.leagues_file {
        match registry.load_leagues_file(leagues_file).await {
            Ok(count) => info!("Loaded {} leagues", count),
            Err(e) => error!("Failed to load leagues from {:?}: {}", leagues_file, e),
        }
    }

    let addr = config.server.socket_addr()?;
    let routes = create_routes(engine);

    let (bound, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C signal: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    });

    info!("ScoringGateway listening on {}", bound);
    server.await;

    info!("ScoringGateway shutdown complete");
    Ok(())
}
