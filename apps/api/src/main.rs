//! HTTP API server for the Viajes booking engine.
//!
//! Thin binary: reads configuration from the environment, opens the
//! database, and serves the router until the process is stopped.

mod config;
mod error;
mod routes;
mod state;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use viajes_db::{Database, DbConfig};

use crate::config::ApiConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env();
    tracing::info!(database = %config.database_path, addr = %config.bind_addr, "starting");

    let db = Database::new(DbConfig::new(&config.database_path)).await?;
    let state = AppState { db };

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, routes::router(state)).await?;
    Ok(())
}
