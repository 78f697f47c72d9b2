//! API server for the task board
//!
//! Serves the task REST API over a PostgreSQL store, or an in-memory one
//! when `TASK_STORE=memory`.

mod config;
mod db;
mod error;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use board_core::task::{MemoryTaskStore, TaskRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ServerConfig, StoreBackend};
use crate::db::PgTaskStore;
use crate::state::AppState;

async fn open_store(backend: &StoreBackend) -> anyhow::Result<Arc<dyn TaskRepository>> {
    match backend {
        StoreBackend::Postgres(db) => {
            tracing::info!("Connecting to PostgreSQL at {}:{}/{}", db.host, db.port, db.name);
            let store = PgTaskStore::connect(db)
                .await
                .context("Failed to connect to PostgreSQL")?;
            store
                .init_schema()
                .await
                .context("Failed to initialize task schema")?;
            tracing::info!("Task schema ready");
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory task store; data is lost on restart");
            Ok(Arc::new(MemoryTaskStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api_server=debug,board_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env().context("Invalid server configuration")?;
    let store = open_store(&config.store).await?;

    let app = routes::app(AppState::new(store), &config.cors_origins);

    // Bind to 0.0.0.0 for localhost/127.0.0.1 compatibility
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("REST API listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
