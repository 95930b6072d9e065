//! # Command Line Interface
//!
//! `init` creates (and optionally seeds) a database file, `status` reports
//! record counts, `serve` runs the HTTP API.

use crate::api::{AppState, create_router, spawn_pruner};
use crate::config::{AppConfig, ConfigError, ServeArgs};
use clap::{Parser, Subcommand};
use roster_core::storage::{Store, StoreStats};
use roster_core::StoreError;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(name = "roster", version, about = "Company and employee records over HTTP")]
pub struct Cli {
    /// Database file.
    #[arg(short = 'D', long, env = "ROSTER_DB", default_value = "roster.redb", global = true)]
    pub database: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a new database.
    Init {
        /// Replace an existing file.
        #[arg(long)]
        force: bool,

        /// Load the sample companies and employees.
        #[arg(long)]
        seed: bool,
    },

    /// Print record counts.
    Status {
        #[arg(long)]
        json: bool,
    },

    /// Run the HTTP server.
    Serve(ServeArgs),
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("database already exists at {0} (use --force to replace it)")]
    Exists(PathBuf),

    #[error("no database at {0} (run `roster init` first)")]
    Missing(PathBuf),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// INIT
// =============================================================================

/// Create the database at `path`. Returns the number of sample companies added.
pub fn cmd_init(path: &Path, force: bool, seed: bool) -> Result<usize, CliError> {
    if path.exists() {
        if !force {
            return Err(CliError::Exists(path.to_path_buf()));
        }
        std::fs::remove_file(path)?;
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let store = Store::open(path)?;
    let added = if seed { store.seed_sample_data()? } else { 0 };
    tracing::info!(path = %path.display(), seeded = added, "database initialized");
    println!("Initialized {}", path.display());
    if added > 0 {
        println!("Seeded {added} companies");
    }
    Ok(added)
}

// =============================================================================
// STATUS
// =============================================================================

pub fn cmd_status(path: &Path, json: bool) -> Result<StoreStats, CliError> {
    if !path.exists() {
        return Err(CliError::Missing(path.to_path_buf()));
    }
    let stats = Store::open(path)?.stats()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Database:  {}", path.display());
        println!("Companies: {}", stats.companies);
        println!("Employees: {}", stats.employees);
        println!("Users:     {}", stats.users);
    }
    Ok(stats)
}

// =============================================================================
// SERVE
// =============================================================================

/// How often idle rate-limit keys are dropped.
const LIMITER_PRUNE_PERIOD: Duration = Duration::from_secs(60);

pub async fn cmd_serve(path: &Path, args: ServeArgs) -> Result<(), CliError> {
    let config = AppConfig::try_from(args)?;
    let store = Store::open(path)?;
    let bind = config.bind;

    let state = AppState::new(store, config);
    let pruner = spawn_pruner(Arc::clone(&state.limiter), LIMITER_PRUNE_PERIOD);
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(%bind, database = %path.display(), "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    pruner.abort();

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
