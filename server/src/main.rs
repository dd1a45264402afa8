use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use server::AppState;
use server::app::serve;
use server::database::{connect, create_tables, seed::seed_posts};
use shared::config::load_config;

#[derive(Parser, Debug)]
#[command(name = "site-server", about = "Marketing site and admin backend")]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Import blog posts from a JSON file when the blog is empty
    #[arg(long)]
    seed_posts: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config))?;
    let addr = config.server.addr();

    let db = connect(&config.database)
        .await
        .with_context(|| format!("Failed to open database {}", config.database.url))?;
    create_tables(&db).await.context("Failed to create tables")?;

    if let Some(path) = &cli.seed_posts {
        seed_posts(&db, path).await?;
    }

    let state = AppState::new(config, db).context("Failed to build application state")?;

    spawn_reload_on_sighup(state.clone(), cli.config.clone());

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);

    serve(listener, state.clone(), shutdown_signal()).await?;

    state.db.close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Re-read the config file on SIGHUP. Session keys, the admin password and
/// the database connection stay as they were at startup.
#[cfg(unix)]
fn spawn_reload_on_sighup(state: AppState, path: String) {
    use tokio::signal::unix::{SignalKind, signal};

    tokio::spawn(async move {
        let mut hangups = match signal(SignalKind::hangup()) {
            Ok(s) => s,
            Err(e) => {
                warn!("SIGHUP reload unavailable: {}", e);
                return;
            }
        };

        while hangups.recv().await.is_some() {
            match load_config(&path) {
                Ok(new) => {
                    state.config.reload(new).await;
                    info!("Configuration reloaded from {}", path);
                }
                Err(e) => error!("Config reload failed, keeping current config: {}", e),
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_reload_on_sighup(_state: AppState, _path: String) {}
