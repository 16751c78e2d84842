//! ShortAudio Backend - audio-content service for a WeChat mini-program
//!
//! One binary, two jobs: serve the HTTP API (default), or run one of the
//! CSV catalog-loading modes selected by CLI flags.

mod api;
mod app;
mod cli;
mod config;
mod db;
mod import;
mod services;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::AppState;
use crate::cli::{CliOptions, Command};
use crate::config::Config;
use crate::db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(Config::from_env()?);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shortaudio_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let options = CliOptions::from_args().map_err(|e| anyhow::anyhow!(e))?;

    // URL rewriting touches only the CSV file, not the database
    if let Command::RewriteUrls {
        file,
        audio_base,
        image_base,
    } = &options.command
    {
        let rewritten = import::rewrite_urls(file, audio_base, image_base)?;
        tracing::info!(file = %file.display(), rows = rewritten, "rewrote URLs");
        return Ok(());
    }

    match options.command {
        Command::ImportUrl { base_url, file } => {
            let imported = import::import_via_http(&base_url, &file).await?;
            tracing::info!(rows = imported, "HTTP import finished");
            return Ok(());
        }
        Command::ImportDir { dir } => {
            let db = Database::connect(&config.database_path).await?;
            db.init_schema().await?;
            let imported = import::import_dir(&db, &dir).await?;
            tracing::info!(rows = imported, "direct import finished");
            return Ok(());
        }
        Command::Serve => {}
        Command::RewriteUrls { .. } => unreachable!("handled above"),
    }

    tracing::info!("Starting ShortAudio backend");

    let db = Database::connect(&config.database_path).await?;
    db.init_schema().await?;
    tracing::info!(path = %config.database_path, "database ready");

    let port = config.port;
    let state = AppState::new(config, db);
    let router = app::build_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
