//! qhse-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) plus `QHSE_*`
//! environment variables, opens an in-process SQLite store, and serves the
//! QHSE JSON API over HTTP. Uploaded attachments are served statically under
//! `/uploads`.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::{Router, routing::get};
use clap::Parser;
use qhse_api::AttachmentStore;
use qhse_store_sqlite::SqliteStore;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::{
  cors::{Any, CorsLayer},
  services::ServeDir,
  trace::TraceLayer,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "QHSE record-keeping API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

/// Runtime server configuration. Every key has a default, so the server
/// starts with no config file at all.
#[derive(Debug, Clone, Deserialize)]
struct ServerConfig {
  #[serde(default = "defaults::host")]
  host:       String,
  #[serde(default = "defaults::port")]
  port:       u16,
  #[serde(default = "defaults::db_path")]
  db_path:    PathBuf,
  #[serde(default = "defaults::upload_dir")]
  upload_dir: PathBuf,
}

mod defaults {
  use std::path::PathBuf;

  pub fn host() -> String { "0.0.0.0".to_owned() }
  pub fn port() -> u16 { 8000 }
  pub fn db_path() -> PathBuf { PathBuf::from("qhse.db") }
  pub fn upload_dir() -> PathBuf { PathBuf::from("uploads") }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("QHSE"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  tokio::fs::create_dir_all(&server_cfg.upload_dir)
    .await
    .with_context(|| {
      format!("failed to create upload dir {:?}", server_cfg.upload_dir)
    })?;

  // Open SQLite store.
  let store = SqliteStore::open(&server_cfg.db_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", server_cfg.db_path))?;

  let attachments = AttachmentStore::new(&server_cfg.upload_dir);

  // The frontend is served from another origin; mirror its permissive CORS.
  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods(Any)
    .allow_headers(Any);

  let app = Router::new()
    .route("/", get(qhse_api::meta::root))
    .route("/health", get(qhse_api::meta::health))
    .nest("/api", qhse_api::api_router(Arc::new(store), attachments))
    .nest_service("/uploads", ServeDir::new(&server_cfg.upload_dir))
    .layer(TraceLayer::new_for_http())
    .layer(cors);

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
