//! folio server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite-backed document/blob store, and serves the JSON portfolio API over
//! HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use folio_core::store::PortfolioStore;
use folio_store_sqlite::SqliteStore;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` layered
/// with `FOLIO_`-prefixed environment variables.
#[derive(Debug, Clone, Deserialize)]
struct ServerConfig {
  #[serde(default = "default_host")]
  host: String,
  #[serde(default = "default_port")]
  port: u16,
  #[serde(default = "default_store_path")]
  store_path: PathBuf,
  /// Prefix under which uploaded asset URLs are issued.
  #[serde(default = "default_blob_base_url")]
  blob_base_url: String,
}

fn default_host() -> String {
  "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
  8080
}

fn default_store_path() -> PathBuf {
  PathBuf::from("folio.db")
}

fn default_blob_base_url() -> String {
  "/assets".to_owned()
}

// ─── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "folio portfolio server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

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
    .add_source(config::Environment::with_prefix("FOLIO"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open the SQLite store and build the facade.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?
    .with_blob_base_url(server_cfg.blob_base_url.clone());

  let portfolios = Arc::new(PortfolioStore::new(store.clone(), store));

  let app = folio_api::api_router(portfolios).layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  match path.strip_prefix("~") {
    Ok(rest) => std::env::var_os("HOME")
      .map(|home| PathBuf::from(home).join(rest))
      .unwrap_or_else(|| path.to_path_buf()),
    Err(_) => path.to_path_buf(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn config_defaults_apply_when_nothing_is_set() {
    let cfg: ServerConfig = config::Config::builder()
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap();

    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.store_path, PathBuf::from("folio.db"));
    assert_eq!(cfg.blob_base_url, "/assets");
  }

  #[test]
  fn tilde_paths_expand_to_home() {
    let expanded = expand_tilde(Path::new("~/folio.db"));
    if let Some(home) = std::env::var_os("HOME") {
      assert_eq!(expanded, PathBuf::from(home).join("folio.db"));
    }

    // Paths without a leading tilde pass through.
    assert_eq!(
      expand_tilde(Path::new("/var/lib/folio.db")),
      PathBuf::from("/var/lib/folio.db")
    );
  }
}
