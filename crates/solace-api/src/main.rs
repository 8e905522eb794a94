//! Solace server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the quote API over HTTP.
//!
//! # Operator helpers
//!
//! Seed the corpus from a JSON file of quotes:
//!
//! ```
//! cargo run -p solace-api --bin server -- --seed quotes.json
//! ```
//!
//! Mint a session token for a user (the production session authority
//! normally does this):
//!
//! ```
//! cargo run -p solace-api --bin server -- --issue-token user-1 --premium
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use chrono::Duration;
use clap::Parser;
use solace_api::{AppState, ConfiguredProvider, ServerConfig};
use solace_core::{
  clock::{OsSampler, SystemClock},
  quote::NewQuote,
  store::QuoteStore as _,
};
use solace_engine::auth::SessionGate;
use solace_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Solace quote service")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Mint and print a session token for the given user id, then exit.
  #[arg(long, value_name = "USER_ID")]
  issue_token: Option<String>,

  /// Mark the session issued with --issue-token as premium.
  #[arg(long, requires = "issue_token")]
  premium: bool,

  /// Lifetime in hours of the session issued with --issue-token.
  #[arg(long, default_value_t = 720, requires = "issue_token")]
  ttl_hours: i64,

  /// Ingest a JSON array of seed quotes, then exit.
  #[arg(long, value_name = "PATH")]
  seed: Option<PathBuf>,
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
    .add_source(config::Environment::with_prefix("SOLACE"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Open SQLite store.
  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Helper mode: seed the corpus and exit.
  if let Some(path) = &cli.seed {
    seed_corpus(&store, path).await?;
    return Ok(());
  }

  // Helper mode: mint a session token and exit.
  if let Some(user_id) = &cli.issue_token {
    let gate = SessionGate::new(store.clone(), Arc::new(SystemClock));
    let token = gate
      .issue(user_id, cli.premium, Duration::hours(cli.ttl_hours))
      .await
      .map_err(|e| anyhow::anyhow!("failed to issue token: {e}"))?;
    println!("{token}");
    return Ok(());
  }

  // Build application state.
  let provider = ConfiguredProvider::from_config(server_cfg.generation.clone())
    .map_err(|e| anyhow::anyhow!("failed to build generation provider: {e}"))?;

  let state = AppState::new(
    store,
    provider,
    Arc::new(SystemClock),
    Arc::new(OsSampler),
    &server_cfg.engine,
  );

  let app = solace_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Insert every quote from a JSON array file, skipping invalid entries.
async fn seed_corpus(store: &SqliteStore, path: &Path) -> anyhow::Result<()> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read seed file {path:?}"))?;
  let inputs: Vec<NewQuote> =
    serde_json::from_str(&raw).context("seed file is not a JSON quote array")?;

  let total = inputs.len();
  let mut inserted = 0usize;
  for input in inputs {
    match store.insert_quote(input).await {
      Ok(_) => inserted += 1,
      Err(e) => tracing::warn!(error = %e, "skipping invalid seed quote"),
    }
  }

  tracing::info!(inserted, total, "seeding finished");
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
