//! factgraph server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store, seeds the configured organizations and sources, and serves the fact
//! API over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for a user's `password_hash`:
//!
//! ```
//! cargo run -p factgraph-server -- --hash-password
//! ```

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use factgraph_api::{AppState, UserDirectory, api_router};
use factgraph_core::{
  event::{ChannelEventSink, TriggerEvent},
  store::FactStore,
};
use factgraph_store_sqlite::SqliteStore;
use rand_core::OsRng;
use tokio::{net::TcpListener, sync::mpsc};
use tower_http::trace::TraceLayer;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

use settings::{ServerConfig, expand_tilde};

#[derive(Parser)]
#[command(author, version, about = "factgraph fact server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let password = read_password()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let server_cfg = ServerConfig::load(&cli.config).context("failed to load configuration")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  seed(&store, &server_cfg).await?;

  let (events, rx) = ChannelEventSink::new();
  tokio::spawn(drain_events(rx));

  let state = AppState::new(
    Arc::new(store),
    events,
    UserDirectory::new(server_cfg.users.clone()),
  );
  let app = api_router(state).layer(TraceLayer::new_for_http());

  let address = server_cfg.address();
  info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Insert the configured organizations and sources. Rows that already exist
/// are left as they are.
async fn seed(store: &SqliteStore, cfg: &ServerConfig) -> anyhow::Result<()> {
  for organization in &cfg.organizations {
    store
      .save_organization(organization.clone())
      .await
      .with_context(|| format!("failed to seed organization {}", organization.name))?;
  }
  for source in &cfg.sources {
    store
      .save_source(source.clone())
      .await
      .with_context(|| format!("failed to seed source {}", source.name))?;
  }
  info!(
    organizations = cfg.organizations.len(),
    sources = cfg.sources.len(),
    "seeded provenance"
  );
  Ok(())
}

/// Log every trigger event until all senders are dropped.
async fn drain_events(mut rx: mpsc::UnboundedReceiver<TriggerEvent>) {
  while let Some(event) = rx.recv().await {
    let parameters = serde_json::to_string(&event.context_parameters).unwrap_or_default();
    info!(
      event = %event.name,
      organization = ?event.organization,
      access_mode = %event.access_mode,
      %parameters,
      "trigger event"
    );
  }
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}
