//! pulse-server binary.
//!
//! Reads `pulse.toml` (or the path given with `--config`), opens the SQLite
//! job store, and either serves the query API over HTTP or runs one of the
//! ingestion commands.
//!
//! ```text
//! pulse-server serve
//! pulse-server import postings.jsonl
//! pulse-server ensure-roles
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use pulse_core::JobService;
use pulse_server::{ServerConfig, app, ingest};
use pulse_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Market Pulse job search server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "pulse.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the query API over HTTP.
  Serve,
  /// Import postings from a JSON Lines file, one document per line.
  Import { path: PathBuf },
  /// Upsert the default role documents.
  EnsureRoles,
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
  let server_cfg = ServerConfig::load(&cli.config)?;

  let store_path = server_cfg.store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command {
    Command::Serve => serve(store, server_cfg).await,
    Command::Import { path } => {
      let report = ingest::import_file(&store, &path).await?;
      let total = store.count().await.context("failed to count documents")?;
      println!(
        "imported {} postings ({} companies, {} skipped); store holds {total} documents",
        report.postings, report.companies, report.skipped
      );
      Ok(())
    }
    Command::EnsureRoles => {
      let n = ingest::ensure_roles(&store).await?;
      println!("ensured {n} roles");
      Ok(())
    }
  }
}

async fn serve(store: SqliteStore, server_cfg: ServerConfig) -> anyhow::Result<()> {
  let address = server_cfg.address();
  let service = Arc::new(JobService::new(Arc::new(store), server_cfg.query));
  let router = app(service);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, router).await.context("server error")?;

  Ok(())
}
