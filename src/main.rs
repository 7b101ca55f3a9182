mod app;
mod cache;
mod cli;
mod commands;
mod config;
mod db;
mod event;
mod notice;
mod query;
mod session;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing::{debug, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::notice::client::NoticeClient;
use crate::notice::types::Department;
use crate::session::SessionStore;

#[derive(Parser, Debug)]
#[command(name = "noticeboard")]
#[command(about = "A terminal client for the institute notice board")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/noticeboard/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Department the notice list starts filtered to
  #[arg(short, long)]
  department: Option<Department>,

  #[command(subcommand)]
  command: Option<cli::Command>,
}

/// Log to a daily file; the terminal belongs to the UI.
///
/// Filter comes from NOTICEBOARD_LOG, then RUST_LOG, defaulting to info.
fn init_logging() -> Result<WorkerGuard> {
  let log_dir = db::Database::data_dir()?.join("logs");
  std::fs::create_dir_all(&log_dir)?;

  let file_appender = tracing_appender::rolling::daily(&log_dir, "noticeboard.log");
  let (writer, guard) = tracing_appender::non_blocking(file_appender);

  let filter = EnvFilter::try_from_env("NOTICEBOARD_LOG")
    .or_else(|_| EnvFilter::try_from_default_env())
    .unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(writer).with_ansi(false))
    .init();

  Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = init_logging()?;

  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(department) = args.department {
    config.default_department = Some(department);
  }

  let client = NoticeClient::new(&config)?;
  let sessions = SessionStore::open()?;

  // A stored login makes admin actions available straight away
  let user = match sessions.load(&config.api.url) {
    Ok(Some(session)) => {
      debug!(
        server = %session.server_url,
        username = %session.username,
        since = %session.created_at,
        "restored session"
      );
      client.set_token(Some(session.token));
      Some(session.username)
    }
    Ok(None) => None,
    Err(e) => {
      warn!(error = %e, "ignoring unreadable session");
      None
    }
  };

  match args.command {
    Some(command) => cli::run(command, &config, client, &sessions).await,
    None => {
      let mut app = app::App::new(config, client, user);
      app.run().await
    }
  }
}
