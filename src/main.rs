mod api;
mod config;
mod constants;
mod history;
mod logging;
mod model;
mod session;
mod storage;
mod ui;
mod utils;
mod youtube;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use api::ApiClient;
use config::{Config, HistoryMode, Overrides, Settings};
use constants::constants;
use history::{Backing, HistoryStore};
use session::{SessionError, VideoSession};
use storage::FileStore;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Look up and download YouTube videos through a yd server", long_about = None)]
struct Args {
  /// Base URL of the server API (default: from prefs.toml, then http://127.0.0.1:8001/api)
  #[arg(long, global = true)]
  api_url: Option<String>,

  /// Where search history is kept
  #[arg(long, global = true, value_enum)]
  mode: Option<HistoryMode>,

  /// Directory downloaded videos are saved to
  #[arg(short, long, global = true)]
  output_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Look up a video and list its resolutions
  Search { url: String },
  /// Look up a video and download one of its resolutions
  Download {
    url: String,
    /// Resolution to download, e.g. 720p
    #[arg(short, long)]
    resolution: Option<String>,
  },
  /// Show or manage search history
  History {
    #[command(subcommand)]
    action: Option<HistoryAction>,
  },
  /// Print shell completions
  Completions { shell: Shell },
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
  /// List history: most recent first locally, in server order otherwise
  List,
  /// Show one history entry by its index in the listing
  Show { index: usize },
  /// Delete one entry and its downloaded files (server history only)
  Remove {
    id: i64,
    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,
  },
  /// Delete all history and downloaded files
  Clear {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,
  },
}

// --- Helpers ---

/// Ask a yes/no question on stdin. Anything but `y`/`yes` is a no.
fn confirm(question: &str) -> Result<bool> {
  let mut stdout = std::io::stdout();
  write!(stdout, "{} [y/N] ", question)?;
  stdout.flush()?;
  let mut answer = String::new();
  std::io::stdin().lock().read_line(&mut answer).context("Failed to read confirmation")?;
  Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn open_history(settings: &Settings, client: &Arc<ApiClient>) -> HistoryStore {
  let cache = || Box::new(FileStore::new(&settings.data_dir, &constants().history_storage_key));
  let backing = match settings.history_mode {
    HistoryMode::Local => Backing::Local(cache()),
    HistoryMode::Mirrored => Backing::Mirrored { cache: cache(), remote: client.clone() },
    HistoryMode::Remote => Backing::Remote(client.clone()),
  };
  HistoryStore::open(backing)
}

/// Report a failed search/download with the message the session recorded for display.
fn session_failure(session: &VideoSession, err: SessionError) -> anyhow::Error {
  match ui::render_status(session.state()) {
    Some(status) => anyhow::anyhow!(status),
    None => err.into(),
  }
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Command::Completions { shell } = args.command {
    clap_complete::generate(shell, &mut Args::command(), "yd", &mut std::io::stdout());
    return Ok(());
  }

  let overrides = Overrides { api_url: args.api_url, history_mode: args.mode, download_dir: args.output_dir };
  let settings = Settings::resolve(Config::load(), overrides);

  std::fs::create_dir_all(&settings.data_dir)
    .with_context(|| format!("Failed to create data dir {}", settings.data_dir.display()))?;
  let _guard = logging::init(&settings.data_dir);
  info!(api_url = %settings.api_url, mode = ?settings.history_mode, "yd: starting");

  run(args.command, &settings).await
}

async fn run(command: Command, settings: &Settings) -> Result<()> {
  let client = Arc::new(ApiClient::new(&settings.api_url, settings.clear_endpoint));
  let mut history = open_history(settings, &client);
  let mut session = VideoSession::new(client.clone(), settings.download_dir.clone());

  if history.is_remote_backed() {
    history.load().await;
  }

  let mut out = std::io::stdout();
  match command {
    Command::Search { url } => {
      session.search(&url, &mut history).await.map_err(|e| session_failure(&session, e))?;
      if let Some(video) = session.current_video() {
        write!(out, "{}", ui::render_video(video))?;
      }
    }
    Command::Download { url, resolution } => {
      let url = url.trim();
      session.search(url, &mut history).await.map_err(|e| session_failure(&session, e))?;
      let Some(video) = session.current_video() else { return Ok(()) };
      let Some(resolution) = resolution else {
        write!(out, "{}", ui::render_video(video))?;
        bail!("No resolution selected. Pass one with --resolution.");
      };
      let path = session.download(url, &resolution, &mut history).await.map_err(|e| session_failure(&session, e))?;
      write!(out, "{}", ui::render_saved(&path))?;
    }
    Command::History { action } => match action.unwrap_or(HistoryAction::List) {
      HistoryAction::List => {
        write!(out, "{}", ui::render_history(history.records(), Utc::now()))?;
      }
      HistoryAction::Show { index } => {
        let Some(record) = history.get(index).cloned() else {
          bail!("No history entry at index {} ({} entries).", index, history.len());
        };
        session.select_from_history(record);
        if let Some(video) = session.current_video() {
          write!(out, "{}", ui::render_video(video))?;
        }
      }
      HistoryAction::Remove { id, yes } => {
        if !yes && !confirm(&format!("Delete history entry #{} and its downloaded files?", id))? {
          writeln!(out, "Cancelled.")?;
          return Ok(());
        }
        session.remove_from_history(id, &mut history).await?;
        writeln!(out, "Removed #{}.", id)?;
      }
      HistoryAction::Clear { yes } => {
        if !history.is_remote_backed() && history.is_empty() {
          writeln!(out, "History is already empty.")?;
          return Ok(());
        }
        if !yes && !confirm("Delete the entire history and all downloaded files? This cannot be undone.")? {
          writeln!(out, "Cancelled.")?;
          return Ok(());
        }
        let summary = session.clear_history(&mut history).await?;
        write!(out, "{}", ui::render_clear_summary(summary))?;
      }
    },
    Command::Completions { .. } => {}
  }
  Ok(())
}
