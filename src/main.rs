mod app;
mod cache;
mod commands;
mod config;
mod dates;
mod event;
mod logging;
mod notes;
mod query;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;

use crate::config::StartView;
use crate::notes::GuestId;

#[derive(Parser, Debug)]
#[command(name = "calnotes")]
#[command(about = "A terminal calendar for notes kept on a remote server")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/calnotes/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Note server URL
  #[arg(short, long)]
  server: Option<String>,

  /// Guest whose notes to show
  #[arg(short, long)]
  guest: Option<GuestId>,

  /// Start in the week view
  #[arg(short, long)]
  week: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let _log_guard = logging::init()?;

  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(server) = args.server {
    config.server.url = server;
  }
  if let Some(guest) = args.guest {
    config.guest_id = Some(guest);
  }
  if args.week {
    config.start_view = StartView::Week;
  }

  let mut app = app::App::new(config).await?;
  app.run().await?;

  Ok(())
}
