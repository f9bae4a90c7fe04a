mod app;
mod cache;
mod catapi;
mod config;
mod event;
mod gallery;
mod net;
#[cfg(test)]
mod testing;
mod ui;

use cache::{SqliteStorage, Synchronizer};
use catapi::client::{CatApiClient, ImageSource};
use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use net::{Connectivity, Offline, TcpProbe};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "catgrid")]
#[command(about = "A terminal image grid for The Cat API, with an offline cache")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/catgrid/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Never touch the network; browse the local cache only
  #[arg(long)]
  offline: bool,

  /// Increase log verbosity (-v debug, -vv trace)
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = init_logging(args.verbose)?;

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;

  let client = CatApiClient::new(&config.api)?;
  let api_host = client.host().to_string();

  let connectivity: Arc<dyn Connectivity> = if args.offline {
    Arc::new(Offline)
  } else {
    Arc::new(TcpProbe::from_config(&config)?)
  };

  let store = Arc::new(SqliteStorage::open(config.cache.path.as_deref())?);
  let sync = Arc::new(Synchronizer::new(
    store,
    Arc::new(client) as Arc<dyn ImageSource>,
    connectivity,
  ));

  // Initialize and run the app
  let gallery = Arc::new(gallery::GalleryController::new(sync));
  let mut app = app::App::new(gallery, api_host, args.offline);
  app.run().await?;

  Ok(())
}

/// Log to a file under the data directory; the terminal belongs to the UI.
fn init_logging(verbose: u8) -> Result<WorkerGuard> {
  let log_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?
    .join("catgrid");
  std::fs::create_dir_all(&log_dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", log_dir.display(), e))?;

  let (writer, guard) =
    tracing_appender::non_blocking(tracing_appender::rolling::never(&log_dir, "catgrid.log"));

  let default_filter = match verbose {
    0 => "catgrid=info",
    1 => "catgrid=debug",
    _ => "catgrid=trace",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(writer).with_ansi(false))
    .with(filter)
    .init();

  Ok(guard)
}
