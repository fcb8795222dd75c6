//! craftmap binary: explore the combine graph, export it, or count entries.

mod commands;

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use craftmap_config::CraftmapConfig;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "craftmap", version, about)]
struct Cli {
    /// Config file (default: $CRAFTMAP_CONFIG, then ~/.craftmap/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// SQLite store, overriding the configured path
    #[arg(long, global = true, value_name = "PATH")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Draw random pairs and record what they combine into (default)
    Explore(ExploreArgs),
    /// Write every known entry as a JSON snapshot
    Export {
        /// Output file, overriding the configured path
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Print the number of known entries
    Count,
}

#[derive(Debug, Default, Args)]
struct ExploreArgs {
    /// Stop after this many new combinations
    #[arg(long, value_name = "N")]
    max_successes: Option<u64>,

    /// Stop after this many draws, explored or not
    #[arg(long, value_name = "N")]
    max_attempts: Option<u64>,
}

fn init_tracing(log_file: Option<&Path>) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let mut init_warnings = Vec::new();
    let file_layer = log_file.and_then(|path| match open_log_file(path) {
        Ok(file) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        ),
        Err(e) => {
            init_warnings.push(format!("Failed to open log file {}: {e}", path.display()));
            None
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .with(env_filter)
        .init();

    for warning in init_warnings {
        tracing::warn!("{warning}");
    }
}

fn open_log_file(path: &Path) -> std::io::Result<fs::File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config decides where logs go, so it loads before tracing is up.
    let loaded = CraftmapConfig::load(cli.config.as_deref());
    let log_file = loaded
        .as_ref()
        .ok()
        .and_then(|c| c.as_ref())
        .and_then(CraftmapConfig::log_file);
    init_tracing(log_file.as_deref());

    let config = loaded?.unwrap_or_default();
    let store_path = cli.store.unwrap_or_else(|| config.store_path());

    match cli.command.unwrap_or(Command::Explore(ExploreArgs::default())) {
        Command::Explore(args) => {
            let mut budget = config.explore_budget();
            if let Some(n) = args.max_successes {
                budget.max_successes = n;
            }
            if let Some(n) = args.max_attempts {
                budget.max_attempts = n;
            }
            commands::explore(&store_path, config.client_config(), budget).await
        }
        Command::Export { out } => {
            let out = out.unwrap_or_else(|| config.export_path());
            commands::export(&store_path, &out)
        }
        Command::Count => commands::count(&store_path),
    }
}
