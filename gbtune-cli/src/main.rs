//! gbtune CLI: compare grid, random, and TPE search for a gradient-boosted
//! classifier on a CSV dataset.

mod commands;

use clap::Parser;
use gbtune_core::Strategy;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// gbtune: hyperparameter search comparison for gradient-boosted trees
#[derive(Parser, Debug)]
#[command(name = "gbtune", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (searched for gbtune.toml)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    /// Also write JSON logs to this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum Commands {
    /// Summarize the data, tune with every enabled strategy, and compare
    Run(RunArgs),
    /// Print summary statistics for a CSV file
    Summary {
        /// CSV file (defaults to data.path)
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Response column (defaults to data.target)
        #[arg(short, long)]
        target: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args, Debug, Default)]
pub(crate) struct RunArgs {
    /// CSV file (defaults to data.path)
    #[arg(short, long)]
    pub data: Option<PathBuf>,
    /// Response column (defaults to data.target)
    #[arg(short, long)]
    pub target: Option<String>,
    /// Strategies to run, comma separated (grid, random, bayes)
    #[arg(short, long, value_delimiter = ',')]
    pub strategies: Option<Vec<Strategy>>,
    /// Number of TPE trials
    #[arg(long)]
    pub trials: Option<usize>,
    /// Number of random search iterations
    #[arg(long)]
    pub n_iter: Option<usize>,
    /// Number of cross-validation folds
    #[arg(long)]
    pub folds: Option<usize>,
    /// Fraction of rows held out for testing
    #[arg(long)]
    pub test_size: Option<f64>,
    /// Seed for the split, folds, and samplers
    #[arg(long)]
    pub seed: Option<u64>,
    /// Disable median pruning of TPE trials
    #[arg(long)]
    pub no_pruning: bool,
    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum ConfigAction {
    /// Show the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    // Human-readable layer for stderr (always active)
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    // JSON file layer when a log directory is given
    let mut _guard = None;
    let json_layer = match &cli.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, "gbtune.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            _guard = Some(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_filter(EnvFilter::new("debug")),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    commands::handle_command(cli.command, &workspace, cli.config.as_deref()).await
}
