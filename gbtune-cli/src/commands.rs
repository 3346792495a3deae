//! Subcommand handlers.

use crate::{Commands, ConfigAction, RunArgs};
use gbtune_core::TuneConfig;
use gbtune_core::data::summarize;
use gbtune_core::pipeline::{load_table, prepare, run_comparison};
use std::path::{Path, PathBuf};

pub(crate) async fn handle_command(
    command: Commands,
    workspace: &Path,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    let config = gbtune_core::load_config(Some(workspace), config_path)
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    match command {
        Commands::Run(args) => handle_run(args, config).await,
        Commands::Summary { data, target, json } => {
            handle_summary(config, data, target, json).await
        }
        Commands::Config { action } => handle_config(action, &config),
    }
}

/// Fold CLI flags into the loaded configuration.
fn apply_overrides(config: &mut TuneConfig, args: &RunArgs) {
    if let Some(data) = &args.data {
        config.data.path = Some(data.clone());
    }
    if let Some(target) = &args.target {
        config.data.target = target.clone();
    }
    if let Some(strategies) = &args.strategies {
        config.restrict_to(strategies);
    }
    if let Some(trials) = args.trials {
        config.bayes.n_trials = trials;
    }
    if let Some(n_iter) = args.n_iter {
        config.random.n_iter = n_iter;
    }
    if let Some(folds) = args.folds {
        config.cv.folds = folds;
    }
    if let Some(test_size) = args.test_size {
        config.split.test_size = test_size;
    }
    if let Some(seed) = args.seed {
        config.split.seed = seed;
        config.cv.seed = seed;
        config.random.seed = seed;
        config.bayes.seed = seed;
    }
    if args.no_pruning {
        config.bayes.pruning = false;
    }
}

async fn handle_run(args: RunArgs, mut config: TuneConfig) -> anyhow::Result<()> {
    apply_overrides(&mut config, &args);
    let problems = config.validate();
    if !problems.is_empty() {
        anyhow::bail!("Invalid configuration:\n  {}", problems.join("\n  "));
    }
    tracing::debug!(
        strategies = ?config.enabled_strategies(),
        folds = config.cv.folds,
        "Effective configuration"
    );

    let table = load_table(&config).await?;
    if !args.json {
        println!("{}", summarize(&table, &config.data.target)?);
    }
    let split = prepare(&table, &config)?;

    // Search is CPU bound and runs on its own rayon pool.
    let report = tokio::task::spawn_blocking(move || run_comparison(&split, &config)).await??;

    if args.json {
        println!("{}", report.to_json()?);
    } else {
        println!("{report}");
        if let Some(best) = report.best() {
            println!(
                "Best: {} (test F1 {:.4}, cv F1 {:.4})",
                best.strategy, best.test.f1, best.cv_f1
            );
        }
    }
    Ok(())
}

async fn handle_summary(
    mut config: TuneConfig,
    data: Option<PathBuf>,
    target: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    if let Some(data) = data {
        config.data.path = Some(data);
    }
    if let Some(target) = target {
        config.data.target = target;
    }
    let table = load_table(&config).await?;
    let summary = summarize(&table, &config.data.target)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{summary}");
    }
    Ok(())
}

fn handle_config(action: ConfigAction, config: &TuneConfig) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", config.to_toml()?);
            Ok(())
        }
    }
}
