//! Vigil - file integrity and quarantine CLI
//!
//! ## Commands
//!
//! - `baseline`: Scan the repository and save the integrity baseline
//! - `verify`: Report files whose content drifted from the baseline
//! - `watch`: Report drift and recalibrate the baseline
//! - `diff`: Show added, removed and changed files against the baseline
//! - `prune`: Quarantine orphaned files (simulated unless `--execute`)

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info, Level};

use vigil_core::metrics::METRICS;
use vigil_core::{
    collect_entries, diff_baseline, verify, DocumentOrphanDetector, EngineConfig, FileEntry,
    Fingerprinter, IntegrityStore, QuarantineScheduler, RunMode, SilentWatchdog,
};
use vigil_state::{JsonFileStore, StateStore};

#[derive(Parser)]
#[command(name = "vigil")]
#[command(version = vigil_core::VERSION)]
#[command(about = "File integrity baselines and orphan quarantine", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON log lines and machine-readable command output
    #[arg(long, global = true)]
    json: bool,

    /// Repository root
    #[arg(long, global = true, env = "VIGIL_ROOT", default_value = ".")]
    root: PathBuf,

    /// Config file (default: vigil.config.json under the root, if present)
    #[arg(long, global = true, env = "VIGIL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the repository and save the integrity baseline
    Baseline,

    /// Verify the repository against the saved baseline
    Verify {
        /// Exit with status 1 when drift is found
        #[arg(long)]
        fail_on_drift: bool,
    },

    /// Report drift and absorb it into the baseline
    Watch {
        /// Report drift without recalibrating the baseline
        #[arg(long)]
        no_reset: bool,
    },

    /// Show added, removed and changed files against the baseline
    Diff,

    /// Quarantine orphaned files into the holding area
    Prune {
        /// JSON list of {"arquivo", "referenciado"?} candidates
        #[arg(long)]
        candidates: PathBuf,

        /// Actually move files and persist state (default: simulated)
        #[arg(long)]
        execute: bool,

        /// Maximum concurrent moves
        #[arg(long)]
        concurrency: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    vigil_core::telemetry::init_tracing(cli.json, level);

    let concurrency = match &cli.command {
        Commands::Prune { concurrency, .. } => *concurrency,
        _ => None,
    };
    let config = resolve_config(&cli.root, cli.config.as_deref(), concurrency)?;
    let state: Arc<dyn StateStore> = Arc::new(JsonFileStore::new(&config.root));
    let store = IntegrityStore::new(state.clone(), Fingerprinter::new(&config.hash_algorithms));

    let code = match cli.command {
        Commands::Baseline => cmd_baseline(&config, &store, cli.json).await,
        Commands::Verify { fail_on_drift } => {
            cmd_verify(&config, &store, cli.json, fail_on_drift).await
        }
        Commands::Watch { no_reset } => cmd_watch(&config, store, cli.json, !no_reset).await,
        Commands::Diff => cmd_diff(&config, &store, cli.json).await,
        Commands::Prune {
            candidates,
            execute,
            ..
        } => cmd_prune(&config, state, &candidates, execute, cli.json).await,
    };

    METRICS.flush();
    code
}

/// Defaults, then the config file, then `VIGIL_*` variables, then flags.
fn resolve_config(
    root: &Path,
    config_path: Option<&Path>,
    concurrency: Option<usize>,
) -> Result<EngineConfig> {
    let config_path = config_path.map(|p| {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            root.join(p)
        }
    });
    let mut config = EngineConfig::load(root, config_path.as_deref())
        .context("failed to load configuration")?;
    config
        .apply_env_overrides()
        .context("invalid VIGIL_* environment override")?;
    if let Some(n) = concurrency {
        config.move_concurrency = n;
    }
    config.validate()?;
    debug!(?config, "configuration resolved");
    Ok(config)
}

async fn scan(config: &EngineConfig) -> Result<Vec<FileEntry>> {
    let root = config.root.clone();
    let exclude = vec![config.state_dir.clone(), config.abandoned_dir.clone()];
    let entries = tokio::task::spawn_blocking(move || collect_entries(&root, &exclude))
        .await
        .context("scan task panicked")?
        .with_context(|| format!("failed to scan {}", config.root.display()))?;
    debug!(files = entries.len(), "repository scanned");
    Ok(entries)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn cmd_baseline(config: &EngineConfig, store: &IntegrityStore, json: bool) -> Result<ExitCode> {
    let entries = scan(config).await?;
    let saved = store
        .save(&entries, &config.integrity_path)
        .await
        .context("failed to save integrity baseline")?;

    if json {
        print_json(&serde_json::json!({
            "baseline": config.resolve(&config.integrity_path),
            "records": saved,
        }))?;
    } else {
        println!(
            "Saved baseline: {} file(s) -> {}",
            saved,
            config.resolve(&config.integrity_path).display()
        );
    }
    Ok(ExitCode::SUCCESS)
}

async fn cmd_verify(
    config: &EngineConfig,
    store: &IntegrityStore,
    json: bool,
    fail_on_drift: bool,
) -> Result<ExitCode> {
    let entries = scan(config).await?;
    let baseline = store.load(&config.integrity_path).await;
    let result = verify(store.fingerprinter(), &entries, &baseline);

    if json {
        print_json(&result)?;
    } else if result.is_clean() {
        println!("OK: {} baseline record(s), no drift", result.verified);
    } else {
        println!(
            "DRIFT: {} of {} baseline record(s) changed",
            result.corrupted.len(),
            result.verified
        );
        for path in &result.corrupted {
            println!("  {}", path);
        }
    }

    if fail_on_drift && !result.is_clean() {
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}

async fn cmd_watch(
    config: &EngineConfig,
    store: IntegrityStore,
    json: bool,
    auto_reset: bool,
) -> Result<ExitCode> {
    let entries = scan(config).await?;
    let report = SilentWatchdog::new(store)
        .watch(&entries, &config.integrity_path, auto_reset)
        .await;

    if json {
        print_json(&report)?;
    } else if report.drifted.is_empty() {
        println!("OK: no drift");
    } else {
        println!(
            "{} file(s) drifted{}",
            report.drifted.len(),
            if report.baseline_reset {
                ", baseline recalibrated"
            } else {
                ""
            }
        );
    }
    Ok(ExitCode::SUCCESS)
}

async fn cmd_diff(config: &EngineConfig, store: &IntegrityStore, json: bool) -> Result<ExitCode> {
    let entries = scan(config).await?;
    let baseline = store.load(&config.integrity_path).await;
    let diff = diff_baseline(store.fingerprinter(), &entries, &baseline);

    if json {
        print_json(&diff)?;
        return Ok(ExitCode::SUCCESS);
    }
    if diff.is_empty() {
        println!("No differences from baseline");
        return Ok(ExitCode::SUCCESS);
    }
    for path in &diff.added {
        println!("+ {}", path);
    }
    for path in &diff.removed {
        println!("- {}", path);
    }
    for path in &diff.changed {
        println!("~ {}", path);
    }
    Ok(ExitCode::SUCCESS)
}

async fn cmd_prune(
    config: &EngineConfig,
    state: Arc<dyn StateStore>,
    candidates: &Path,
    execute: bool,
    json: bool,
) -> Result<ExitCode> {
    let candidates = if candidates.is_absolute() {
        candidates.to_path_buf()
    } else {
        std::env::current_dir()
            .context("cannot resolve current directory")?
            .join(candidates)
    };
    let detector = Arc::new(DocumentOrphanDetector::new(state.clone(), candidates));
    let scheduler = QuarantineScheduler::new(state, detector, config.clone());
    let mode = RunMode::from_execute_flag(execute);

    let outcome = scheduler.run(mode).await.context("prune run failed")?;

    if json {
        print_json(&outcome)?;
        return Ok(ExitCode::SUCCESS);
    }

    let label = if mode.is_simulated() { "simulated" } else { "executed" };
    println!(
        "Prune {} (run {}): {} pruned, {} kept",
        label,
        outcome.run_id,
        outcome.report.total_pruned,
        outcome.report.total_kept
    );
    if mode.is_simulated() {
        for plan in &outcome.planned {
            println!("  would move {} -> {}", plan.source.display(), plan.target.display());
        }
        if outcome.report.total_pruned > 0 {
            println!("Re-run with --execute to apply.");
        }
    } else {
        for path in &outcome.moved {
            println!("  moved {}", path);
        }
    }
    for failure in &outcome.failures {
        println!("  failed {}: {}", failure.path, failure.error);
    }
    for err in &outcome.persist_errors {
        println!("  not persisted: {}", err);
    }
    info!(
        moved = outcome.moved.len(),
        failed = outcome.failures.len(),
        "prune complete"
    );
    Ok(ExitCode::SUCCESS)
}
