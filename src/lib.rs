// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod signal;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::engine::{CommandCatalog, Orchestrator};
use crate::errors::Result;
use crate::exec::{EnvContext, PathLocator, RealStageRunner};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - install root + environment snapshot
/// - stack config loading
/// - real stage runner and PATH locator
/// - the orchestrator
/// - Ctrl-C / SIGTERM handling
pub async fn run(args: CliArgs) -> Result<()> {
    let root = install_root(args.root.as_deref())?;
    let config = config::resolve(&root, args.config.as_deref())?;
    let context = EnvContext::capture(&root);
    let locator = PathLocator::new(Arc::clone(&context));
    let catalog = CommandCatalog::new(config, Arc::clone(&context));

    let mut orchestrator = Orchestrator::new(RealStageRunner::new(), locator, catalog);

    if args.dry_run {
        orchestrator.dry_run(&args.mode_flags(), &mut std::io::stdout().lock())?;
        return Ok(());
    }

    info!(root = %root.display(), "devstack starting");

    let report = orchestrator
        .run(&args.mode_flags(), signal::shutdown_signal())
        .await;

    debug!(phases = ?report.phases, drain = ?report.drain, "run report");
    report.outcome.into_result()
}

/// Absolute install root: `--root` if given, otherwise the working directory.
fn install_root(explicit: Option<&Path>) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(match explicit {
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => cwd.join(p),
        None => cwd,
    })
}
