// src/engine/orchestrator.rs

//! Lifecycle orchestrator.
//!
//! Drives one run through `Idle → SelectingMode → Executing → Draining →
//! Terminated`. Serve modes pass through the `Supervising` sub-state while
//! blocked on the barrier.
//!
//! Every process the run starts is recorded in a [`ProcessTable`] that
//! lives outside the execution future. Whether execution finishes, fails
//! or is interrupted, the table is drained afterwards, so no child outlives
//! the orchestrator.

use std::fmt;
use std::future::Future;
use std::io::Write;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::engine::catalog::CommandCatalog;
use crate::engine::mode::{ModeFlags, RunMode};
use crate::engine::plan::{plan, Stage, Step};
use crate::errors::{DevstackError, Result};
use crate::exec::{wait_all, BoxedHandle, Locator, ProcessHandle, StageRunner};

/// Lifecycle states of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    SelectingMode,
    Executing,
    /// Serve modes only: blocked on the barrier over background processes.
    Supervising,
    Draining,
    Terminated,
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    Completed,
    /// Operator interrupt. Treated as a clean shutdown.
    Interrupted,
    Failed(DevstackError),
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Completed | RunOutcome::Interrupted => 0,
            RunOutcome::Failed(e) => e.exit_code(),
        }
    }

    pub fn into_result(self) -> Result<()> {
        match self {
            RunOutcome::Completed | RunOutcome::Interrupted => Ok(()),
            RunOutcome::Failed(e) => Err(e),
        }
    }
}

/// What happened while draining. Never turned into an error.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DrainReport {
    /// Commands that were sent a termination request.
    pub terminated: Vec<String>,
    /// Commands that ignored the request and were killed after the grace period.
    pub killed: Vec<String>,
    /// Cleanup errors, as `command: error` strings.
    pub failures: Vec<String>,
}

/// Result of one orchestrator run.
#[derive(Debug)]
pub struct RunReport {
    /// `None` if mode selection failed.
    pub mode: Option<RunMode>,
    pub outcome: RunOutcome,
    pub drain: DrainReport,
    /// Every phase the run entered, in order.
    pub phases: Vec<Phase>,
}

impl RunReport {
    pub fn exit_code(&self) -> i32 {
        self.outcome.exit_code()
    }
}

/// A process started during the current run.
struct Tracked {
    step: Step,
    handle: BoxedHandle,
}

impl AsMut<dyn ProcessHandle> for Tracked {
    fn as_mut(&mut self) -> &mut (dyn ProcessHandle + 'static) {
        &mut *self.handle
    }
}

/// Processes started by one run that have not been reaped yet.
///
/// Background processes stay until draining; a foreground process is
/// removed as soon as its exit status has been observed.
#[derive(Default)]
struct ProcessTable {
    entries: Vec<Tracked>,
}

impl ProcessTable {
    fn push(&mut self, step: Step, handle: BoxedHandle) -> usize {
        self.entries.push(Tracked { step, handle });
        self.entries.len() - 1
    }
}

/// Sequences stages for a run mode and owns shutdown of every process it
/// starts.
pub struct Orchestrator<R: StageRunner, L: Locator> {
    runner: R,
    locator: L,
    catalog: CommandCatalog,
    shutdown_grace: Duration,
    phase: Phase,
    history: Vec<Phase>,
}

impl<R: StageRunner, L: Locator> fmt::Debug for Orchestrator<R, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("phase", &self.phase)
            .field("shutdown_grace", &self.shutdown_grace)
            .finish_non_exhaustive()
    }
}

impl<R: StageRunner, L: Locator> Orchestrator<R, L> {
    pub fn new(runner: R, locator: L, catalog: CommandCatalog) -> Self {
        let shutdown_grace = catalog.config().shutdown_grace;
        Self {
            runner,
            locator,
            catalog,
            shutdown_grace,
            phase: Phase::Idle,
            history: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Run the mode selected by `flags` until it completes, fails, or
    /// `interrupt` resolves.
    ///
    /// Never returns early with processes still running: every exit path
    /// goes through draining.
    pub async fn run<F>(&mut self, flags: &ModeFlags, interrupt: F) -> RunReport
    where
        F: Future<Output = ()>,
    {
        self.history.clear();
        self.enter(Phase::Idle);
        self.enter(Phase::SelectingMode);

        let mode = match flags.select() {
            Ok(mode) => mode,
            Err(e) => {
                error!(error = %e, "invalid run mode selection");
                self.enter(Phase::Terminated);
                return RunReport {
                    mode: None,
                    outcome: RunOutcome::Failed(e),
                    drain: DrainReport::default(),
                    phases: std::mem::take(&mut self.history),
                };
            }
        };

        info!(%mode, "selected run mode");
        self.enter(Phase::Executing);

        let mut table = ProcessTable::default();
        let result = tokio::select! {
            biased;
            _ = interrupt => None,
            res = self.execute(mode, &mut table) => Some(res),
        };

        let outcome = match result {
            Some(Ok(())) => {
                info!(%mode, "run finished");
                RunOutcome::Completed
            }
            Some(Err(e)) => {
                error!(%mode, error = %e, "run failed");
                RunOutcome::Failed(e)
            }
            None => {
                info!(%mode, "interrupted; shutting down");
                RunOutcome::Interrupted
            }
        };

        self.enter(Phase::Draining);
        let drain = self.drain(table).await;
        self.enter(Phase::Terminated);

        RunReport {
            mode: Some(mode),
            outcome,
            drain,
            phases: std::mem::take(&mut self.history),
        }
    }

    /// Print the mode `flags` select and the command each stage would run,
    /// without launching anything.
    ///
    /// Tool lookups still happen, so a missing tool shows up as an `error:`
    /// line for its stage.
    pub fn dry_run<W: Write>(&self, flags: &ModeFlags, out: &mut W) -> Result<RunMode> {
        let mode = flags.select()?;
        let cfg = self.catalog.config();

        writeln!(out, "devstack dry-run")?;
        writeln!(out, "  mode = {mode}")?;
        writeln!(out, "  stack.shutdown_grace = {:?}", cfg.shutdown_grace)?;
        writeln!(out, "  datastore.program = {}", cfg.datastore.program)?;
        writeln!(out)?;

        let stages = plan(mode);
        writeln!(out, "stages ({}):", stages.len())?;
        for stage in stages {
            let (step, kind) = match stage {
                Stage::Background(step) => (step, "background"),
                Stage::Run(step) => (step, "run"),
                Stage::RunTolerant(step) => (step, "run, failure tolerated"),
                Stage::AwaitDataStore => {
                    writeln!(out, "  - await-datastore ({:?})", cfg.readiness)?;
                    continue;
                }
                Stage::Supervise => {
                    writeln!(out, "  - supervise (until a process exits or Ctrl-C)")?;
                    continue;
                }
            };

            writeln!(out, "  - {} [{kind}]", step.label())?;
            match self.catalog.command(step, &self.locator) {
                Ok(cmd) => {
                    writeln!(out, "      cmd: {cmd}")?;
                    writeln!(out, "      cwd: {}", cmd.working_dir().display())?;
                    for (k, v) in cmd.env_overrides() {
                        writeln!(out, "      env: {k}={v}")?;
                    }
                }
                Err(e) => writeln!(out, "      error: {e}")?,
            }
        }

        debug!(%mode, "dry-run complete (no execution)");
        Ok(mode)
    }

    fn enter(&mut self, phase: Phase) {
        debug!(from = ?self.phase, to = ?phase, "lifecycle transition");
        self.phase = phase;
        self.history.push(phase);
    }

    async fn execute(&mut self, mode: RunMode, table: &mut ProcessTable) -> Result<()> {
        for stage in plan(mode) {
            debug!(?stage, "entering stage");
            match stage {
                Stage::Background(step) => {
                    let command = self.catalog.command(step, &self.locator)?;
                    let handle = self.runner.launch(&command)?;
                    info!(step = step.label(), cmd = %command, "started background process");
                    table.push(step, handle);
                }
                Stage::Run(step) => self.run_foreground(step, table, false).await?,
                Stage::RunTolerant(step) => self.run_foreground(step, table, true).await?,
                Stage::AwaitDataStore => self.catalog.config().readiness.wait().await?,
                Stage::Supervise => {
                    self.enter(Phase::Supervising);
                    info!(
                        processes = table.entries.len(),
                        "supervising background processes; Ctrl-C to stop"
                    );
                    wait_all(&mut table.entries).await?;
                }
            }
        }
        Ok(())
    }

    /// Launch `step`, wait for it, and reap it from the table.
    ///
    /// The handle sits in the table while it runs so that an interrupt
    /// arriving mid-wait still gets it terminated.
    async fn run_foreground(
        &mut self,
        step: Step,
        table: &mut ProcessTable,
        tolerate_failure: bool,
    ) -> Result<()> {
        let command = self.catalog.command(step, &self.locator)?;
        let handle = self.runner.launch(&command)?;
        let index = table.push(step, handle);

        let outcome = table.entries[index].handle.wait().await;
        table.entries.remove(index);
        let outcome = outcome?;

        match outcome.into_result(&command) {
            Err(e) if tolerate_failure => {
                warn!(step = step.label(), error = %e, "ignoring failure of tolerant step");
                Ok(())
            }
            other => other,
        }
    }

    /// Terminate everything still in the table. Best effort: failures are
    /// logged and recorded in the report, never returned.
    async fn drain(&mut self, mut table: ProcessTable) -> DrainReport {
        let mut report = DrainReport::default();
        if table.entries.is_empty() {
            return report;
        }

        // Newest first, so dependents stop before what they depend on.
        for tracked in table.entries.iter_mut().rev() {
            let label = tracked.handle.descriptor().to_string();
            match tracked.handle.terminate() {
                Ok(()) => {
                    info!(step = tracked.step.label(), cmd = %label, "sent termination request");
                    report.terminated.push(label);
                }
                Err(e) => {
                    warn!(
                        step = tracked.step.label(),
                        cmd = %label,
                        error = %e,
                        "termination request failed"
                    );
                    report.failures.push(format!("{label}: {e}"));
                }
            }
        }

        for tracked in table.entries.iter_mut().rev() {
            let label = tracked.handle.descriptor().to_string();
            match timeout(self.shutdown_grace, tracked.handle.wait()).await {
                Ok(Ok(outcome)) => {
                    debug!(cmd = %label, exit_code = outcome.code(), "process stopped");
                }
                Ok(Err(e)) => {
                    warn!(cmd = %label, error = %e, "failed to reap process");
                    report.failures.push(format!("{label}: {e}"));
                }
                Err(_) => {
                    warn!(
                        cmd = %label,
                        grace = ?self.shutdown_grace,
                        "process did not exit after termination request; killing"
                    );
                    match tracked.handle.kill() {
                        Ok(()) => {
                            report.killed.push(label.clone());
                            if timeout(self.shutdown_grace, tracked.handle.wait()).await.is_err() {
                                report.failures.push(format!("{label}: still running after kill"));
                            }
                        }
                        Err(e) => report.failures.push(format!("{label}: {e}")),
                    }
                }
            }
        }

        info!(
            terminated = report.terminated.len(),
            killed = report.killed.len(),
            failures = report.failures.len(),
            "drained processes"
        );
        report
    }
}
