// src/exec/backend.rs

//! Pluggable stage runner abstraction.
//!
//! The orchestrator talks to a `StageRunner` instead of `tokio::process`
//! directly. Production code uses [`RealStageRunner`](super::RealStageRunner);
//! tests swap in a fake that records spawn/wait/terminate calls without
//! starting real processes.

use std::future::Future;
use std::pin::Pin;

use crate::errors::{DevstackError, Result};
use crate::exec::command::CommandDescriptor;

/// How a process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Success,
    /// Non-zero exit. Processes killed by a signal report `128 + signal`.
    Failed(i32),
}

impl ExitOutcome {
    pub fn from_code(code: i32) -> Self {
        if code == 0 {
            ExitOutcome::Success
        } else {
            ExitOutcome::Failed(code)
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            ExitOutcome::Success => 0,
            ExitOutcome::Failed(code) => *code,
        }
    }

    pub fn success(&self) -> bool {
        matches!(self, ExitOutcome::Success)
    }

    /// Turn a non-zero exit into a `ChildProcessFailed` error for `command`.
    pub fn into_result(self, command: &CommandDescriptor) -> Result<()> {
        match self {
            ExitOutcome::Success => Ok(()),
            ExitOutcome::Failed(exit_code) => Err(DevstackError::ChildProcessFailed {
                command: command.to_string(),
                exit_code,
            }),
        }
    }
}

pub type WaitFuture<'a> = Pin<Box<dyn Future<Output = Result<ExitOutcome>> + Send + 'a>>;

/// A live child process.
///
/// Owned by whoever launched it until its exit status has been observed.
pub trait ProcessHandle: Send {
    fn descriptor(&self) -> &CommandDescriptor;

    /// Wait for the process to exit. Dropping the future does not affect the
    /// process, so this is safe to race against an interrupt.
    fn wait(&mut self) -> WaitFuture<'_>;

    /// Ask the process to stop (SIGTERM on Unix). Non-blocking.
    fn terminate(&mut self) -> Result<()>;

    /// Forcefully stop the process.
    fn kill(&mut self) -> Result<()>;
}

pub type BoxedHandle = Box<dyn ProcessHandle>;

/// Capability for turning command descriptors into running processes.
pub trait StageRunner: Send {
    /// Start `command` without waiting for it. Fails with
    /// [`DevstackError::SpawnFailed`] if the OS cannot start the program.
    fn launch(&mut self, command: &CommandDescriptor) -> Result<BoxedHandle>;

    /// Launch and block until exit, returning the raw outcome.
    fn run_to_completion<'a>(
        &'a mut self,
        command: &'a CommandDescriptor,
    ) -> WaitFuture<'a> {
        Box::pin(async move {
            let mut handle = self.launch(command)?;
            handle.wait().await
        })
    }
}
