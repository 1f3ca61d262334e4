// src/exec/mod.rs

//! Process execution layer.
//!
//! Everything the orchestrator needs to start, wait on and stop external
//! programs, with no knowledge of what those programs do.
//!
//! - [`env`] holds the immutable environment snapshot for a run.
//! - [`command`] defines the immutable `CommandDescriptor`.
//! - [`locate`] resolves logical tool names to executables.
//! - [`backend`] provides the `StageRunner` / `ProcessHandle` traits that
//!   tests replace with fakes.
//! - [`process`] is the real `tokio::process` implementation.
//! - [`barrier`] implements the ordered `wait_all`.

pub mod backend;
pub mod barrier;
pub mod command;
pub mod env;
pub mod locate;
pub mod process;

pub use backend::{BoxedHandle, ExitOutcome, ProcessHandle, StageRunner, WaitFuture};
pub use barrier::wait_all;
pub use command::CommandDescriptor;
pub use env::EnvContext;
pub use locate::{Locator, PathLocator};
pub use process::{ChildProcess, RealStageRunner};
