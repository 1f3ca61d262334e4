// src/engine/mod.rs

//! Orchestration engine for devstack.
//!
//! This module ties together:
//! - run mode selection from CLI flags ([`mode`])
//! - the fixed stage plan for each mode ([`plan`])
//! - turning plan steps into commands ([`catalog`])
//! - waiting for the data store to come up ([`readiness`])
//! - the lifecycle state machine that executes a plan and drains every
//!   process it started ([`orchestrator`])

pub mod catalog;
pub mod mode;
pub mod orchestrator;
pub mod plan;
pub mod readiness;

pub use catalog::CommandCatalog;
pub use mode::{ModeFlags, RunMode, ServeProfile};
pub use orchestrator::{DrainReport, Orchestrator, Phase, RunOutcome, RunReport};
pub use plan::{plan, Stage, Step};
pub use readiness::Readiness;
