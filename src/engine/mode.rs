// src/engine/mode.rs

use std::fmt;

use tracing::warn;

use crate::errors::{DevstackError, Result};

/// Which server environment the application server runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeProfile {
    Development,
    Production,
}

impl ServeProfile {
    /// Value handed to the application server through its mode variable.
    pub fn as_env_value(&self) -> &'static str {
        match self {
            ServeProfile::Development => "development",
            ServeProfile::Production => "production",
        }
    }
}

/// Top-level behaviour of one invocation. Chosen once, never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    InitDatabase,
    GenerateTypes,
    RunTests { watch: bool },
    Serve(ServeProfile),
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::InitDatabase => write!(f, "initialize-database"),
            RunMode::GenerateTypes => write!(f, "generate-types"),
            RunMode::RunTests { watch: false } => write!(f, "run-tests"),
            RunMode::RunTests { watch: true } => write!(f, "run-tests (watch)"),
            RunMode::Serve(ServeProfile::Development) => write!(f, "serve-development"),
            RunMode::Serve(ServeProfile::Production) => write!(f, "serve-production"),
        }
    }
}

/// Raw mode flags as they come off the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeFlags {
    pub init_database: bool,
    pub gen_type: bool,
    pub test: bool,
    pub watch: bool,
    pub production: bool,
}

impl ModeFlags {
    /// Resolve the flags into exactly one [`RunMode`].
    ///
    /// `--init-database`, `--gen-type` and `--test` are mutually exclusive;
    /// `--watch` only makes sense with `--test`. `--production` only affects
    /// serving and is ignored (with a warning) for the one-shot modes.
    pub fn select(&self) -> Result<RunMode> {
        let candidates = [
            (self.init_database, "--init-database", RunMode::InitDatabase),
            (self.gen_type, "--gen-type", RunMode::GenerateTypes),
            (self.test, "--test", RunMode::RunTests { watch: self.watch }),
        ];
        let chosen: Vec<_> = candidates.into_iter().filter(|(set, _, _)| *set).collect();

        if chosen.len() > 1 {
            let names: Vec<&str> = chosen.iter().map(|(_, name, _)| *name).collect();
            return Err(DevstackError::Config(format!(
                "mode flags are mutually exclusive, got {}",
                names.join(" and ")
            )));
        }
        if self.watch && !self.test {
            return Err(DevstackError::Config(
                "--watch can only be used together with --test".to_string(),
            ));
        }

        let mode = match chosen.first() {
            Some((_, _, mode)) => *mode,
            None if self.production => RunMode::Serve(ServeProfile::Production),
            None => RunMode::Serve(ServeProfile::Development),
        };

        if self.production && !matches!(mode, RunMode::Serve(_)) {
            warn!(%mode, "--production has no effect outside serve mode; ignoring");
        }

        Ok(mode)
    }
}
