// src/errors.rs

//! Crate-wide error type and helpers.
//!
//! Every failure the orchestrator can surface maps to one variant here, and
//! each variant knows which process exit code it should produce.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DevstackError {
    /// Conflicting flags, bad config values. Raised before anything spawns.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tool not found: '{tool}' is not on the executable search path")]
    ToolNotFound { tool: String },

    #[error("Failed to spawn `{command}`: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Process `{command}` exited with code {exit_code}")]
    ChildProcessFailed { command: String, exit_code: i32 },

    #[error("Dependency at {address} not ready after {waited:?}")]
    DependencyNotReady { address: String, waited: Duration },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DevstackError {
    /// Process exit code the binary should terminate with for this error.
    ///
    /// A failing child propagates its own code so that wrapping scripts see
    /// the same status they would have seen running the tool directly.
    pub fn exit_code(&self) -> i32 {
        match self {
            DevstackError::ChildProcessFailed { exit_code, .. } => {
                if (1..=255).contains(exit_code) {
                    *exit_code
                } else {
                    1
                }
            }
            DevstackError::Config(_) => 2,
            _ => 1,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DevstackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_failure_propagates_its_exit_code() {
        let err = DevstackError::ChildProcessFailed {
            command: "tsc -p tsconfig.server.json".into(),
            exit_code: 3,
        };
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("tsc -p tsconfig.server.json"));
    }

    #[test]
    fn out_of_range_child_codes_collapse_to_one() {
        for code in [-1, 0, 256, 1000] {
            let err = DevstackError::ChildProcessFailed {
                command: "x".into(),
                exit_code: code,
            };
            assert_eq!(err.exit_code(), 1, "code {code}");
        }
    }

    #[test]
    fn config_errors_exit_with_two() {
        assert_eq!(DevstackError::Config("bad".into()).exit_code(), 2);
        assert_eq!(
            DevstackError::ToolNotFound { tool: "pnpm".into() }.exit_code(),
            1
        );
    }
}
