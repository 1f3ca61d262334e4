// src/cli.rs

//! Command-line surface of the `devstack` binary.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::engine::ModeFlags;

/// Command-line arguments for `devstack`.
///
/// Mode flags are parsed leniently here and resolved by
/// [`ModeFlags::select`], so conflicting flags surface as a regular
/// configuration error.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "devstack",
    version,
    about = "Start, sequence and tear down the local web application stack.",
    long_about = None
)]
pub struct CliArgs {
    /// Start the data store, compile the backend and run database initialisation.
    #[arg(long)]
    pub init_database: bool,

    /// Start the data store just long enough to regenerate client types.
    #[arg(long)]
    pub gen_type: bool,

    /// Run the test suite against a live data store.
    #[arg(long)]
    pub test: bool,

    /// With --test: keep the test runner watching for changes.
    #[arg(long)]
    pub watch: bool,

    /// Serve in production: build the client bundle and restart the reverse proxy.
    #[arg(long, visible_alias = "prod")]
    pub production: bool,

    /// Install root the stack lives in.
    ///
    /// Default: the current working directory.
    #[arg(long, value_name = "PATH")]
    pub root: Option<PathBuf>,

    /// Stack config file (TOML).
    ///
    /// Default: `Devstack.toml` in the install root, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DEVSTACK_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the selected mode and its commands without running anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    pub fn mode_flags(&self) -> ModeFlags {
        ModeFlags {
            init_database: self.init_database,
            gen_type: self.gen_type,
            test: self.test,
            watch: self.watch,
            production: self.production,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// The level as an `EnvFilter` directive.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Parse the process arguments; clap exits with usage text on error.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
