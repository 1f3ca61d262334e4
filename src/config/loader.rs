// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{RawStackConfig, StackConfig};
use crate::errors::Result;

/// File looked up in the install root when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "Devstack.toml";

/// Load a stack file and return the raw, unvalidated `RawStackConfig`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawStackConfig> {
    let contents = fs::read_to_string(path.as_ref())?;
    let config: RawStackConfig = toml::from_str(&contents)?;
    Ok(config)
}

/// Load a stack file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<StackConfig> {
    let raw = load_from_path(path)?;
    StackConfig::try_from(raw)
}

/// Resolve the effective configuration for an install root.
///
/// - An explicit path must exist.
/// - Otherwise `<root>/Devstack.toml` is used if present, and the built-in
///   defaults if not.
pub fn resolve(root: &Path, explicit: Option<&Path>) -> Result<StackConfig> {
    if let Some(path) = explicit {
        debug!(path = %path.display(), "loading stack config");
        return load_and_validate(path);
    }

    let candidate = default_config_path(root);
    if candidate.is_file() {
        debug!(path = %candidate.display(), "loading stack config");
        load_and_validate(&candidate)
    } else {
        debug!("no stack config found; using built-in defaults");
        StackConfig::try_from(RawStackConfig::default())
    }
}

pub fn default_config_path(root: &Path) -> PathBuf {
    root.join(DEFAULT_CONFIG_FILE)
}
