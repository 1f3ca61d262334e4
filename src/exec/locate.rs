// src/exec/locate.rs

//! Resolving logical tool names ("tsc", "pnpm", ...) to executables.
//!
//! Programs configured with a path separator are taken literally (relative
//! to the install root) and never touch the locator; bare names are looked
//! up on the `PATH` of the captured environment.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::errors::{DevstackError, Result};
use crate::exec::env::EnvContext;

/// Capability for finding executables on the host.
pub trait Locator: Send + Sync {
    fn locate(&self, tool: &str) -> Result<PathBuf>;
}

/// Searches the `PATH` variable of an [`EnvContext`] snapshot.
#[derive(Debug, Clone)]
pub struct PathLocator {
    context: Arc<EnvContext>,
}

impl PathLocator {
    pub fn new(context: Arc<EnvContext>) -> Self {
        Self { context }
    }
}

impl Locator for PathLocator {
    fn locate(&self, tool: &str) -> Result<PathBuf> {
        let search_path = self.context.get("PATH");
        match which::which_in(tool, search_path, self.context.root()) {
            Ok(path) => {
                debug!(tool, path = %path.display(), "located tool");
                Ok(path)
            }
            Err(_) => Err(DevstackError::ToolNotFound {
                tool: tool.to_string(),
            }),
        }
    }
}

/// True if `program` names a file path rather than a logical tool.
pub fn is_direct_path(program: &str) -> bool {
    program.contains('/') || program.contains(std::path::MAIN_SEPARATOR)
}

/// Turn a configured program string into a concrete executable path.
pub fn resolve_program(program: &str, root: &Path, locator: &dyn Locator) -> Result<PathBuf> {
    if is_direct_path(program) {
        Ok(root.join(program))
    } else {
        locator.locate(program)
    }
}
