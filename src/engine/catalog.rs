// src/engine/catalog.rs

//! Turns plan steps into concrete command descriptors.

use std::sync::Arc;

use crate::config::StackConfig;
use crate::engine::plan::Step;
use crate::errors::Result;
use crate::exec::locate::resolve_program;
use crate::exec::{CommandDescriptor, EnvContext, Locator};

/// Knows the command line for every [`Step`] of the stack.
#[derive(Debug, Clone)]
pub struct CommandCatalog {
    config: StackConfig,
    context: Arc<EnvContext>,
}

impl CommandCatalog {
    pub fn new(config: StackConfig, context: Arc<EnvContext>) -> Self {
        Self { config, context }
    }

    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    /// Build the descriptor for `step`, resolving its program through
    /// `locator` unless it is configured as a direct path.
    pub fn command(&self, step: Step, locator: &dyn Locator) -> Result<CommandDescriptor> {
        let cfg = &self.config;
        let root = self.context.root();
        let program = |p: &str| resolve_program(p, root, locator);
        let new = |p: &str| -> Result<CommandDescriptor> {
            Ok(CommandDescriptor::new(&self.context, program(p)?))
        };

        let cmd = match step {
            Step::DataStore => new(&cfg.datastore.program)?.args(&cfg.datastore.args),
            Step::TypeGen => new(&cfg.typegen.runner)?
                .arg(&cfg.typegen.package)
                .arg("--db")
                .arg(root.join(&cfg.datastore.data_file))
                .arg("--out")
                .arg(root.join(&cfg.typegen.out)),
            Step::BackendCompile => new(&cfg.backend.compiler)?
                .arg("-p")
                .arg(&cfg.backend.tsconfig),
            Step::DatabaseInit => {
                new(&cfg.backend.runtime)?.arg(root.join(&cfg.backend.init_script))
            }
            Step::ClientBuild => new(&cfg.client.package_manager)?
                .arg("run")
                .arg(&cfg.client.build_script),
            Step::TestRunner { watch } => new(&cfg.tests.package_manager)?
                .arg("run")
                .arg(&cfg.tests.script)
                .arg(if watch { "watch" } else { "run" }),
            Step::AppServer(profile) => new(&cfg.backend.runtime)?
                .arg(root.join(&cfg.backend.entry))
                .env(&cfg.backend.mode_variable, profile.as_env_value()),
            Step::ProxyStop => new(&cfg.proxy.program)?
                .args(["-s", "stop"])
                .current_dir(&cfg.proxy.dir),
            Step::ProxyStart => new(&cfg.proxy.program)?
                .args(["-p", ".", "-c"])
                .arg(&cfg.proxy.conf)
                .current_dir(&cfg.proxy.dir),
        };

        Ok(cmd)
    }
}
