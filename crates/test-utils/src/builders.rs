#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use devstack::config::StackConfig;
use devstack::engine::{CommandCatalog, Orchestrator, Readiness};
use devstack::exec::EnvContext;

use crate::fake_runner::{FakeLocator, FakeStageRunner};

/// Install root used by every fake stack.
pub const FAKE_ROOT: &str = "/app";

/// Builder for `StackConfig` with test-friendly defaults: no readiness
/// delay and a short shutdown grace period.
pub struct StackConfigBuilder {
    config: StackConfig,
}

impl StackConfigBuilder {
    pub fn new() -> Self {
        let mut config = StackConfig::default();
        config.readiness = Readiness::FixedDelay(Duration::ZERO);
        config.shutdown_grace = Duration::from_millis(50);
        config.proxy.program = "nginx".to_string();
        Self { config }
    }

    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.config.shutdown_grace = grace;
        self
    }

    pub fn readiness(mut self, readiness: Readiness) -> Self {
        self.config.readiness = readiness;
        self
    }

    pub fn datastore_program(mut self, program: &str) -> Self {
        self.config.datastore.program = program.to_string();
        self
    }

    pub fn proxy_program(mut self, program: &str) -> Self {
        self.config.proxy.program = program.to_string();
        self
    }

    pub fn build(self) -> StackConfig {
        self.config
    }
}

impl Default for StackConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Environment snapshot rooted at [`FAKE_ROOT`].
pub fn fake_context() -> Arc<EnvContext> {
    EnvContext::from_vars(FAKE_ROOT, [("PATH", "/fake/bin"), ("HOME", "/home/dev")])
}

/// Orchestrator wired to the given fakes and config.
pub fn fake_orchestrator(
    runner: FakeStageRunner,
    locator: FakeLocator,
    config: StackConfig,
) -> Orchestrator<FakeStageRunner, FakeLocator> {
    let catalog = CommandCatalog::new(config, fake_context());
    Orchestrator::new(runner, locator, catalog)
}
