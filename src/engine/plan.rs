// src/engine/plan.rs

//! Pure mapping from a [`RunMode`] to the ordered stages it executes.
//!
//! Plans contain no paths and spawn nothing; the orchestrator turns each
//! [`Step`] into a command through the catalog only when the stage runs.

use crate::engine::mode::{RunMode, ServeProfile};

/// One external program the stack knows how to invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Bundled database server.
    DataStore,
    /// Client type generation against the running data store.
    TypeGen,
    /// Compile the backend sources.
    BackendCompile,
    /// One-shot database initialisation script.
    DatabaseInit,
    /// Production client bundle.
    ClientBuild,
    TestRunner { watch: bool },
    AppServer(ServeProfile),
    /// Stop a previously running reverse proxy instance.
    ProxyStop,
    ProxyStart,
}

impl Step {
    pub fn label(&self) -> &'static str {
        match self {
            Step::DataStore => "datastore",
            Step::TypeGen => "typegen",
            Step::BackendCompile => "backend-compile",
            Step::DatabaseInit => "database-init",
            Step::ClientBuild => "client-build",
            Step::TestRunner { .. } => "test-runner",
            Step::AppServer(_) => "app-server",
            Step::ProxyStop => "proxy-stop",
            Step::ProxyStart => "proxy-start",
        }
    }
}

/// One discrete unit of orchestration work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Launch and keep running until the run drains.
    Background(Step),
    /// Launch and wait; a non-zero exit fails the run.
    Run(Step),
    /// Launch and wait; a non-zero exit is logged and ignored.
    RunTolerant(Step),
    /// Wait until the data store accepts connections.
    AwaitDataStore,
    /// Block on the barrier over every background process.
    Supervise,
}

/// Stages for `mode`, in execution order.
pub fn plan(mode: RunMode) -> Vec<Stage> {
    // Every mode starts the data store and regenerates client types from it.
    let mut stages = vec![Stage::Background(Step::DataStore), Stage::Run(Step::TypeGen)];

    match mode {
        RunMode::InitDatabase => {
            stages.push(Stage::Run(Step::BackendCompile));
            stages.push(Stage::Run(Step::DatabaseInit));
        }
        RunMode::GenerateTypes => {}
        RunMode::RunTests { watch } => {
            stages.push(Stage::Run(Step::TestRunner { watch }));
        }
        RunMode::Serve(profile) => {
            if profile == ServeProfile::Production {
                stages.push(Stage::Run(Step::ClientBuild));
            }
            stages.push(Stage::Run(Step::BackendCompile));
            stages.push(Stage::AwaitDataStore);
            stages.push(Stage::Background(Step::AppServer(profile)));
            if profile == ServeProfile::Production {
                stages.push(Stage::RunTolerant(Step::ProxyStop));
                stages.push(Stage::Run(Step::ProxyStart));
            }
            stages.push(Stage::Supervise);
        }
    }

    stages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_types_never_supervises() {
        let stages = plan(RunMode::GenerateTypes);
        assert_eq!(
            stages,
            vec![Stage::Background(Step::DataStore), Stage::Run(Step::TypeGen)]
        );
        assert!(!stages.contains(&Stage::Supervise));
    }

    #[test]
    fn init_database_compiles_then_initialises() {
        assert_eq!(
            plan(RunMode::InitDatabase),
            vec![
                Stage::Background(Step::DataStore),
                Stage::Run(Step::TypeGen),
                Stage::Run(Step::BackendCompile),
                Stage::Run(Step::DatabaseInit),
            ]
        );
    }

    #[test]
    fn tests_carry_the_watch_flag() {
        let stages = plan(RunMode::RunTests { watch: true });
        assert_eq!(stages.last(), Some(&Stage::Run(Step::TestRunner { watch: true })));
    }

    #[test]
    fn development_serve_has_no_bundle_or_proxy() {
        assert_eq!(
            plan(RunMode::Serve(ServeProfile::Development)),
            vec![
                Stage::Background(Step::DataStore),
                Stage::Run(Step::TypeGen),
                Stage::Run(Step::BackendCompile),
                Stage::AwaitDataStore,
                Stage::Background(Step::AppServer(ServeProfile::Development)),
                Stage::Supervise,
            ]
        );
    }

    #[test]
    fn production_serve_builds_and_restarts_proxy_before_supervising() {
        let stages = plan(RunMode::Serve(ServeProfile::Production));
        let pos = |s: Stage| stages.iter().position(|x| *x == s).unwrap();

        let supervise = pos(Stage::Supervise);
        assert_eq!(supervise, stages.len() - 1);
        assert!(pos(Stage::Run(Step::ClientBuild)) < pos(Stage::Run(Step::BackendCompile)));
        assert!(pos(Stage::RunTolerant(Step::ProxyStop)) < pos(Stage::Run(Step::ProxyStart)));
        assert!(pos(Stage::Run(Step::ProxyStart)) < supervise);
    }
}
