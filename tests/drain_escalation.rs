// tests/drain_escalation.rs

use std::future::pending;
use std::time::{Duration, Instant};

use devstack::engine::{ModeFlags, RunOutcome};
use devstack::errors::DevstackError;
use devstack_test_utils::builders::{fake_orchestrator, StackConfigBuilder};
use devstack_test_utils::fake_runner::{Behaviour, FakeLocator, FakeStageRunner};
use devstack_test_utils::{init_tracing, with_timeout};

fn gen_types() -> ModeFlags {
    ModeFlags {
        gen_type: true,
        ..Default::default()
    }
}

#[tokio::test]
async fn process_ignoring_termination_is_killed_after_grace() {
    init_tracing();

    let runner = FakeStageRunner::for_stack().on("pocketbase", Behaviour::IgnoreTerminate);
    let log = runner.log();
    let config = StackConfigBuilder::new()
        .shutdown_grace(Duration::from_millis(100))
        .build();
    let mut orch = fake_orchestrator(runner, FakeLocator::new(), config);

    let started = Instant::now();
    let report = with_timeout(orch.run(&gen_types(), pending())).await;

    assert!(matches!(report.outcome, RunOutcome::Completed));
    assert!(started.elapsed() >= Duration::from_millis(100));
    assert_eq!(log.terminated(), vec!["pocketbase serve"]);
    assert_eq!(log.killed(), vec!["pocketbase serve"]);
    assert_eq!(report.drain.killed.len(), 1);
    assert!(report.drain.killed[0].contains("pocketbase"));
    assert!(report.drain.failures.is_empty());
}

#[tokio::test]
async fn cooperative_processes_are_never_killed() {
    init_tracing();

    let runner = FakeStageRunner::for_stack();
    let log = runner.log();
    let config = StackConfigBuilder::new()
        .shutdown_grace(Duration::from_secs(3))
        .build();
    let mut orch = fake_orchestrator(runner, FakeLocator::new(), config);

    let interrupt = log.clone().until_waiting_on("pocketbase");
    let report = with_timeout(orch.run(&ModeFlags::default(), interrupt)).await;

    assert!(matches!(report.outcome, RunOutcome::Interrupted));
    assert_eq!(report.drain.terminated.len(), 2);
    assert!(report.drain.killed.is_empty());
    assert!(log.killed().is_empty());
}

#[tokio::test]
async fn termination_failure_is_recorded_and_others_still_stopped() {
    init_tracing();

    let runner = FakeStageRunner::for_stack().on("node main.mjs", Behaviour::TerminateFails);
    let log = runner.log();
    let mut orch = fake_orchestrator(runner, FakeLocator::new(), StackConfigBuilder::new().build());

    let interrupt = log.clone().until_waiting_on("pocketbase");
    let report = with_timeout(orch.run(&ModeFlags::default(), interrupt)).await;

    assert!(matches!(report.outcome, RunOutcome::Interrupted));
    assert_eq!(report.exit_code(), 0);

    // Both got the request; only the data store accepted it.
    assert_eq!(log.terminated(), vec!["node main.mjs", "pocketbase serve"]);
    assert_eq!(report.drain.terminated.len(), 1);
    assert!(report.drain.terminated[0].contains("pocketbase"));

    assert_eq!(report.drain.failures.len(), 1);
    assert!(report.drain.failures[0].contains("main.mjs"));
    assert!(report.drain.failures[0].contains("fake termination failure"));

    // Still running after the grace period, so it is killed.
    assert_eq!(log.killed(), vec!["node main.mjs"]);
}

#[tokio::test]
async fn cleanup_failure_does_not_mask_the_run_failure() {
    init_tracing();

    let runner = FakeStageRunner::for_stack()
        .on("pocketbase", Behaviour::TerminateFails)
        .on("pnpx", Behaviour::Exit(4));
    let mut orch = fake_orchestrator(runner, FakeLocator::new(), StackConfigBuilder::new().build());

    let report = with_timeout(orch.run(&gen_types(), pending())).await;

    assert!(matches!(
        report.outcome,
        RunOutcome::Failed(DevstackError::ChildProcessFailed { exit_code: 4, .. })
    ));
    assert_eq!(report.exit_code(), 4);
    assert!(!report.drain.failures.is_empty());
    assert_eq!(report.drain.killed.len(), 1);
}
