//! Fakes and builders shared by devstack's integration tests.

pub mod builders;
pub mod fake_runner;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

pub use builders::{fake_orchestrator, StackConfigBuilder};
pub use fake_runner::{Behaviour, FakeEvent, FakeLocator, FakeLog, FakeStageRunner};

/// Upper bound for any single orchestrator run in a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

static INIT: Once = Once::new();

/// Install a test-captured subscriber once per test binary.
///
/// Defaults to debug output for devstack itself; override with `RUST_LOG`.
/// Captured output only shows up for failing tests.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,devstack=debug"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, failing the test if it runs longer than [`TEST_TIMEOUT`].
///
/// A hung orchestrator means some process was never drained.
pub async fn with_timeout<F: Future>(f: F) -> F::Output {
    match tokio::time::timeout(TEST_TIMEOUT, f).await {
        Ok(out) => out,
        Err(_) => panic!("run did not finish within {TEST_TIMEOUT:?}; a process was left running"),
    }
}
