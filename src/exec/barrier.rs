// src/exec/barrier.rs

//! Ordered wait over a set of processes.

use tracing::debug;

use crate::errors::Result;
use crate::exec::backend::ProcessHandle;

/// Wait on each handle in order, stopping at the first non-zero exit.
///
/// Handle N is not awaited until handle N-1 has exited. A failure in a
/// later process is therefore only noticed once every earlier one is done,
/// and handles after the first failure are never inspected.
pub async fn wait_all<H>(handles: &mut [H]) -> Result<()>
where
    H: AsMut<dyn ProcessHandle>,
{
    for (index, handle) in handles.iter_mut().enumerate() {
        let handle = handle.as_mut();
        debug!(index, cmd = %handle.descriptor(), "barrier waiting on process");
        let outcome = handle.wait().await?;
        outcome.into_result(handle.descriptor())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use proptest::prelude::*;

    use super::*;
    use crate::errors::DevstackError;
    use crate::exec::backend::{BoxedHandle, ExitOutcome, WaitFuture};
    use crate::exec::command::CommandDescriptor;
    use crate::exec::env::EnvContext;

    /// Exits immediately with a fixed code and records that it was awaited.
    struct Scripted {
        descriptor: CommandDescriptor,
        code: i32,
        waited: Arc<Mutex<Vec<String>>>,
    }

    impl ProcessHandle for Scripted {
        fn descriptor(&self) -> &CommandDescriptor {
            &self.descriptor
        }

        fn wait(&mut self) -> WaitFuture<'_> {
            self.waited.lock().unwrap().push(self.descriptor.to_string());
            let code = self.code;
            Box::pin(async move { Ok(ExitOutcome::from_code(code)) })
        }

        fn terminate(&mut self) -> Result<()> {
            Ok(())
        }

        fn kill(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn handles(codes: &[i32], waited: &Arc<Mutex<Vec<String>>>) -> Vec<BoxedHandle> {
        let ctx = EnvContext::from_vars("/", Vec::<(String, String)>::new());
        codes
            .iter()
            .enumerate()
            .map(|(i, &code)| {
                Box::new(Scripted {
                    descriptor: CommandDescriptor::new(&ctx, format!("p{i}")),
                    code,
                    waited: Arc::clone(waited),
                }) as BoxedHandle
            })
            .collect()
    }

    #[tokio::test]
    async fn stops_at_first_failure_and_never_queries_later_handles() {
        let waited = Arc::new(Mutex::new(Vec::new()));
        let mut list = handles(&[0, 3, 0], &waited);

        let err = wait_all(&mut list).await.unwrap_err();

        match err {
            DevstackError::ChildProcessFailed { command, exit_code } => {
                assert_eq!(command, "p1");
                assert_eq!(exit_code, 3);
            }
            other => panic!("expected ChildProcessFailed, got {other:?}"),
        }
        assert_eq!(*waited.lock().unwrap(), vec!["p0", "p1"]);
    }

    #[tokio::test]
    async fn empty_set_returns_immediately() {
        let mut list: Vec<BoxedHandle> = Vec::new();
        wait_all(&mut list).await.unwrap();
    }

    proptest! {
        #[test]
        fn waits_exactly_up_to_first_failure(codes in proptest::collection::vec(0..4i32, 0..8)) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let waited = Arc::new(Mutex::new(Vec::new()));
            let mut list = handles(&codes, &waited);

            let result = rt.block_on(wait_all(&mut list));

            let first_failure = codes.iter().position(|&c| c != 0);
            let expected_waits = first_failure.map_or(codes.len(), |i| i + 1);
            prop_assert_eq!(waited.lock().unwrap().len(), expected_waits);
            prop_assert_eq!(result.is_ok(), first_failure.is_none());
        }
    }
}
