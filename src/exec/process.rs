// src/exec/process.rs

//! Real process execution on top of `tokio::process`.

use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::errors::{DevstackError, Result};
use crate::exec::backend::{BoxedHandle, ExitOutcome, ProcessHandle, StageRunner, WaitFuture};
use crate::exec::command::CommandDescriptor;

/// Stage runner that spawns OS processes.
///
/// Children inherit the supervisor's stdout/stderr, so their output is
/// interleaved live with our own logs on stderr.
#[derive(Debug, Default, Clone)]
pub struct RealStageRunner;

impl RealStageRunner {
    pub fn new() -> Self {
        Self
    }
}

impl StageRunner for RealStageRunner {
    fn launch(&mut self, command: &CommandDescriptor) -> Result<BoxedHandle> {
        let mut cmd = Command::new(command.program());
        cmd.args(command.arguments())
            .current_dir(command.working_dir())
            .env_clear()
            .envs(command.environment())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            // Draining sends SIGTERM first; dropping the handle must not
            // turn that into an immediate SIGKILL.
            .kill_on_drop(false);

        let child = cmd.spawn().map_err(|source| DevstackError::SpawnFailed {
            command: command.to_string(),
            source,
        })?;

        info!(
            cmd = %command,
            pid = child.id(),
            cwd = %command.working_dir().display(),
            "started process"
        );

        Ok(Box::new(ChildProcess {
            child,
            descriptor: command.clone(),
        }))
    }
}

/// Handle to a process started by [`RealStageRunner`].
#[derive(Debug)]
pub struct ChildProcess {
    child: Child,
    descriptor: CommandDescriptor,
}

impl ProcessHandle for ChildProcess {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    fn wait(&mut self) -> WaitFuture<'_> {
        Box::pin(async move {
            let status = self.child.wait().await?;
            let outcome = ExitOutcome::from_code(exit_code(&status));
            info!(
                cmd = %self.descriptor,
                exit_code = outcome.code(),
                success = outcome.success(),
                "process exited"
            );
            Ok(outcome)
        })
    }

    fn terminate(&mut self) -> Result<()> {
        let Some(pid) = self.child.id() else {
            debug!(cmd = %self.descriptor, "process already reaped; nothing to terminate");
            return Ok(());
        };
        debug!(cmd = %self.descriptor, pid, "sending termination request");
        send_terminate(&mut self.child, pid)
    }

    fn kill(&mut self) -> Result<()> {
        if self.child.id().is_none() {
            return Ok(());
        }
        self.child.start_kill()?;
        Ok(())
    }
}

#[cfg(unix)]
fn send_terminate(_child: &mut Child, pid: u32) -> Result<()> {
    let pid = libc::pid_t::try_from(pid)
        .map_err(|_| DevstackError::Other(anyhow::anyhow!("pid {pid} out of range")))?;
    // SAFETY: kill(2) has no memory-safety preconditions; `pid` belongs to a
    // child we have not reaped yet, so it cannot have been recycled.
    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error().into())
    }
}

#[cfg(not(unix))]
fn send_terminate(child: &mut Child, _pid: u32) -> Result<()> {
    child.start_kill()?;
    Ok(())
}

#[cfg(unix)]
fn exit_code(status: &std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: &std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::exec::env::EnvContext;

    fn sh(script: &str) -> CommandDescriptor {
        let ctx = EnvContext::capture("/");
        CommandDescriptor::new(&ctx, "/bin/sh").args(["-c", script])
    }

    #[tokio::test]
    async fn reports_exit_codes() {
        let mut runner = RealStageRunner::new();
        let ok = runner.run_to_completion(&sh("exit 0")).await.unwrap();
        assert_eq!(ok, ExitOutcome::Success);

        let failed = runner.run_to_completion(&sh("exit 7")).await.unwrap();
        assert_eq!(failed, ExitOutcome::Failed(7));
    }

    #[tokio::test]
    async fn env_overrides_reach_the_child() {
        let cmd = sh("test \"$DEVSTACK_PROBE\" = yes").env("DEVSTACK_PROBE", "yes");
        let outcome = RealStageRunner::new().run_to_completion(&cmd).await.unwrap();
        assert!(outcome.success());
    }

    #[tokio::test]
    async fn terminate_stops_a_sleeping_child() {
        let mut handle = RealStageRunner::new().launch(&sh("sleep 30")).unwrap();
        handle.terminate().unwrap();
        let outcome = handle.wait().await.unwrap();
        assert_eq!(outcome, ExitOutcome::Failed(128 + libc::SIGTERM));

        // Already reaped: terminating again is a no-op.
        handle.terminate().unwrap();
    }

    #[test]
    fn missing_program_is_spawn_failure() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let _guard = rt.enter();
        let ctx = EnvContext::capture("/");
        let cmd = CommandDescriptor::new(&ctx, "/nonexistent/devstack-tool");
        let err = RealStageRunner::new().launch(&cmd).err().unwrap();
        assert!(matches!(err, DevstackError::SpawnFailed { .. }));
    }
}
