use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use devstack::errors::{DevstackError, Result};
use devstack::exec::{
    BoxedHandle, CommandDescriptor, ExitOutcome, Locator, ProcessHandle, StageRunner, WaitFuture,
};

/// Exit code a fake process reports after SIGTERM.
pub const TERMINATED_CODE: i32 = 143;
/// Exit code a fake process reports after being killed.
pub const KILLED_CODE: i32 = 137;

/// What a fake process does once launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    /// Exit immediately with this code.
    Exit(i32),
    /// Keep running until terminated or killed.
    RunUntilStopped,
    /// Accept the termination request but keep running until killed.
    IgnoreTerminate,
    /// Termination request errors; only a kill stops it.
    TerminateFails,
    /// The launch itself fails.
    SpawnFails,
}

/// One call the orchestrator made against the fake runner.
///
/// Commands are identified by a short label: the program's file name
/// followed by the arguments, with path-like arguments reduced to their
/// file name (`node /app/dist-server/main.mjs` becomes `node main.mjs`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeEvent {
    Spawn(String),
    Wait(String),
    Terminate(String),
    Kill(String),
}

impl FakeEvent {
    pub fn label(&self) -> &str {
        match self {
            FakeEvent::Spawn(l)
            | FakeEvent::Wait(l)
            | FakeEvent::Terminate(l)
            | FakeEvent::Kill(l) => l,
        }
    }
}

/// Shared, cloneable event log.
#[derive(Debug, Clone, Default)]
pub struct FakeLog {
    events: Arc<Mutex<Vec<FakeEvent>>>,
}

impl FakeLog {
    fn push(&self, event: FakeEvent) {
        self.events.lock().unwrap().push(event);
    }

    pub fn snapshot(&self) -> Vec<FakeEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn spawned(&self) -> Vec<String> {
        self.filter(|e| matches!(e, FakeEvent::Spawn(_)))
    }

    pub fn terminated(&self) -> Vec<String> {
        self.filter(|e| matches!(e, FakeEvent::Terminate(_)))
    }

    pub fn killed(&self) -> Vec<String> {
        self.filter(|e| matches!(e, FakeEvent::Kill(_)))
    }

    pub fn waited(&self) -> Vec<String> {
        self.filter(|e| matches!(e, FakeEvent::Wait(_)))
    }

    fn filter(&self, pred: impl Fn(&FakeEvent) -> bool) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| pred(e))
            .map(|e| e.label().to_string())
            .collect()
    }

    /// Resolves once some recorded `Wait` event's label starts with `prefix`.
    ///
    /// Handy as an interrupt future: "press Ctrl-C once we're blocked on X".
    pub async fn until_waiting_on(self, prefix: &str) {
        loop {
            if self.waited().iter().any(|l| l.starts_with(prefix)) {
                return;
            }
            tokio::task::yield_now().await;
        }
    }
}

/// Short, root-independent label for a command.
pub fn label_of(command: &CommandDescriptor) -> String {
    let mut parts = vec![command.program_name()];
    for arg in command.arguments() {
        let arg = arg.to_string_lossy();
        let short = match arg.rsplit_once('/') {
            Some((_, file)) => file.to_string(),
            None => arg.into_owned(),
        };
        parts.push(short);
    }
    parts.join(" ")
}

/// A stage runner that never starts real processes.
///
/// - records every spawn/wait/terminate/kill in a [`FakeLog`]
/// - picks each process's behaviour from the first rule whose prefix
///   matches the command label; unmatched commands exit 0
#[derive(Debug, Clone, Default)]
pub struct FakeStageRunner {
    rules: Vec<(String, Behaviour)>,
    log: FakeLog,
}

impl FakeStageRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner preconfigured for the default stack: the data store and the
    /// application server keep running, everything else exits 0.
    pub fn for_stack() -> Self {
        Self::new()
            .on("pocketbase", Behaviour::RunUntilStopped)
            .on("node main.mjs", Behaviour::RunUntilStopped)
    }

    /// Add a behaviour rule. Rules added later take precedence.
    pub fn on(mut self, label_prefix: &str, behaviour: Behaviour) -> Self {
        self.rules.insert(0, (label_prefix.to_string(), behaviour));
        self
    }

    pub fn log(&self) -> FakeLog {
        self.log.clone()
    }

    fn behaviour_for(&self, label: &str) -> Behaviour {
        self.rules
            .iter()
            .find(|(prefix, _)| label.starts_with(prefix.as_str()))
            .map(|(_, b)| *b)
            .unwrap_or(Behaviour::Exit(0))
    }
}

impl StageRunner for FakeStageRunner {
    fn launch(&mut self, command: &CommandDescriptor) -> Result<BoxedHandle> {
        let label = label_of(command);
        let behaviour = self.behaviour_for(&label);

        if behaviour == Behaviour::SpawnFails {
            return Err(DevstackError::SpawnFailed {
                command: command.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "fake spawn failure"),
            });
        }

        self.log.push(FakeEvent::Spawn(label.clone()));
        let exit = match behaviour {
            Behaviour::Exit(code) => Some(code),
            _ => None,
        };
        Ok(Box::new(FakeHandle {
            descriptor: command.clone(),
            label,
            behaviour,
            exit,
            log: self.log.clone(),
        }))
    }
}

struct FakeHandle {
    descriptor: CommandDescriptor,
    label: String,
    behaviour: Behaviour,
    exit: Option<i32>,
    log: FakeLog,
}

impl ProcessHandle for FakeHandle {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    fn wait(&mut self) -> WaitFuture<'_> {
        self.log.push(FakeEvent::Wait(self.label.clone()));
        let exit = self.exit;
        Box::pin(async move {
            match exit {
                Some(code) => Ok(ExitOutcome::from_code(code)),
                None => std::future::pending().await,
            }
        })
    }

    fn terminate(&mut self) -> Result<()> {
        self.log.push(FakeEvent::Terminate(self.label.clone()));
        match self.behaviour {
            Behaviour::TerminateFails => Err(DevstackError::Other(anyhow::anyhow!(
                "fake termination failure"
            ))),
            Behaviour::IgnoreTerminate => Ok(()),
            _ => {
                self.exit.get_or_insert(TERMINATED_CODE);
                Ok(())
            }
        }
    }

    fn kill(&mut self) -> Result<()> {
        self.log.push(FakeEvent::Kill(self.label.clone()));
        self.exit.get_or_insert(KILLED_CODE);
        Ok(())
    }
}

/// Resolves every tool to `/fake/bin/<tool>` unless marked missing.
#[derive(Debug, Clone, Default)]
pub struct FakeLocator {
    missing: HashSet<String>,
    lookups: Arc<Mutex<Vec<String>>>,
}

impl FakeLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn missing(mut self, tool: &str) -> Self {
        self.missing.insert(tool.to_string());
        self
    }

    /// Every tool name looked up so far.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

impl Locator for FakeLocator {
    fn locate(&self, tool: &str) -> Result<PathBuf> {
        self.lookups.lock().unwrap().push(tool.to_string());
        if self.missing.contains(tool) {
            Err(DevstackError::ToolNotFound {
                tool: tool.to_string(),
            })
        } else {
            Ok(PathBuf::from("/fake/bin").join(tool))
        }
    }
}
