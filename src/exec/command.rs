// src/exec/command.rs

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::exec::env::EnvContext;

/// Immutable description of one external program invocation.
///
/// Built with the consuming `arg`/`env`/`current_dir` methods and never
/// mutated afterwards; the runner only reads it.
#[derive(Debug, Clone)]
pub struct CommandDescriptor {
    program: PathBuf,
    args: Vec<OsString>,
    cwd: PathBuf,
    env_overrides: BTreeMap<String, String>,
    context: Arc<EnvContext>,
}

impl CommandDescriptor {
    /// New invocation of `program`, running in the install root.
    pub fn new(context: &Arc<EnvContext>, program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: context.root().to_path_buf(),
            env_overrides: BTreeMap::new(),
            context: Arc::clone(context),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<std::ffi::OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        for a in args {
            self = self.arg(a);
        }
        self
    }

    /// Working directory; relative paths are taken from the install root.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = self.context.root().join(dir);
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_overrides.insert(key.into(), value.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    pub fn working_dir(&self) -> &Path {
        &self.cwd
    }

    pub fn env_overrides(&self) -> &BTreeMap<String, String> {
        &self.env_overrides
    }

    /// Full child environment: inherited snapshot plus this command's overrides.
    pub fn environment(&self) -> BTreeMap<OsString, OsString> {
        self.context.merged(&self.env_overrides)
    }

    /// Last path component of the program, used for short log labels.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }
}

impl fmt::Display for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        // Lossy: for logs and error messages only.
        for a in &self.args {
            let a = a.to_string_lossy();
            if a.contains(' ') {
                write!(f, " \"{a}\"")?;
            } else {
                write!(f, " {a}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    fn ctx() -> Arc<EnvContext> {
        EnvContext::from_vars("/opt/app", [("PATH", "/usr/bin")])
    }

    #[test]
    fn defaults_to_install_root() {
        let cmd = CommandDescriptor::new(&ctx(), "/usr/bin/node").arg("main.mjs");
        assert_eq!(cmd.working_dir(), Path::new("/opt/app"));
        assert_eq!(cmd.to_string(), "/usr/bin/node main.mjs");
        assert_eq!(cmd.program_name(), "node");
    }

    #[test]
    fn relative_working_dir_is_joined_to_root() {
        let cmd = CommandDescriptor::new(&ctx(), "nginx").current_dir("nginx");
        assert_eq!(cmd.working_dir(), Path::new("/opt/app/nginx"));
    }

    #[test]
    fn environment_layers_overrides() {
        let cmd = CommandDescriptor::new(&ctx(), "node").env("NODE_ENV", "production");
        let env = cmd.environment();
        assert_eq!(env.get(OsStr::new("NODE_ENV")).unwrap(), "production");
        assert_eq!(env.get(OsStr::new("PATH")).unwrap(), "/usr/bin");
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_path_arguments_are_kept_verbatim() {
        use std::os::unix::ffi::{OsStrExt, OsStringExt};

        let root = OsString::from_vec(b"/srv/app-\xff".to_vec());
        let ctx = EnvContext::from_vars(root, [("PATH", "/usr/bin")]);
        let entry = ctx.root().join("dist-server/main.mjs");
        let cmd = CommandDescriptor::new(&ctx, "/usr/bin/node").arg(&entry);

        assert_eq!(
            cmd.arguments()[0].as_bytes(),
            b"/srv/app-\xff/dist-server/main.mjs"
        );
        assert!(cmd.to_string().contains('\u{FFFD}'));
    }
}
