// src/exec/env.rs

//! Immutable environment snapshot shared by every command of one run.
//!
//! The inherited OS environment is read exactly once, when the context is
//! captured. Command descriptors layer their own overrides on top of a
//! private copy; nothing ever writes back into the process environment.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Install root plus the environment every child inherits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvContext {
    root: PathBuf,
    vars: BTreeMap<OsString, OsString>,
}

impl EnvContext {
    /// Snapshot the current process environment.
    pub fn capture(root: impl Into<PathBuf>) -> Arc<Self> {
        Self::from_vars(root, std::env::vars_os())
    }

    /// Build a context from an explicit variable list (tests, dry runs).
    pub fn from_vars<I, K, V>(root: impl Into<PathBuf>, vars: I) -> Arc<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        Arc::new(Self {
            root: root.into(),
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, key: impl AsRef<OsStr>) -> Option<&OsStr> {
        self.vars.get(key.as_ref()).map(OsString::as_os_str)
    }

    /// Inherited variables with `overrides` applied on top.
    pub fn merged<'a, I>(&self, overrides: I) -> BTreeMap<OsString, OsString>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut vars = self.vars.clone();
        for (k, v) in overrides {
            vars.insert(OsString::from(k), OsString::from(v));
        }
        vars
    }
}
