// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::engine::readiness::Readiness;

/// Stack description as read from `Devstack.toml`.
///
/// Every section and field is optional; the defaults describe the stack the
/// launcher was written for:
///
/// ```toml
/// [stack]
/// shutdown_grace = "5s"
///
/// [datastore]
/// program = "./pocketbase"
/// args = ["serve"]
/// ready_address = "127.0.0.1:8090"
///
/// [backend]
/// entry = "dist-server/main.mjs"
/// ```
///
/// Durations and addresses stay as strings here; [`StackConfig`] is the
/// validated form the rest of the crate uses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStackConfig {
    #[serde(default)]
    pub stack: StackSection,
    #[serde(default)]
    pub datastore: DatastoreSection,
    #[serde(default)]
    pub typegen: TypegenSection,
    #[serde(default)]
    pub backend: BackendSection,
    #[serde(default)]
    pub client: ClientSection,
    #[serde(default)]
    pub tests: TestsSection,
    #[serde(default)]
    pub proxy: ProxySection,
}

/// `[stack]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StackSection {
    /// How long a process may take to exit after SIGTERM before it is killed.
    pub shutdown_grace: String,
}

impl Default for StackSection {
    fn default() -> Self {
        Self {
            shutdown_grace: "5s".to_string(),
        }
    }
}

/// `[datastore]` section: the bundled database server.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatastoreSection {
    pub program: String,
    pub args: Vec<String>,
    /// Database file handed to the type generator.
    pub data_file: String,
    /// If set, poll this `host:port` until it accepts TCP connections
    /// instead of sleeping for `startup_delay`.
    pub ready_address: Option<String>,
    pub ready_timeout: String,
    pub ready_interval: String,
    pub startup_delay: String,
}

impl Default for DatastoreSection {
    fn default() -> Self {
        let program = if cfg!(windows) {
            "./pocketbase.exe"
        } else {
            "./pocketbase"
        };
        Self {
            program: program.to_string(),
            args: vec!["serve".to_string()],
            data_file: "pb_data/data.db".to_string(),
            ready_address: None,
            ready_timeout: "10s".to_string(),
            ready_interval: "100ms".to_string(),
            startup_delay: "1s".to_string(),
        }
    }
}

/// `[typegen]` section: generates client types from the live database.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TypegenSection {
    pub runner: String,
    pub package: String,
    pub out: String,
}

impl Default for TypegenSection {
    fn default() -> Self {
        Self {
            runner: "pnpx".to_string(),
            package: "pocketbase-typegen@1.2".to_string(),
            out: "types/pocketbase-types.ts".to_string(),
        }
    }
}

/// `[backend]` section: server compiler, runtime and entry points.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendSection {
    pub compiler: String,
    pub tsconfig: String,
    pub runtime: String,
    pub entry: String,
    pub init_script: String,
    /// Variable that tells the application server which mode it runs in.
    pub mode_variable: String,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            compiler: "tsc".to_string(),
            tsconfig: "tsconfig.server.json".to_string(),
            runtime: "node".to_string(),
            entry: "dist-server/main.mjs".to_string(),
            init_script: "dist-server/script/database_init.mjs".to_string(),
            mode_variable: "NODE_ENV".to_string(),
        }
    }
}

/// `[client]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientSection {
    pub package_manager: String,
    pub build_script: String,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            package_manager: "pnpm".to_string(),
            build_script: "build".to_string(),
        }
    }
}

/// `[tests]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TestsSection {
    pub package_manager: String,
    pub script: String,
}

impl Default for TestsSection {
    fn default() -> Self {
        Self {
            package_manager: "pnpm".to_string(),
            script: "test".to_string(),
        }
    }
}

/// `[proxy]` section: the reverse proxy restarted in production.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProxySection {
    pub program: String,
    /// Prefix directory the proxy runs in, relative to the install root.
    pub dir: String,
    pub conf: String,
}

impl Default for ProxySection {
    fn default() -> Self {
        let program = if cfg!(target_os = "linux") {
            "/usr/sbin/nginx"
        } else {
            "nginx"
        };
        Self {
            program: program.to_string(),
            dir: "nginx".to_string(),
            conf: "./conf/nginx.conf".to_string(),
        }
    }
}

/// Validated stack configuration.
///
/// Built from a [`RawStackConfig`] by `StackConfig::try_from` (see
/// `validate.rs`).
#[derive(Debug, Clone)]
pub struct StackConfig {
    pub shutdown_grace: Duration,
    pub datastore: DatastoreSection,
    pub readiness: Readiness,
    pub typegen: TypegenSection,
    pub backend: BackendSection,
    pub client: ClientSection,
    pub tests: TestsSection,
    pub proxy: ProxySection,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            shutdown_grace: Duration::from_secs(5),
            datastore: DatastoreSection::default(),
            readiness: Readiness::FixedDelay(Duration::from_secs(1)),
            typegen: TypegenSection::default(),
            backend: BackendSection::default(),
            client: ClientSection::default(),
            tests: TestsSection::default(),
            proxy: ProxySection::default(),
        }
    }
}
