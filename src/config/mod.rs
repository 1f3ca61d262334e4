// src/config/mod.rs

//! Stack configuration for devstack.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk, falling back to defaults (`loader.rs`).
//! - Validate durations, addresses and program names (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, resolve, DEFAULT_CONFIG_FILE};
pub use model::{
    BackendSection, ClientSection, DatastoreSection, ProxySection, RawStackConfig, StackConfig,
    StackSection, TestsSection, TypegenSection,
};
pub use validate::parse_duration;
