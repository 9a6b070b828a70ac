//! Shared types, error model, and configuration for healthpull.
//!
//! This crate is the foundation depended on by all other healthpull crates.
//! It provides:
//! - [`HealthPullError`] — the unified error type
//! - Domain types ([`RawRecord`], [`OrgUnitRow`], [`ValueRow`], [`TabularRow`])
//! - Configuration ([`AppConfig`], the connection registry, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, Connection, Credentials, DefaultsConfig, WorkspaceConfig, config_dir,
    config_file_path, expand_home, init_config, load_config, load_config_from,
};
pub use error::{HealthPullError, Result};
pub use types::{
    ORG_UNIT_COLUMNS, OrgUnitRow, RawRecord, TabularRow, VALUE_COLUMNS, ValueRow,
    scalar_to_string,
};
