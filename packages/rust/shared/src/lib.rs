//! Shared types, error model, and configuration for Wallabook.
//!
//! This crate is the foundation depended on by all other Wallabook crates.
//! It provides:
//! - [`WallabookError`] — the unified error type
//! - Domain types ([`Entry`], [`Section`], [`Book`], [`ExportOutcome`])
//! - Configuration ([`AppConfig`], [`StoreConfig`], [`ExportConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DEFAULT_MIN_CONTENT_LENGTH, Deployment, ExportConfig, ExportSettings, StoreConfig,
    Verbosity, WallabagConfig, init_config, load_config_from,
};
pub use error::{Result, WallabookError};
pub use types::{Book, Entry, ExportOutcome, Section};
