//! Host configuration
//!
//! Loaded from a TOML file. Every field has a default, so an empty or
//! missing file yields a working setup.

pub mod loader;
pub mod types;

pub use loader::{load_config, ConfigError};
