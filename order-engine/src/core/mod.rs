//! Engine configuration
//!
//! - [`Config`] - settings read from the environment
//! - [`ConfigError`] - missing or invalid settings

pub mod config;

pub use config::{Config, ConfigError};
