//! Core functionality shared by chainsign services.
//!
//! This crate provides configuration loading and logging setup.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{Config, KeysConfig, LoggingConfig, ServerConfig};
pub use error::{ConfigError, Result};
