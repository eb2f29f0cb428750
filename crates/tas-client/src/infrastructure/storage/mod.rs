//! Persistent storage for the client: the TOML configuration file.

pub mod config;

pub use config::{load_config, ClientConfig, ConfigError};
