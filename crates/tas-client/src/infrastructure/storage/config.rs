//! TOML configuration for the client.
//!
//! Read from an explicit `--config` path, or else from the platform config
//! file:
//! - Windows:  `%APPDATA%\StkTas\config.toml`
//! - Linux:    `~/.config/stk-tas/config.toml`
//! - macOS:    `~/Library/Application Support/StkTas/config.toml`
//!
//! ```toml
//! [network]
//! host = "127.0.0.1"
//! port = 27015
//! connect_timeout_ms = 3000
//!
//! [script]
//! default_path = "scripts/tasfile.peng"
//! header_end = "framebulks"
//!
//! [logging]
//! log_level = "info"
//! ```
//!
//! Every field and section is optional; absent values take the defaults
//! shown above.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tas_core::protocol::messages::{DEFAULT_IPC_HOST, DEFAULT_IPC_PORT};
use tas_core::script::DEFAULT_HEADER_END;
use tas_core::ScriptOptions;
use thiserror::Error;
use tracing::debug;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// `host:port` does not form a socket address.
    #[error("invalid control module address '{0}'")]
    InvalidAddress(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub script: ScriptConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the control module listens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// How long to wait for the TCP connect before giving up.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

/// Script location and parsing settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScriptConfig {
    /// Script used when `--script` is not given.
    #[serde(default = "default_script_path")]
    pub default_path: PathBuf,
    /// Line that separates the header from the framebulks.
    #[serde(default = "default_header_end")]
    pub header_end: String,
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `tracing` level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_host() -> String {
    DEFAULT_IPC_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_IPC_PORT
}
fn default_connect_timeout_ms() -> u64 {
    3000
}
fn default_script_path() -> PathBuf {
    PathBuf::from("scripts/tasfile.peng")
}
fn default_header_end() -> String {
    DEFAULT_HEADER_END.to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            default_path: default_script_path(),
            header_end: default_header_end(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl NetworkConfig {
    /// Parses `host:port` into a socket address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidAddress`] if `host` is not an IP
    /// address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let text = format!("{}:{}", self.host, self.port);
        text.parse().map_err(|_| ConfigError::InvalidAddress(text))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl ScriptConfig {
    /// Parser options derived from this section.
    pub fn options(&self) -> ScriptOptions {
        ScriptOptions {
            header_end: self.header_end.clone(),
        }
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

/// Resolves the full path to the platform config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads the configuration.
///
/// With `Some(path)` that file must exist.  With `None` the platform config
/// file is used, and a missing file (or an undeterminable config directory)
/// yields [`ClientConfig::default()`].
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors and
/// [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: Option<&Path>) -> Result<ClientConfig, ConfigError> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            parse_config(&content)
        }
        None => {
            let Ok(path) = config_file_path() else {
                debug!("no platform config directory; using defaults");
                return Ok(ClientConfig::default());
            };
            match std::fs::read_to_string(&path) {
                Ok(content) => parse_config(&content),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!("no config file at {}; using defaults", path.display());
                    Ok(ClientConfig::default())
                }
                Err(source) => Err(ConfigError::Io { path, source }),
            }
        }
    }
}

/// Parses configuration from TOML text.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if the TOML is malformed.
pub fn parse_config(content: &str) -> Result<ClientConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Resolves the platform config directory including the `StkTas` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("StkTas"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("stk-tas"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME")
            .map(|h| PathBuf::from(h).join("Library").join("Application Support").join("StkTas"))
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
