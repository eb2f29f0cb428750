//! tas-client entry point.
//!
//! Compiles a TAS script and delivers it to the control module injected into
//! the game, or asks that module to unload.
//!
//! # Usage
//!
//! ```text
//! tas-client [OPTIONS] [COMMAND]
//!
//! Commands:
//!   send     Compile the script and send it (default)
//!   compile  Compile only; optionally write the payload and a JSON dump
//!   unload   Ask the control module to detach itself
//!
//! Options:
//!   --config <PATH>       Configuration file
//!   --script <PATH>       Script to compile [default: from config]
//!   --addr <HOST:PORT>    Control module address [default: 127.0.0.1:27015]
//!   --header-end <WORD>   Header/framebulk separator [default: framebulks]
//!   --log-level <LEVEL>   Log level when RUST_LOG is unset [default: info]
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable          | Option         |
//! |-------------------|----------------|
//! | `TAS_CONFIG`      | `--config`     |
//! | `TAS_SCRIPT`      | `--script`     |
//! | `TAS_ADDR`        | `--addr`       |
//! | `TAS_HEADER_END`  | `--header-end` |
//! | `TAS_LOG_LEVEL`   | `--log-level`  |
//!
//! Precedence is CLI flag, then environment variable, then config file, then
//! built-in default.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tas_client::application::send_script::{PayloadTransport, SendScriptUseCase};
use tas_client::infrastructure::network::PayloadConnection;
use tas_client::infrastructure::storage::{load_config, ClientConfig};
use tas_core::{compile_script, ScriptOptions};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Compiles TAS scripts and sends them to the SuperTuxKart control module.
#[derive(Debug, Parser)]
#[command(name = "tas-client", version)]
struct Cli {
    /// Configuration file.  Defaults to the platform config directory.
    #[arg(long, env = "TAS_CONFIG")]
    config: Option<PathBuf>,

    /// Script to compile.
    #[arg(short, long, env = "TAS_SCRIPT")]
    script: Option<PathBuf>,

    /// Address of the control module, as `IP:PORT`.
    #[arg(long, env = "TAS_ADDR")]
    addr: Option<String>,

    /// Line separating the header from the framebulks.
    #[arg(long, env = "TAS_HEADER_END")]
    header_end: Option<String>,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, env = "TAS_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
enum Command {
    /// Compile the script and send it to the control module.
    Send {
        /// Wait for one reply after sending and log it.
        #[arg(long)]
        await_reply: bool,
    },
    /// Compile the script without sending it.
    Compile {
        /// Write the raw payload bytes here.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Write the parsed script as pretty JSON here.
        #[arg(long)]
        emit_json: Option<PathBuf>,
    },
    /// Ask the control module to detach itself.
    Unload,
}

/// Fully resolved settings: CLI and environment over config file over defaults.
#[derive(Debug, Clone, PartialEq)]
struct Settings {
    script_path: PathBuf,
    addr: SocketAddr,
    connect_timeout: Duration,
    options: ScriptOptions,
    log_level: String,
}

impl Cli {
    /// Merges the parsed arguments over `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting address is not a valid socket
    /// address.
    fn resolve(&self, config: &ClientConfig) -> anyhow::Result<Settings> {
        let addr = match &self.addr {
            Some(addr) => addr
                .parse()
                .with_context(|| format!("invalid control module address: '{addr}'"))?,
            None => config.network.socket_addr()?,
        };

        let mut options = config.script.options();
        if let Some(header_end) = &self.header_end {
            options.header_end = header_end.clone();
        }

        Ok(Settings {
            script_path: self
                .script
                .clone()
                .unwrap_or_else(|| config.script.default_path.clone()),
            addr,
            connect_timeout: config.network.connect_timeout(),
            options,
            log_level: self
                .log_level
                .clone()
                .unwrap_or_else(|| config.logging.log_level.clone()),
        })
    }

    fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Send { await_reply: false })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).context("failed to load configuration")?;
    let settings = cli.resolve(&config)?;

    // RUST_LOG wins; otherwise the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
        )
        .init();

    if let Err(e) = run(cli.command(), &settings).await {
        error!("{e:#}");
        return Err(e);
    }
    Ok(())
}

async fn run(command: Command, settings: &Settings) -> anyhow::Result<()> {
    match command {
        Command::Send { await_reply } => {
            let source = read_script(&settings.script_path)?;
            let connection = Arc::new(PayloadConnection::new(settings.addr, settings.connect_timeout));
            let use_case = SendScriptUseCase::new(
                Arc::clone(&connection) as Arc<dyn PayloadTransport>,
                settings.options.clone(),
            );

            let compiled = use_case.send_script(&source).await.with_context(|| {
                format!("failed to deliver {}", settings.script_path.display())
            })?;
            info!(
                "script {} delivered: {} framebulks, {} warnings",
                settings.script_path.display(),
                compiled.script.framebulks.len(),
                compiled.script.warnings.len()
            );

            if await_reply {
                let reply = use_case.await_reply().await.context("no reply from control module")?;
                info!("control module replied: {}", String::from_utf8_lossy(&reply));
            }
            connection.close().await;
        }
        Command::Compile { output, emit_json } => {
            let source = read_script(&settings.script_path)?;
            let compiled = compile_script(&source, &settings.options)
                .with_context(|| format!("failed to compile {}", settings.script_path.display()))?;
            for warning in &compiled.script.warnings {
                warn!("{warning}");
            }

            if let Some(path) = output {
                std::fs::write(&path, &compiled.payload)
                    .with_context(|| format!("failed to write payload to {}", path.display()))?;
                info!("wrote {} payload bytes to {}", compiled.payload.len(), path.display());
            }
            if let Some(path) = emit_json {
                let json = serde_json::to_string_pretty(&compiled.script)
                    .context("failed to serialize parsed script")?;
                std::fs::write(&path, json)
                    .with_context(|| format!("failed to write JSON to {}", path.display()))?;
                info!("wrote parsed script to {}", path.display());
            }
            info!(
                "compiled {}: {} framebulks, {} payload bytes",
                settings.script_path.display(),
                compiled.script.framebulks.len(),
                compiled.payload.len()
            );
        }
        Command::Unload => {
            let connection = Arc::new(PayloadConnection::new(settings.addr, settings.connect_timeout));
            let use_case = SendScriptUseCase::new(
                Arc::clone(&connection) as Arc<dyn PayloadTransport>,
                settings.options.clone(),
            );
            use_case.unload().await.context("failed to send unload request")?;
            connection.close().await;
        }
    }
    Ok(())
}

fn read_script(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve_defaults(args: &[&str]) -> Settings {
        Cli::parse_from(args)
            .resolve(&ClientConfig::default())
            .expect("defaults must resolve")
    }

    #[test]
    fn test_cli_without_command_defaults_to_send() {
        // Arrange / Act
        let cli = Cli::parse_from(["tas-client"]);

        // Assert
        assert_eq!(cli.command(), Command::Send { await_reply: false });
    }

    #[test]
    fn test_cli_send_await_reply() {
        let cli = Cli::parse_from(["tas-client", "send", "--await-reply"]);
        assert_eq!(cli.command(), Command::Send { await_reply: true });
    }

    #[test]
    fn test_cli_compile_outputs() {
        let cli = Cli::parse_from([
            "tas-client",
            "compile",
            "--output",
            "out.bin",
            "--emit-json",
            "tasData.json",
        ]);
        assert_eq!(
            cli.command(),
            Command::Compile {
                output: Some(PathBuf::from("out.bin")),
                emit_json: Some(PathBuf::from("tasData.json")),
            }
        );
    }

    #[test]
    fn test_cli_unload() {
        let cli = Cli::parse_from(["tas-client", "unload"]);
        assert_eq!(cli.command(), Command::Unload);
    }

    #[test]
    fn test_resolve_defaults_from_config() {
        let settings = resolve_defaults(&["tas-client"]);
        assert_eq!(settings.addr.to_string(), "127.0.0.1:27015");
        assert_eq!(settings.script_path, PathBuf::from("scripts/tasfile.peng"));
        assert_eq!(settings.options, ScriptOptions::default());
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_resolve_cli_overrides_config() {
        let settings = resolve_defaults(&[
            "tas-client",
            "--script",
            "run.peng",
            "--addr",
            "127.0.0.1:4000",
            "--header-end",
            "frames",
            "--log-level",
            "debug",
        ]);
        assert_eq!(settings.script_path, PathBuf::from("run.peng"));
        assert_eq!(settings.addr.port(), 4000);
        assert_eq!(settings.options.header_end, "frames");
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn test_resolve_uses_config_file_values() {
        let mut config = ClientConfig::default();
        config.network.port = 31000;
        config.network.connect_timeout_ms = 500;

        let settings = Cli::parse_from(["tas-client"]).resolve(&config).unwrap();

        assert_eq!(settings.addr.port(), 31000);
        assert_eq!(settings.connect_timeout, Duration::from_millis(500));
    }

    #[test]
    fn test_resolve_invalid_addr_returns_error() {
        let cli = Cli::parse_from(["tas-client", "--addr", "nowhere"]);
        assert!(cli.resolve(&ClientConfig::default()).is_err());
    }
}
