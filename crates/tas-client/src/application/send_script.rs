//! SendScriptUseCase: compiles a script and hands the payload to the control
//! module.
//!
//! The use case depends only on the [`PayloadTransport`] trait.  The TCP
//! implementation lives in the infrastructure layer and is injected at
//! construction time.
//!
//! Compilation always completes before the transport is touched, so a script
//! error never puts a single byte on the wire.

use std::sync::Arc;

use async_trait::async_trait;
use tas_core::{compile_script, CompiledScript, IpcMessage, ScriptError, ScriptOptions};
use thiserror::Error;
use tracing::{info, warn};

/// Error type for the send-script use case.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("script rejected: {0}")]
    Script(#[from] ScriptError),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Trait for delivering framed messages to the control module.
///
/// The infrastructure implementation uses TCP; test implementations record
/// calls.
#[async_trait]
pub trait PayloadTransport: Send + Sync {
    /// Sends one message.
    async fn send(&self, msg: &IpcMessage) -> Result<(), String>;

    /// Waits for one reply and returns its payload.
    async fn receive(&self) -> Result<Vec<u8>, String>;
}

/// The Send Script use case.
pub struct SendScriptUseCase {
    transport: Arc<dyn PayloadTransport>,
    options: ScriptOptions,
}

impl SendScriptUseCase {
    /// Creates a new use case that sends through `transport` and parses with
    /// `options`.
    pub fn new(transport: Arc<dyn PayloadTransport>, options: ScriptOptions) -> Self {
        Self { transport, options }
    }

    /// Compiles `source` and sends it as a `Script` message.
    ///
    /// Returns the compiled script so the caller can report on it.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Script`] if compilation fails (nothing is sent),
    /// or [`SendError::Transport`] if delivery fails.
    pub async fn send_script(&self, source: &str) -> Result<CompiledScript, SendError> {
        let compiled = compile_script(source, &self.options)?;
        for warning in &compiled.script.warnings {
            warn!("{warning}");
        }

        self.transport
            .send(&IpcMessage::Script(compiled.payload.clone()))
            .await
            .map_err(SendError::Transport)?;

        info!("sent script payload ({} bytes)", compiled.payload.len());
        Ok(compiled)
    }

    /// Asks the control module to detach itself.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Transport`] if delivery fails.
    pub async fn unload(&self) -> Result<(), SendError> {
        self.transport
            .send(&IpcMessage::Unload)
            .await
            .map_err(SendError::Transport)?;
        info!("sent unload request");
        Ok(())
    }

    /// Waits for one reply from the control module.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Transport`] if the read fails.
    pub async fn await_reply(&self) -> Result<Vec<u8>, SendError> {
        let reply = self.transport.receive().await.map_err(SendError::Transport)?;
        info!("received reply ({} bytes)", reply.len());
        Ok(reply)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
