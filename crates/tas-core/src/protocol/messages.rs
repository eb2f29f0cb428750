//! Messages sent to the control module over the IPC socket.

use serde::{Deserialize, Serialize};

// ── Protocol constants ────────────────────────────────────────────────────────

/// Default address the control module listens on.
pub const DEFAULT_IPC_HOST: &str = "127.0.0.1";

/// Default port the control module listens on.
pub const DEFAULT_IPC_PORT: u16 = 27015;

// ── Message type codes ────────────────────────────────────────────────────────

/// Type byte that follows the length prefix of every outbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    /// Payload is a compiled script.
    Script = 0,
    /// Empty payload; asks the control module to detach itself.
    Unload = 1,
}

impl TryFrom<u8> for MessageType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0 => Ok(MessageType::Script),
            1 => Ok(MessageType::Unload),
            _ => Err(()),
        }
    }
}

// ── Messages ──────────────────────────────────────────────────────────────────

/// One outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpcMessage {
    /// A compiled payload from [`crate::protocol::payload::encode_payload`].
    Script(Vec<u8>),
    Unload,
}

impl IpcMessage {
    /// Returns the type byte written on the wire for this message.
    pub fn message_type(&self) -> MessageType {
        match self {
            IpcMessage::Script(_) => MessageType::Script,
            IpcMessage::Unload => MessageType::Unload,
        }
    }

    /// Returns the payload bytes; empty for [`IpcMessage::Unload`].
    pub fn payload(&self) -> &[u8] {
        match self {
            IpcMessage::Script(bytes) => bytes,
            IpcMessage::Unload => &[],
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
