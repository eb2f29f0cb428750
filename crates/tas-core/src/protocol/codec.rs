//! Transport framing for the IPC socket.
//!
//! Outbound (client to control module):
//! ```text
//! [len:4][msg_type:1][payload:N]      len = N + 1
//! ```
//! Inbound (control module to client):
//! ```text
//! [len:4][payload:N]                  len = N
//! ```
//! `len` is a signed 32-bit integer in host byte order.

use thiserror::Error;

use crate::protocol::messages::{IpcMessage, MessageType};

/// Size of the length prefix on both directions.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Errors that can occur while framing or unframing a message.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FrameError {
    /// The byte slice is shorter than the frame it announces.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The length prefix is negative.
    #[error("negative frame length: {0}")]
    NegativeLength(i32),

    /// An outbound frame must contain at least the type byte.
    #[error("outbound frame length {0} does not cover the type byte")]
    EmptyFrame(i32),

    /// The payload does not fit in the signed 32-bit length prefix.
    #[error("payload of {0} bytes is too large to frame")]
    PayloadTooLarge(usize),

    /// The type byte is not a recognized value.
    #[error("unknown message type: 0x{0:02X}")]
    UnknownMessageType(u8),

    /// An `Unload` frame carried payload bytes.
    #[error("unload message carries {0} unexpected payload bytes")]
    UnexpectedPayload(usize),
}

// ── Outbound ──────────────────────────────────────────────────────────────────

/// Frames an outbound message as `<len><type><payload>`.
///
/// # Errors
///
/// Returns [`FrameError::PayloadTooLarge`] if `payload + 1` overflows `i32`.
///
/// # Examples
///
/// ```rust
/// use tas_core::{decode_frame, encode_frame, IpcMessage};
///
/// let bytes = encode_frame(&IpcMessage::Unload).unwrap();
/// assert_eq!(bytes.len(), 5);
/// let (msg, consumed) = decode_frame(&bytes).unwrap();
/// assert_eq!(msg, IpcMessage::Unload);
/// assert_eq!(consumed, 5);
/// ```
pub fn encode_frame(msg: &IpcMessage) -> Result<Vec<u8>, FrameError> {
    let payload = msg.payload();
    let len = length_prefix(payload.len() + 1).ok_or(FrameError::PayloadTooLarge(payload.len()))?;

    let mut buf = Vec::with_capacity(LENGTH_PREFIX_SIZE + 1 + payload.len());
    buf.extend_from_slice(&len.to_ne_bytes());
    buf.push(msg.message_type() as u8);
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Decodes one outbound frame from the beginning of `bytes`.
///
/// Returns the message and the total number of bytes consumed.  Used by the
/// test harness that plays the control module.
///
/// # Errors
///
/// Returns [`FrameError`] if the frame is truncated or malformed.
pub fn decode_frame(bytes: &[u8]) -> Result<(IpcMessage, usize), FrameError> {
    let len = read_length(bytes)?;
    if len == 0 {
        return Err(FrameError::EmptyFrame(0));
    }

    let total = LENGTH_PREFIX_SIZE + len;
    require_len(bytes, total)?;

    let type_byte = bytes[LENGTH_PREFIX_SIZE];
    let msg_type =
        MessageType::try_from(type_byte).map_err(|_| FrameError::UnknownMessageType(type_byte))?;
    let payload = &bytes[LENGTH_PREFIX_SIZE + 1..total];

    let msg = match msg_type {
        MessageType::Script => IpcMessage::Script(payload.to_vec()),
        MessageType::Unload if payload.is_empty() => IpcMessage::Unload,
        MessageType::Unload => return Err(FrameError::UnexpectedPayload(payload.len())),
    };
    Ok((msg, total))
}

// ── Inbound ───────────────────────────────────────────────────────────────────

/// Frames an inbound reply as `<len><payload>`.
///
/// # Errors
///
/// Returns [`FrameError::PayloadTooLarge`] if the length overflows `i32`.
pub fn encode_reply(payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    let len = length_prefix(payload.len()).ok_or(FrameError::PayloadTooLarge(payload.len()))?;

    let mut buf = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    buf.extend_from_slice(&len.to_ne_bytes());
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Decodes one inbound reply from the beginning of `bytes`.
///
/// Returns the payload and the total number of bytes consumed.
///
/// # Errors
///
/// Returns [`FrameError`] if the frame is truncated or its length is negative.
pub fn decode_reply(bytes: &[u8]) -> Result<(Vec<u8>, usize), FrameError> {
    let len = read_length(bytes)?;
    let total = LENGTH_PREFIX_SIZE + len;
    require_len(bytes, total)?;
    Ok((bytes[LENGTH_PREFIX_SIZE..total].to_vec(), total))
}

/// Interprets a raw length prefix read off a stream.
///
/// # Errors
///
/// Returns [`FrameError::NegativeLength`] for a negative value.
pub fn parse_length_prefix(prefix: [u8; LENGTH_PREFIX_SIZE]) -> Result<usize, FrameError> {
    let len = i32::from_ne_bytes(prefix);
    usize::try_from(len).map_err(|_| FrameError::NegativeLength(len))
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn length_prefix(len: usize) -> Option<i32> {
    i32::try_from(len).ok()
}

fn read_length(bytes: &[u8]) -> Result<usize, FrameError> {
    require_len(bytes, LENGTH_PREFIX_SIZE)?;
    parse_length_prefix([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn require_len(buf: &[u8], needed: usize) -> Result<(), FrameError> {
    if buf.len() < needed {
        Err(FrameError::InsufficientData {
            needed,
            available: buf.len(),
        })
    } else {
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_frame_script_layout() {
        // Arrange
        let msg = IpcMessage::Script(vec![0xDE, 0xAD]);

        // Act
        let bytes = encode_frame(&msg).unwrap();

        // Assert
        assert_eq!(&bytes[0..4], &3i32.to_ne_bytes());
        assert_eq!(bytes[4], MessageType::Script as u8);
        assert_eq!(&bytes[5..], &[0xDE, 0xAD]);
    }

    #[test]
    fn test_encode_frame_unload_is_type_byte_only() {
        let bytes = encode_frame(&IpcMessage::Unload).unwrap();
        let mut expected = 1i32.to_ne_bytes().to_vec();
        expected.push(1);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_frame_round_trip() {
        let msg = IpcMessage::Script(b"abyss\0tux\0".to_vec());
        let bytes = encode_frame(&msg).unwrap();
        let (decoded, consumed) = decode_frame(&bytes).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn test_decode_frame_consumes_only_first_frame() {
        let mut bytes = encode_frame(&IpcMessage::Script(vec![7])).unwrap();
        let first_len = bytes.len();
        bytes.extend(encode_frame(&IpcMessage::Unload).unwrap());

        let (first, consumed) = decode_frame(&bytes).unwrap();
        assert_eq!(first, IpcMessage::Script(vec![7]));
        assert_eq!(consumed, first_len);

        let (second, _) = decode_frame(&bytes[consumed..]).unwrap();
        assert_eq!(second, IpcMessage::Unload);
    }

    #[test]
    fn test_decode_frame_truncated_payload() {
        let bytes = encode_frame(&IpcMessage::Script(vec![1, 2, 3])).unwrap();
        let err = decode_frame(&bytes[..6]).unwrap_err();
        assert_eq!(
            err,
            FrameError::InsufficientData {
                needed: 8,
                available: 6
            }
        );
    }

    #[test]
    fn test_decode_frame_unknown_type() {
        let mut bytes = 1i32.to_ne_bytes().to_vec();
        bytes.push(0x7F);
        assert_eq!(decode_frame(&bytes).unwrap_err(), FrameError::UnknownMessageType(0x7F));
    }

    #[test]
    fn test_decode_frame_zero_length() {
        let bytes = 0i32.to_ne_bytes();
        assert_eq!(decode_frame(&bytes).unwrap_err(), FrameError::EmptyFrame(0));
    }

    #[test]
    fn test_decode_frame_unload_with_payload() {
        let mut bytes = 3i32.to_ne_bytes().to_vec();
        bytes.extend_from_slice(&[1, 0xAA, 0xBB]);
        assert_eq!(decode_frame(&bytes).unwrap_err(), FrameError::UnexpectedPayload(2));
    }

    #[test]
    fn test_reply_round_trip() {
        let bytes = encode_reply(b"loaded").unwrap();
        assert_eq!(&bytes[0..4], &6i32.to_ne_bytes());
        let (payload, consumed) = decode_reply(&bytes).unwrap();
        assert_eq!(payload, b"loaded");
        assert_eq!(consumed, 10);
    }

    #[test]
    fn test_empty_reply() {
        let bytes = encode_reply(&[]).unwrap();
        let (payload, consumed) = decode_reply(&bytes).unwrap();
        assert!(payload.is_empty());
        assert_eq!(consumed, 4);
    }

    #[test]
    fn test_decode_reply_negative_length() {
        let bytes = (-5i32).to_ne_bytes();
        assert_eq!(decode_reply(&bytes).unwrap_err(), FrameError::NegativeLength(-5));
    }

    #[test]
    fn test_decode_reply_short_prefix() {
        let err = decode_reply(&[0, 0]).unwrap_err();
        assert_eq!(
            err,
            FrameError::InsufficientData {
                needed: 4,
                available: 2
            }
        );
    }
}
