//! Binary codec for the script payload consumed by the control module.
//!
//! Wire format:
//! ```text
//! [map:N][0x00][kart_name:N][0x00][num_ai_karts:4][num_laps:4][difficulty:4][quick_reset:1]
//! [flags:2][num_ticks:2][angle:4]   (repeated once per framebulk)
//! ```
//! All multi-byte values use host byte order; the control module runs on the
//! same machine and reads them back with plain struct loads.  There is no
//! length prefix: framing is added by [`crate::protocol::codec`].

use thiserror::Error;

use crate::script::framebulk::{Framebulk, InputFlags};
use crate::script::header::RaceHeader;

/// Size of one encoded framebulk record in bytes.
pub const FRAMEBULK_SIZE: usize = 8;

/// Size of the fixed-width tail of the header (three `i32` plus one flag byte).
const HEADER_TAIL_SIZE: usize = 4 + 4 + 4 + 1;

/// Errors that can occur while decoding a payload.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PayloadError {
    /// The byte slice ends before a fixed-width field is complete.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// A NUL-terminated string runs to the end of the buffer.
    #[error("string field '{field}' starting at offset {offset} has no NUL terminator")]
    UnterminatedString { field: &'static str, offset: usize },

    /// A field holds a value the encoder never produces.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Bytes left after the last complete framebulk record.
    #[error("{count} trailing bytes do not form a complete framebulk record")]
    TrailingBytes { count: usize },
}

// ── Encoding ──────────────────────────────────────────────────────────────────

/// Encodes the header part of the payload.
///
/// String fields are written verbatim followed by a NUL byte.  A validated
/// [`RaceHeader`] only holds catalog identifiers, so neither field can
/// contain an interior NUL.
///
/// # Examples
///
/// ```rust
/// use tas_core::protocol::payload::encode_header;
/// use tas_core::RaceHeader;
///
/// let header = RaceHeader {
///     map: "abyss".to_string(),
///     kart_name: "tux".to_string(),
///     num_laps: 1,
///     difficulty: 2,
///     num_ai_karts: 0,
///     quick_reset: false,
/// };
/// let bytes = encode_header(&header);
/// assert_eq!(&bytes[..10], b"abyss\0tux\0");
/// assert_eq!(bytes.len(), 10 + 13);
/// ```
pub fn encode_header(header: &RaceHeader) -> Vec<u8> {
    let mut buf =
        Vec::with_capacity(header.map.len() + header.kart_name.len() + 2 + HEADER_TAIL_SIZE);
    write_c_string(&mut buf, &header.map);
    write_c_string(&mut buf, &header.kart_name);
    buf.extend_from_slice(&header.num_ai_karts.to_ne_bytes());
    buf.extend_from_slice(&header.num_laps.to_ne_bytes());
    buf.extend_from_slice(&header.difficulty.to_ne_bytes());
    buf.push(u8::from(header.quick_reset));
    buf
}

/// Encodes one framebulk into its fixed 8-byte record.
pub fn encode_framebulk(framebulk: &Framebulk) -> [u8; FRAMEBULK_SIZE] {
    // Every defined flag fits in the low six bits, so the cast is lossless.
    let flags = framebulk.flags.to_bits() as i16;

    let mut record = [0u8; FRAMEBULK_SIZE];
    record[0..2].copy_from_slice(&flags.to_ne_bytes());
    record[2..4].copy_from_slice(&framebulk.num_ticks.to_ne_bytes());
    record[4..8].copy_from_slice(&framebulk.angle.to_ne_bytes());
    record
}

/// Encodes the complete payload: the header followed by every framebulk in
/// order.
pub fn encode_payload(header: &RaceHeader, framebulks: &[Framebulk]) -> Vec<u8> {
    let mut buf = encode_header(header);
    buf.reserve(framebulks.len() * FRAMEBULK_SIZE);
    for framebulk in framebulks {
        buf.extend_from_slice(&encode_framebulk(framebulk));
    }
    buf
}

// ── Decoding ──────────────────────────────────────────────────────────────────

/// Decodes the header from the beginning of `bytes`.
///
/// Returns the header and the number of bytes consumed.  Values are not
/// re-validated against the catalogs; only the byte layout is checked.
///
/// # Errors
///
/// Returns [`PayloadError`] if the bytes are truncated or malformed.
pub fn decode_header(bytes: &[u8]) -> Result<(RaceHeader, usize), PayloadError> {
    let (map, offset) = read_c_string(bytes, 0, "map")?;
    let (kart_name, offset) = read_c_string(bytes, offset, "kart_name")?;

    require_len(bytes, offset + HEADER_TAIL_SIZE)?;
    let num_ai_karts = read_i32(bytes, offset);
    let num_laps = read_i32(bytes, offset + 4);
    let difficulty = read_i32(bytes, offset + 8);
    let quick_reset = match bytes[offset + 12] {
        0 => false,
        1 => true,
        other => {
            return Err(PayloadError::MalformedPayload(format!(
                "quick_reset byte must be 0 or 1, got {other}"
            )))
        }
    };

    let header = RaceHeader {
        map,
        kart_name,
        num_laps,
        difficulty,
        num_ai_karts,
        quick_reset,
    };
    Ok((header, offset + HEADER_TAIL_SIZE))
}

/// Decodes one 8-byte framebulk record.
///
/// # Errors
///
/// Returns [`PayloadError::InsufficientData`] for a short slice and
/// [`PayloadError::MalformedPayload`] for undefined flag bits.
pub fn decode_framebulk(bytes: &[u8]) -> Result<Framebulk, PayloadError> {
    require_len(bytes, FRAMEBULK_SIZE)?;

    let raw_flags = i16::from_ne_bytes([bytes[0], bytes[1]]);
    let flags = u16::try_from(raw_flags)
        .ok()
        .and_then(InputFlags::from_bits)
        .ok_or_else(|| {
            PayloadError::MalformedPayload(format!("undefined framebulk flag bits: {raw_flags:#06x}"))
        })?;
    let num_ticks = i16::from_ne_bytes([bytes[2], bytes[3]]);
    let angle = f32::from_ne_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);

    Ok(Framebulk {
        num_ticks,
        angle,
        flags,
    })
}

/// Decodes a complete payload produced by [`encode_payload`].
///
/// # Errors
///
/// Returns [`PayloadError::TrailingBytes`] when the bytes after the header are
/// not a whole number of records, and any error from [`decode_header`] or
/// [`decode_framebulk`].
pub fn decode_payload(bytes: &[u8]) -> Result<(RaceHeader, Vec<Framebulk>), PayloadError> {
    let (header, consumed) = decode_header(bytes)?;
    let body = &bytes[consumed..];

    let records = body.chunks_exact(FRAMEBULK_SIZE);
    let remainder = records.remainder().len();
    if remainder != 0 {
        return Err(PayloadError::TrailingBytes { count: remainder });
    }

    let framebulks = records.map(decode_framebulk).collect::<Result<Vec<_>, _>>()?;
    Ok((header, framebulks))
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn require_len(buf: &[u8], needed: usize) -> Result<(), PayloadError> {
    if buf.len() < needed {
        Err(PayloadError::InsufficientData {
            needed,
            available: buf.len(),
        })
    } else {
        Ok(())
    }
}

/// Caller must have checked that `offset + 4 <= buf.len()`.
fn read_i32(buf: &[u8], offset: usize) -> i32 {
    i32::from_ne_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

/// Writes the UTF-8 bytes of `s` followed by a NUL terminator.
fn write_c_string(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(s.as_bytes());
    buf.push(0x00);
}

/// Reads a NUL-terminated UTF-8 string starting at `offset`.
/// Returns the string and the offset of the byte after the terminator.
fn read_c_string(
    buf: &[u8],
    offset: usize,
    field: &'static str,
) -> Result<(String, usize), PayloadError> {
    let rest = buf.get(offset..).unwrap_or_default();
    let len = rest
        .iter()
        .position(|&b| b == 0x00)
        .ok_or(PayloadError::UnterminatedString { field, offset })?;
    let s = std::str::from_utf8(&rest[..len])
        .map_err(|e| PayloadError::MalformedPayload(format!("{field}: invalid UTF-8: {e}")))?
        .to_string();
    Ok((s, offset + len + 1))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
