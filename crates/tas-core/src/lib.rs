//! # tas-core
//!
//! Shared library for the SuperTuxKart TAS toolchain containing the script
//! parser, header validation, and the binary payload codec.
//!
//! This crate is used by the `tas-client` binary and by any tooling that wants
//! to inspect or produce payloads.  It has zero dependencies on sockets, the
//! file system, or process control.
//!
//! # Architecture overview (for beginners)
//!
//! A *TAS script* is a plain-text file that describes a race configuration
//! (which track, which kart, how many laps) followed by a timeline of
//! controller inputs.  The external control module running inside the game
//! cannot read text: it expects a compact, fixed-layout binary payload.  This
//! crate turns one into the other in a single forward pass:
//!
//! ```text
//! raw text ─► normalize ─► header lines ─► RaceHeader ──┐
//!                     └──► framebulk lines ─► Vec<Framebulk> ─┴─► payload bytes
//! ```
//!
//! - **`script`** – Everything that understands the text format: the line
//!   normalizer, the header parser and its validators, and the framebulk
//!   parser.
//!
//! - **`protocol`** – How bytes travel to the control module.  The payload
//!   encoder/decoder and the `<length><type><payload>` transport framing.
//!
//! - **`compiler`** – The end-to-end pipeline gluing the two together.

pub mod compiler;
pub mod protocol;
pub mod script;

// Re-export the most-used types at the crate root so callers can write
// `tas_core::Framebulk` instead of `tas_core::script::framebulk::Framebulk`.
pub use compiler::{compile_script, CompiledScript};
pub use protocol::codec::{decode_frame, decode_reply, encode_frame, encode_reply, FrameError};
pub use protocol::messages::{IpcMessage, MessageType};
pub use protocol::payload::{decode_payload, encode_payload, PayloadError};
pub use script::error::{ScriptError, SyntaxWarning};
pub use script::framebulk::{Framebulk, InputFlags};
pub use script::header::{HeaderKey, RaceHeader};
pub use script::{parse_script, ScriptOptions, TasScript};
