//! Protocol module containing the payload codec and the IPC transport framing.

pub mod codec;
pub mod messages;
pub mod payload;

pub use codec::{
    decode_frame, decode_reply, encode_frame, encode_reply, parse_length_prefix, FrameError,
    LENGTH_PREFIX_SIZE,
};
pub use messages::*;
pub use payload::{decode_payload, encode_payload, PayloadError, FRAMEBULK_SIZE};
