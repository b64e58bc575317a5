//! Length-prefixed message framing for TCP byte streams.
//!
//! This is the core layer of tcpframe. Every message on the wire is a
//! 4-byte little-endian length followed by the body, with the length counted
//! from the start of the prefix itself — the assembled buffer, prefix
//! included, always equals the declared length.
//!
//! No partial reads, no buffer management in user code.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_len, encode_message, FrameConfig, Message, DEFAULT_MAX_FRAME, PREFIX_SIZE,
};
pub use error::{FrameError, Result};
pub use reader::MessageReader;
pub use writer::MessageWriter;
