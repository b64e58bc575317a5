use bytes::{BufMut, Bytes, BytesMut};
use tcpframe_transport::ConnectionId;

use crate::error::{FrameError, Result};

/// Length prefix size: one little-endian u32.
pub const PREFIX_SIZE: usize = 4;

/// Default maximum message size (prefix included): 16 MiB.
pub const DEFAULT_MAX_FRAME: usize = 16 * 1024 * 1024;

/// Decode a length prefix.
///
/// The value counts the whole message from the start of the prefix itself,
/// so a well-formed non-empty message declares at least [`PREFIX_SIZE`].
/// No plausibility check happens here; callers guard against pathological
/// values.
pub fn decode_len(prefix: [u8; PREFIX_SIZE]) -> u32 {
    u32::from_le_bytes(prefix)
}

/// Frame a payload into wire-format message bytes.
///
/// Wire format:
/// ```text
/// ┌───────────────┬──────────────────────┐
/// │ Length (4B LE)│ Payload              │
/// │ prefix-incl.  │ (Length - 4 bytes)   │
/// └───────────────┴──────────────────────┘
/// ```
pub fn encode_message(payload: &[u8]) -> Result<Bytes> {
    let total = PREFIX_SIZE + payload.len();
    if total > u32::MAX as usize {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: u32::MAX as usize - PREFIX_SIZE,
        });
    }
    let mut buf = BytesMut::with_capacity(total);
    buf.put_u32_le(total as u32);
    buf.put_slice(payload);
    Ok(buf.freeze())
}

/// One whole wire message and the connection it belongs to.
///
/// The byte sequence is the full assembled buffer, length prefix included,
/// exactly as it appears on the wire. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct Message {
    conn: ConnectionId,
    bytes: Bytes,
}

impl Message {
    /// Bind wire-format bytes to a connection identity.
    pub fn new(conn: ConnectionId, bytes: impl Into<Bytes>) -> Self {
        Self {
            conn,
            bytes: bytes.into(),
        }
    }

    /// Frame a payload and bind it to a connection identity.
    pub fn from_payload(conn: ConnectionId, payload: &[u8]) -> Result<Self> {
        Ok(Self {
            conn,
            bytes: encode_message(payload)?,
        })
    }

    /// The connection this message was read from or is destined for.
    pub fn connection(&self) -> ConnectionId {
        self.conn
    }

    /// Total wire length, prefix included.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The full wire bytes, prefix included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The payload view: everything after the length prefix.
    pub fn payload(&self) -> &[u8] {
        self.bytes.get(PREFIX_SIZE..).unwrap_or_default()
    }

    /// Consume the message, keeping the wire bytes.
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

/// Configuration for message assembly and writing.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum accepted message size (prefix included). Default: 16 MiB.
    pub max_frame_size: usize,
    /// Wall-clock budget from the start of a message's prefix read to the
    /// completion of its assembly. `None` disables the budget.
    pub read_deadline: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME,
            read_deadline: None,
        }
    }
}
