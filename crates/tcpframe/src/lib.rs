//! Length-prefixed TCP message framing with per-connection worker pools.
//!
//! tcpframe splits a raw TCP byte stream into whole, delimited messages
//! using a 4-byte little-endian length prefix (counted from the start of
//! the prefix itself), and pumps them between the socket and application
//! workers through bounded queues.
//!
//! # Crate Structure
//!
//! - [`transport`] — TCP connection establishment and the stream type
//! - [`frame`] — Length codec, message assembly, message writing
//! - [`handler`] — Per-connection read/write loops and worker pool

/// Re-export transport types.
pub mod transport {
    pub use tcpframe_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use tcpframe_frame::*;
}

/// Re-export handler types.
pub mod handler {
    pub use tcpframe_handler::*;
}
