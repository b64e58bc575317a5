//! TCP transport abstraction for tcpframe.
//!
//! Provides connection establishment and the stream type everything else
//! builds on. This is the lowest layer of tcpframe: the framing and handler
//! crates only ever see a connected [`TcpConnection`].

pub mod conn;
pub mod error;
pub mod tcp;

pub use conn::{ConnectionId, TcpConnection};
pub use error::{Result, TransportError};
pub use tcp::TcpAcceptor;
