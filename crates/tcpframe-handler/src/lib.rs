//! Per-connection message pump for tcpframe.
//!
//! This is the orchestration layer: one [`ConnectionHandler`] per TCP
//! connection, pumping whole length-prefixed messages between the socket
//! and a pool of worker threads through a pair of bounded queues.

pub mod error;
pub mod handler;

pub use error::{HandlerError, Result};
pub use handler::{ConnectionHandler, HandlerConfig, HandlerTask};
