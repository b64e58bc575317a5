use std::time::Duration;

/// Errors that can occur while assembling or writing messages.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The declared message length exceeds the configured maximum.
    #[error("declared message length {size} exceeds maximum {max}")]
    FrameTooLarge { size: usize, max: usize },

    /// The payload handed to the encode path is too large to frame.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The declared length cannot cover its own prefix.
    #[error("invalid declared length {len} (must be 0 or at least 4)")]
    InvalidLength { len: usize },

    /// The read budget for one message ran out before assembly completed.
    #[error("read deadline exceeded ({elapsed:?} elapsed, budget {deadline:?})")]
    DeadlineExceeded {
        elapsed: Duration,
        deadline: Duration,
    },

    /// An I/O error occurred while reading or writing messages.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete message was received.
    #[error("connection closed (incomplete message)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
