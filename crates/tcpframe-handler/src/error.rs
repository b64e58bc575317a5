/// Errors that can occur in connection handler operations.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] tcpframe_transport::TransportError),

    /// Framing-level error.
    #[error("frame error: {0}")]
    Frame(#[from] tcpframe_frame::FrameError),

    /// A queue endpoint was dropped while an operation was pending.
    #[error("message queue closed")]
    QueueClosed,

    /// The handler has no connection bound yet.
    #[error("handler not started")]
    NotStarted,

    /// A pump loop panicked instead of returning an error.
    #[error("{0} loop panicked")]
    LoopPanicked(&'static str),
}

pub type Result<T> = std::result::Result<T, HandlerError>;
