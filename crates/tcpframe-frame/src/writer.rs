use std::io::{ErrorKind, Write};

use crate::codec::{encode_message, FrameConfig, Message, PREFIX_SIZE};
use crate::error::{FrameError, Result};

/// Writes whole messages to any `Write` stream.
///
/// Messages go out strictly in call order, each as one contiguous byte
/// sequence followed by a flush. Bytes handed to [`write_message`] are
/// written verbatim; [`send`] frames a payload first.
///
/// [`write_message`]: MessageWriter::write_message
/// [`send`]: MessageWriter::send
pub struct MessageWriter<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: Write> MessageWriter<T> {
    /// Create a new message writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new message writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Write a message's wire bytes exactly as enqueued (blocking).
    pub fn write_message(&mut self, message: &Message) -> Result<()> {
        self.write_bytes(message.as_bytes())
    }

    /// Frame a payload and send it (blocking).
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        let total = PREFIX_SIZE + payload.len();
        if total > self.config.max_frame_size {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_frame_size.saturating_sub(PREFIX_SIZE),
            });
        }

        let wire = encode_message(payload)?;
        self.write_bytes(&wire)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.inner.write(&bytes[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
