use std::io::{ErrorKind, Read};
use std::time::Instant;

use bytes::Bytes;

use crate::codec::{decode_len, FrameConfig, PREFIX_SIZE};
use crate::error::{FrameError, Result};

/// Assembles complete messages from any `Read` stream.
///
/// The stream is consumed in whatever fragment sizes the transport delivers;
/// callers always get whole messages. Each message is assembled against the
/// configured read deadline, measured from the moment its prefix read began.
pub struct MessageReader<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: Read> MessageReader<T> {
    /// Create a new message reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new message reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Read the next complete message (blocking).
    ///
    /// Returns the full wire bytes, prefix included; the buffer length
    /// always equals the declared length. Zero-length declarations carry no
    /// body and are skipped without surfacing a message.
    ///
    /// Any error is terminal for this reader: transport failures and EOF
    /// ([`FrameError::ConnectionClosed`]) mean the connection is unusable,
    /// and a blown deadline ([`FrameError::DeadlineExceeded`]) is treated
    /// the same way rather than skipping the stalled message.
    pub fn read_message(&mut self) -> Result<Bytes> {
        loop {
            let started = Instant::now();

            let mut prefix = [0u8; PREFIX_SIZE];
            self.fill_prefix(&mut prefix)?;

            let declared = decode_len(prefix) as usize;
            if declared == 0 {
                continue;
            }
            if declared < PREFIX_SIZE {
                return Err(FrameError::InvalidLength { len: declared });
            }
            if declared > self.config.max_frame_size {
                return Err(FrameError::FrameTooLarge {
                    size: declared,
                    max: self.config.max_frame_size,
                });
            }

            // The accumulation target includes the prefix already read, so
            // a declaration of exactly PREFIX_SIZE completes immediately.
            let mut buf = vec![0u8; declared];
            buf[..PREFIX_SIZE].copy_from_slice(&prefix);
            let mut filled = PREFIX_SIZE;

            while filled < declared {
                self.check_deadline(started)?;

                match self.inner.read(&mut buf[filled..]) {
                    Ok(0) => return Err(FrameError::ConnectionClosed),
                    Ok(n) => filled += n,
                    Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                    Err(err) => return Err(FrameError::Io(err)),
                }
            }

            return Ok(Bytes::from(buf));
        }
    }

    fn fill_prefix(&mut self, prefix: &mut [u8; PREFIX_SIZE]) -> Result<()> {
        let mut filled = 0;
        while filled < PREFIX_SIZE {
            match self.inner.read(&mut prefix[filled..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(())
    }

    fn check_deadline(&self, started: Instant) -> Result<()> {
        if let Some(deadline) = self.config.read_deadline {
            let elapsed = started.elapsed();
            if elapsed > deadline {
                return Err(FrameError::DeadlineExceeded { elapsed, deadline });
            }
        }
        Ok(())
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
