use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use crate::error::Result;

/// Identity of one active connection, taken from the peer's socket address.
///
/// Cheap to copy; a handler instance is bound to exactly one of these for
/// its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(SocketAddr);

impl ConnectionId {
    /// The peer address this identity was derived from.
    pub fn peer_addr(&self) -> SocketAddr {
        self.0
    }
}

impl From<SocketAddr> for ConnectionId {
    fn from(addr: SocketAddr) -> Self {
        Self(addr)
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A connected TCP stream — implements Read + Write.
///
/// This is the fundamental I/O type returned by transport operations.
/// Reads may legally return fewer bytes than requested; writes may be
/// unblocked from the outside by shutting the stream down.
pub struct TcpConnection {
    inner: TcpStream,
    id: ConnectionId,
}

impl Read for TcpConnection {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for TcpConnection {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl TcpConnection {
    /// Wrap an already-connected stream.
    pub fn from_std(stream: TcpStream) -> Result<Self> {
        let id = ConnectionId(stream.peer_addr()?);
        Ok(Self { inner: stream, id })
    }

    /// Identity of this connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The remote address of this connection.
    pub fn peer_addr(&self) -> SocketAddr {
        self.id.peer_addr()
    }

    /// The local address of this connection.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.inner.local_addr().map_err(Into::into)
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_write_timeout(timeout).map_err(Into::into)
    }

    /// Try to clone this connection (creates a new file descriptor sharing
    /// the same socket).
    pub fn try_clone(&self) -> Result<Self> {
        let cloned = self.inner.try_clone()?;
        Ok(Self {
            inner: cloned,
            id: self.id,
        })
    }

    /// Shut down both halves of the connection.
    ///
    /// Blocked reads and writes on any clone of this connection error out.
    pub fn shutdown(&self) -> Result<()> {
        self.inner.shutdown(Shutdown::Both).map_err(Into::into)
    }
}

impl std::fmt::Debug for TcpConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpConnection").field("peer", &self.id).finish()
    }
}
