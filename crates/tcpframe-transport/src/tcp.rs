use std::net::{SocketAddr, TcpListener};

use tracing::{debug, info};

use crate::conn::TcpConnection;
use crate::error::{Result, TransportError};

/// TCP socket transport.
///
/// Provides bind/accept/connect over IPv4 and IPv6 loopback or routed
/// addresses. Connection establishment lives here; everything past `accept`
/// or `connect` operates on the returned [`TcpConnection`] only.
pub struct TcpAcceptor {
    listener: TcpListener,
    addr: SocketAddr,
}

impl TcpAcceptor {
    /// Bind and listen on a TCP address.
    ///
    /// Binding to port 0 picks a free port; `local_addr` reports the actual
    /// one.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).map_err(|e| TransportError::Bind {
            addr,
            source: e,
        })?;
        let addr = listener.local_addr().map_err(|e| TransportError::Bind {
            addr,
            source: e,
        })?;

        info!(%addr, "listening on tcp socket");

        Ok(Self { listener, addr })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<TcpConnection> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted connection");
        TcpConnection::from_std(stream)
    }

    /// Connect to a listening TCP socket (blocking).
    pub fn connect(addr: SocketAddr) -> Result<TcpConnection> {
        let stream =
            std::net::TcpStream::connect(addr).map_err(|e| TransportError::Connect {
                addr,
                source: e,
            })?;
        debug!(%addr, "connected to tcp socket");
        TcpConnection::from_std(stream)
    }

    /// The address this socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}
