//! Minimal echo server — accepts one connection and echoes messages back.
//!
//! Run with:
//!   cargo run --example echo-server
//!
//! In another terminal:
//!   cargo run --features cli -- send 127.0.0.1:7400 --data hello --wait

use std::sync::Arc;

use tcpframe::handler::{ConnectionHandler, HandlerConfig};
use tcpframe::transport::TcpAcceptor;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let acceptor = TcpAcceptor::bind("127.0.0.1:7400".parse()?)?;
    eprintln!("Listening on {}", acceptor.local_addr());

    // Accept one connection and echo messages until disconnect.
    let conn = acceptor.accept()?;
    eprintln!("Peer connected: {}", conn.id());

    let handler = Arc::new(ConnectionHandler::new(HandlerConfig::default()));
    let routine = {
        let handler = Arc::clone(&handler);
        move || {
            while let Ok(msg) = handler.recv() {
                eprintln!("Received {} bytes", msg.payload().len());
                if handler.send_raw(msg.into_bytes()).is_err() {
                    break;
                }
            }
        }
    };

    let task = handler.start(conn, routine)?;
    if let Err(err) = task.join_reader() {
        eprintln!("Peer disconnected: {err}");
    }

    Ok(())
}
