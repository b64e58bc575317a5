use std::sync::Arc;

use tracing::info;

use tcpframe_frame::FrameError;
use tcpframe_handler::{ConnectionHandler, HandlerConfig, HandlerError};
use tcpframe_transport::TcpAcceptor;

use crate::cmd::{parse_duration, EchoArgs};
use crate::exit::{handler_error, transport_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

/// Accept one connection and echo every message back through the worker
/// pool until the peer goes away.
pub fn run(args: EchoArgs, _format: OutputFormat) -> CliResult<i32> {
    let deadline = parse_duration(&args.deadline)?;

    let acceptor =
        TcpAcceptor::bind(args.addr).map_err(|err| transport_error("bind failed", err))?;
    let conn = acceptor
        .accept()
        .map_err(|err| transport_error("accept failed", err))?;
    info!(peer = %conn.id(), "peer connected");

    let handler = Arc::new(ConnectionHandler::new(HandlerConfig {
        worker_count: args.workers.max(1),
        queue_capacity: args.queue_capacity,
        read_deadline: Some(deadline),
        ..HandlerConfig::default()
    }));

    let routine = {
        let handler = Arc::clone(&handler);
        move || {
            while let Ok(msg) = handler.recv() {
                if handler.send_raw(msg.into_bytes()).is_err() {
                    break;
                }
            }
        }
    };
    let task = handler
        .start(conn, routine)
        .map_err(|err| handler_error("start failed", err))?;

    match task.join_reader() {
        Ok(()) | Err(HandlerError::Frame(FrameError::ConnectionClosed)) => {
            info!("peer disconnected");
            Ok(SUCCESS)
        }
        Err(err) => Err(handler_error("connection failed", err)),
    }
}
