use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tcpframe_frame::{FrameConfig, FrameError, Message, MessageReader};
use tcpframe_transport::TcpAcceptor;

use crate::cmd::{parse_duration, ListenArgs};
use crate::exit::{frame_error, transport_error, CliError, CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let acceptor =
        TcpAcceptor::bind(args.addr).map_err(|err| transport_error("bind failed", err))?;

    let mut config = FrameConfig::default();
    if let Some(deadline) = &args.deadline {
        config.read_deadline = Some(parse_duration(deadline)?);
    }
    if let Some(max) = args.max_frame_size {
        config.max_frame_size = max;
    }

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let conn = match acceptor.accept() {
            Ok(conn) => conn,
            Err(err) => return Err(transport_error("accept failed", err)),
        };
        let id = conn.id();
        let mut reader = MessageReader::with_config(conn, config.clone());

        while running.load(Ordering::SeqCst) {
            let bytes = match reader.read_message() {
                Ok(bytes) => bytes,
                Err(FrameError::ConnectionClosed) => break,
                Err(err) => return Err(frame_error("receive failed", err)),
            };

            print_message(&Message::new(id, bytes), format);
            printed = printed.saturating_add(1);

            if let Some(count) = args.count {
                if printed >= count {
                    return Ok(SUCCESS);
                }
            }
        }
    }

    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
