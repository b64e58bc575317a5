use std::fs;

use tcpframe_frame::{FrameConfig, Message, MessageReader, MessageWriter};
use tcpframe_transport::TcpAcceptor;

use crate::cmd::{parse_duration, SendArgs};
use crate::exit::{frame_error, transport_error, CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let wait_deadline = parse_duration(&args.wait_deadline)?;
    let payload = resolve_payload(&args)?;

    let conn =
        TcpAcceptor::connect(args.addr).map_err(|err| transport_error("connect failed", err))?;

    let read_half = if args.wait {
        let half = conn
            .try_clone()
            .map_err(|err| transport_error("connect failed", err))?;
        // A silent server should time the wait out rather than hang it.
        half.set_read_timeout(Some(wait_deadline))
            .map_err(|err| transport_error("connect failed", err))?;
        Some(half)
    } else {
        None
    };

    let mut writer = MessageWriter::new(conn);
    for _ in 0..args.repeat {
        writer
            .send(&payload)
            .map_err(|err| frame_error("send failed", err))?;
    }

    if let Some(read_half) = read_half {
        let id = read_half.id();
        let config = FrameConfig {
            read_deadline: Some(wait_deadline),
            ..FrameConfig::default()
        };
        let mut reader = MessageReader::with_config(read_half, config);
        let bytes = reader
            .read_message()
            .map_err(|err| frame_error("receive failed", err))?;
        print_message(&Message::new(id, bytes), format);
    }

    Ok(SUCCESS)
}

fn resolve_payload(args: &SendArgs) -> CliResult<Vec<u8>> {
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path).map_err(|err| {
            crate::exit::io_error(&format!("failed reading {}", path.display()), err)
        });
    }
    Ok(Vec::new())
}
