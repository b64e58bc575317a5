use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use tcpframe_frame::Message;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    schema_id: &'a str,
    peer: String,
    wire_size: usize,
    payload_size: usize,
    payload: String,
    timestamp: String,
}

pub fn print_message(message: &Message, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                schema_id: "https://schemas.3leaps.dev/tcpframe/cli/v1/message-received.schema.json",
                peer: message.connection().to_string(),
                wire_size: message.len(),
                payload_size: message.payload().len(),
                payload: payload_preview(message.payload()),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PEER", "WIRE", "PAYLOAD BYTES", "PAYLOAD"])
                .add_row(vec![
                    message.connection().to_string(),
                    message.len().to_string(),
                    message.payload().len().to_string(),
                    payload_preview(message.payload()),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "peer={} wire={} payload={} data={}",
                message.connection(),
                message.len(),
                message.payload().len(),
                payload_preview(message.payload())
            );
        }
        OutputFormat::Raw => {
            print_raw(message.payload());
        }
    }
}

const PREVIEW_LIMIT: usize = 256;

fn payload_preview(payload: &[u8]) -> String {
    let text = String::from_utf8_lossy(payload);
    if text.chars().count() <= PREVIEW_LIMIT {
        return text.into_owned();
    }
    let truncated: String = text.chars().take(PREVIEW_LIMIT).collect();
    format!("{truncated}…")
}

fn print_raw(payload: &[u8]) {
    let mut stdout = std::io::stdout().lock();
    let _ = stdout.write_all(payload);
    let _ = stdout.write_all(b"\n");
    let _ = stdout.flush();
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
