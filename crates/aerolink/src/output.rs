use std::io::IsTerminal;

use aerolink_frame::{DecoderStats, Message, Value};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

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
    name: &'a str,
    id: u32,
    seq: u8,
    system_id: u8,
    component_id: u8,
    fields: serde_json::Map<String, serde_json::Value>,
}

pub fn print_message(message: &Message, format: OutputFormat) {
    let header = message.header();
    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                name: message.name(),
                id: message.id(),
                seq: header.seq(),
                system_id: header.system_id(),
                component_id: header.component_id(),
                fields: fields_json(message),
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
                .set_header(vec!["MESSAGE", "SEQ", "SENDER", "FIELDS"])
                .add_row(vec![
                    format!("{} (#{})", message.name(), message.id()),
                    header.seq().to_string(),
                    format!("{}/{}", header.system_id(), header.component_id()),
                    fields_preview(message),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{} (#{}) seq={} sender={}/{} {}",
                message.name(),
                message.id(),
                header.seq(),
                header.system_id(),
                header.component_id(),
                fields_preview(message)
            );
        }
        OutputFormat::Raw => {
            println!("{message}");
        }
    }
}

pub fn print_decode_summary(stats: DecoderStats, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct SummaryOutput {
                messages: u64,
                unknown_messages: u64,
                checksum_failures: u64,
                skipped_bytes: u64,
            }
            let out = SummaryOutput {
                messages: stats.messages,
                unknown_messages: stats.unknown_messages,
                checksum_failures: stats.checksum_failures,
                skipped_bytes: stats.skipped_bytes,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        _ => {
            println!(
                "decoded {} message(s), {} unknown, {} checksum failure(s), {} byte(s) skipped",
                stats.messages,
                stats.unknown_messages,
                stats.checksum_failures,
                stats.skipped_bytes
            );
        }
    }
}

fn fields_json(message: &Message) -> serde_json::Map<String, serde_json::Value> {
    let mut map = serde_json::Map::new();
    for field in message.definition().fields() {
        if let Ok(value) = message.field(field.name()) {
            map.insert(field.name().to_string(), value_json(&value));
        }
    }
    map
}

fn value_json(value: &Value) -> serde_json::Value {
    use serde_json::json;
    match value {
        Value::Int(v) => json!(v),
        Value::UInt(v) => json!(v),
        Value::Float(v) => json!(v),
        Value::Double(v) => json!(v),
        Value::IntArray(v) => json!(v),
        Value::UIntArray(v) => json!(v),
        Value::FloatArray(v) => json!(v),
        Value::DoubleArray(v) => json!(v),
        Value::Str(v) => json!(v),
    }
}

fn fields_preview(message: &Message) -> String {
    let mut parts = Vec::new();
    for field in message.definition().fields() {
        if let Ok(value) = message.field(field.name()) {
            parts.push(format!("{}={:?}", field.name(), value));
        }
    }
    parts.join(" ")
}
