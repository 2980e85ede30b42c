use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;
use watone_frame::Envelope;

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
struct ReceivedOutput<'a> {
    #[serde(rename = "type")]
    msg_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Value>,
    origin: &'a str,
    timestamp: String,
}

/// Print one message received by the host window.
///
/// Messages that are not envelopes are still printed, with no type.
pub fn print_received(message: &Value, origin: &str, format: OutputFormat) {
    let envelope = Envelope::from_value(message);
    let msg_type = envelope.as_ref().map(|envelope| envelope.msg_type.as_str());
    let data = envelope.as_ref().and_then(|envelope| envelope.data.as_ref());

    match format {
        OutputFormat::Json => {
            let out = ReceivedOutput {
                msg_type,
                data,
                origin,
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
                .set_header(vec!["TYPE", "ORIGIN", "DATA"])
                .add_row(vec![
                    msg_type.unwrap_or("-").to_string(),
                    origin.to_string(),
                    data.map_or_else(|| "-".to_string(), Value::to_string),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "type={} origin={} data={}",
                msg_type.unwrap_or("-"),
                origin,
                data.map_or_else(|| "-".to_string(), Value::to_string)
            );
        }
        OutputFormat::Raw => println!("{message}"),
    }
}

/// Print a reply payload returned to a child command.
pub fn print_value(value: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Raw => println!("{value}"),
        OutputFormat::Pretty => println!(
            "{}",
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        ),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            match value {
                Value::Object(fields) => {
                    for (key, field) in fields {
                        table.add_row(vec![key.clone(), display_scalar(field)]);
                    }
                }
                other => {
                    table.add_row(vec!["value".to_string(), display_scalar(other)]);
                }
            }
            println!("{table}");
        }
    }
}

fn display_scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
