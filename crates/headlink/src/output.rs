use std::io::{IsTerminal, Write};
use std::time::Duration;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use headlink_device::StepOutcome;
use headlink_itmp::{Capability, Message, Result as MessageResult, Value};
use headlink_transport::PortInfo;
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

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn values_json(values: &[Value]) -> serde_json::Value {
    serde_json::Value::Array(values.iter().map(Value::to_json).collect())
}

fn values_text(values: &[Value]) -> String {
    values_json(values).to_string()
}

pub fn print_raw(data: &[u8]) -> std::io::Result<()> {
    let mut out = std::io::stdout();
    out.write_all(data)?;
    out.flush()
}

pub fn hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}

#[derive(Serialize)]
struct PortOutput<'a> {
    name: &'a str,
    kind: &'a str,
    description: Option<&'a str>,
    serial_number: Option<&'a str>,
}

pub fn print_ports(ports: &[PortInfo], format: OutputFormat) {
    let rows: Vec<PortOutput<'_>> = ports
        .iter()
        .map(|p| PortOutput {
            name: &p.name,
            kind: p.kind,
            description: p.description.as_deref(),
            serial_number: p.serial_number.as_deref(),
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            let mut table = new_table(vec!["PORT", "TYPE", "DESCRIPTION", "SERIAL"]);
            for row in &rows {
                table.add_row(vec![
                    row.name,
                    row.kind,
                    row.description.unwrap_or("-"),
                    row.serial_number.unwrap_or("-"),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for row in &rows {
                match row.description {
                    Some(desc) => println!("{} ({}, {desc})", row.name, row.kind),
                    None => println!("{} ({})", row.name, row.kind),
                }
            }
        }
    }
}

#[derive(Serialize)]
struct ReplyOutput<'a> {
    procedure: &'a str,
    result: serde_json::Value,
}

/// Print the payload of a RESULT reply.
pub fn print_reply(procedure: &str, values: &[Value], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&ReplyOutput {
            procedure,
            result: values_json(values),
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["#", "TYPE", "VALUE"]);
            for (i, value) in values.iter().enumerate() {
                table.add_row(vec![
                    i.to_string(),
                    value.type_name().to_string(),
                    value.to_string(),
                ]);
            }
            println!("{procedure}");
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{procedure} -> {}", values_text(values)),
        OutputFormat::Raw => println!("{}", values_text(values)),
    }
}

#[derive(Serialize)]
struct CapabilityOutput<'a> {
    path: &'a str,
    doc: Option<&'a str>,
    args: serde_json::Value,
    ret: serde_json::Value,
}

pub fn print_capabilities(caps: &[Capability], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let rows: Vec<CapabilityOutput<'_>> = caps
                .iter()
                .map(|c| CapabilityOutput {
                    path: &c.path,
                    doc: c.doc.as_deref(),
                    args: values_json(&c.args),
                    ret: values_json(&c.ret),
                })
                .collect();
            print_json(&rows);
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["PATH", "ARGS", "RETURNS", "DOC"]);
            for cap in caps {
                table.add_row(vec![
                    cap.path.clone(),
                    cap.arg_names().join(", "),
                    cap.ret_names().join(", "),
                    cap.doc.clone().unwrap_or_default(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for cap in caps {
                println!("{}({})", cap.path, cap.arg_names().join(", "));
                if let Some(doc) = &cap.doc {
                    println!("    {doc}");
                }
            }
        }
    }
}

#[derive(Serialize)]
struct MoveOutput {
    target: i64,
    position: i64,
    moved: bool,
    duration_ms: f64,
    result: serde_json::Value,
}

pub fn print_move(
    target: i64,
    position: i64,
    duration: Duration,
    result: Option<&[Value]>,
    format: OutputFormat,
) {
    let duration_ms = (duration.as_secs_f64() * 1000.0 * 100.0).round() / 100.0;
    let out = MoveOutput {
        target,
        position,
        moved: result.is_some(),
        duration_ms,
        result: result.map(values_json).unwrap_or(serde_json::Value::Null),
    };
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => {
            let mut table = new_table(vec!["TARGET", "POSITION", "DURATION", "RESULT"]);
            table.add_row(vec![
                out.target.to_string(),
                out.position.to_string(),
                format!("{duration_ms} ms"),
                if out.moved {
                    out.result.to_string()
                } else {
                    "skipped".to_string()
                },
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            if out.moved {
                println!(
                    "moved to {} in {duration_ms} ms, position {}",
                    out.target, out.position
                );
            } else {
                println!("already at {}", out.target);
            }
        }
    }
}

#[derive(Serialize)]
struct StepOutput {
    step: usize,
    kind: &'static str,
    name: String,
    reply: serde_json::Value,
}

pub fn print_steps(outcomes: &[StepOutcome], format: OutputFormat) {
    let rows: Vec<StepOutput> = outcomes
        .iter()
        .map(|o| {
            let (kind, name) = match &o.step {
                headlink_device::Step::Call { procedure, .. } => ("call", procedure.clone()),
                headlink_device::Step::Describe { topic } => ("describe", topic.clone()),
            };
            StepOutput {
                step: o.index,
                kind,
                name,
                reply: o
                    .reply
                    .as_deref()
                    .map(values_json)
                    .unwrap_or(serde_json::Value::Null),
            }
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            let mut table = new_table(vec!["STEP", "KIND", "NAME", "REPLY"]);
            for row in &rows {
                table.add_row(vec![
                    row.step.to_string(),
                    row.kind.to_string(),
                    row.name.clone(),
                    row.reply.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for row in &rows {
                println!("[{}] {} {} -> {}", row.step, row.kind, row.name, row.reply);
            }
        }
    }
}

#[derive(Serialize)]
struct FrameOutput {
    len: usize,
    frame_hex: String,
}

/// Print an encoded frame. `Raw` writes the frame bytes unchanged.
pub fn print_frame(frame: &[u8], format: OutputFormat) -> std::io::Result<()> {
    match format {
        OutputFormat::Json => print_json(&FrameOutput {
            len: frame.len(),
            frame_hex: hex(frame),
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["LEN", "FRAME"]);
            table.add_row(vec![frame.len().to_string(), hex(frame)]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", frame.escape_ascii()),
        OutputFormat::Raw => print_raw(frame)?,
    }
    Ok(())
}

#[derive(Serialize)]
struct MessageOutput {
    address: u8,
    kind: String,
    code: u8,
    id: u64,
    fields: serde_json::Value,
}

pub fn print_message(address: u8, message: &Message, format: OutputFormat) -> MessageResult<()> {
    let fields = message.to_fields()?;
    let out = MessageOutput {
        address,
        kind: message.kind().to_string(),
        code: message.kind().code(),
        id: message.id(),
        fields: values_json(&fields),
    };
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => {
            let mut table = new_table(vec!["ADDR", "TYPE", "ID", "FIELDS"]);
            table.add_row(vec![
                format!("0x{:02x}", out.address),
                format!("{} ({})", out.kind, out.code),
                out.id.to_string(),
                out.fields.to_string(),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => println!(
            "addr=0x{:02x} type={} id={} fields={}",
            out.address, out.kind, out.id, out.fields
        ),
    }
    Ok(())
}
