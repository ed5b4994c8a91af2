use std::str;

use opentelemetry_proto::tonic::collector::trace::v1::ExportTraceServiceRequest;
use prost::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::DecodeError;
use crate::json_normalizer::normalize_json_value;

/// Type alias representing one OTLP trace export request.
pub type TraceBatch = ExportTraceServiceRequest;

/// Supported encodings for raw OTLP trace payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// Binary protobuf (default, most efficient)
    #[default]
    Protobuf,
    /// OTLP/JSON
    Json,
    /// Newline-delimited JSON, one export request per line
    Jsonl,
}

impl InputFormat {
    /// Guess the format from a file extension, if it is a known one.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "pb" | "bin" | "protobuf" => Some(Self::Protobuf),
            "json" => Some(Self::Json),
            "jsonl" | "ndjson" => Some(Self::Jsonl),
            _ => None,
        }
    }
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Protobuf => write!(f, "protobuf"),
            Self::Json => write!(f, "json"),
            Self::Jsonl => write!(f, "jsonl"),
        }
    }
}

impl std::str::FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "protobuf" | "proto" | "pb" => Ok(Self::Protobuf),
            "json" => Ok(Self::Json),
            "jsonl" | "ndjson" => Ok(Self::Jsonl),
            other => Err(format!(
                "unsupported input format: {other}. Supported: protobuf, json, jsonl"
            )),
        }
    }
}

/// Decode raw payload bytes into a trace batch.
pub fn parse_trace_batch(bytes: &[u8], format: InputFormat) -> Result<TraceBatch, DecodeError> {
    match format {
        InputFormat::Protobuf => Ok(TraceBatch::decode(bytes)?),
        InputFormat::Json => parse_json(serde_json::from_slice(bytes)?),
        InputFormat::Jsonl => parse_jsonl(bytes),
    }
}

fn parse_json(mut value: JsonValue) -> Result<TraceBatch, DecodeError> {
    normalize_json_value(&mut value, None)?;
    Ok(serde_json::from_value(value)?)
}

fn parse_jsonl(bytes: &[u8]) -> Result<TraceBatch, DecodeError> {
    let text = str::from_utf8(bytes)?;

    let mut merged = TraceBatch::default();
    for (line_num, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut request = serde_json::from_str(trimmed)
            .map_err(DecodeError::from)
            .and_then(parse_json)
            .map_err(|source| DecodeError::JsonLine {
                line: line_num + 1,
                source: Box::new(source),
            })?;
        merged.resource_spans.append(&mut request.resource_spans);
    }

    if merged.resource_spans.is_empty() {
        return Err(DecodeError::EmptyJsonl);
    }

    Ok(merged)
}
