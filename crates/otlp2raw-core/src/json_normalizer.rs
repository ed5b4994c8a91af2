// OTLP/JSON normalization ahead of serde decoding
//
// Exporters emit span kinds and status codes either as numbers or as enum names, ids as
// hex or base64, and nanosecond timestamps as strings or numbers. The generated message
// types only accept numeric enums, hex ids and string timestamps, so payloads are
// rewritten into that shape first.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use serde_json::Value as JsonValue;

use crate::error::DecodeError;
use crate::field_names::otlp;

/// Enum value for names no known variant matches. Kinds then fail their span and status
/// codes render as unset, instead of failing the whole batch.
const UNRECOGNIZED_ENUM: i64 = -1;

/// Rewrite an OTLP/JSON trace request in place.
pub(crate) fn normalize_json_value(
    value: &mut JsonValue,
    key_hint: Option<&str>,
) -> Result<(), DecodeError> {
    match value {
        JsonValue::Object(map) => {
            for (key, val) in map.iter_mut() {
                normalize_json_value(val, Some(key.as_str()))?;
            }
            Ok(())
        }
        JsonValue::Array(values) => {
            for item in values.iter_mut() {
                normalize_json_value(item, key_hint)?;
            }
            Ok(())
        }
        JsonValue::String(current) => {
            if let Some(key) = key_hint {
                if let Some(converted) = convert_string_field(key, current)? {
                    *value = converted;
                }
            }
            Ok(())
        }
        JsonValue::Number(number) => {
            if let Some(key) = key_hint {
                if is_timestamp_field(key) {
                    *value = JsonValue::String(number.to_string());
                }
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn convert_string_field(key: &str, value: &str) -> Result<Option<JsonValue>, DecodeError> {
    if value.is_empty() {
        return Ok(None);
    }

    match key {
        otlp::TRACE_ID | otlp::SPAN_ID | otlp::PARENT_SPAN_ID => {
            Ok(hex_id(value, key)?.map(JsonValue::String))
        }
        otlp::KIND => Ok(Some(convert_enum_or_number(value, span_kind_from_str))),
        otlp::CODE => Ok(Some(convert_enum_or_number(value, status_code_from_str))),
        _ => Ok(None),
    }
}

fn is_timestamp_field(key: &str) -> bool {
    matches!(
        key,
        otlp::START_TIME_UNIX_NANO | otlp::END_TIME_UNIX_NANO | otlp::TIME_UNIX_NANO
    )
}

fn convert_enum_or_number(value: &str, map_enum: fn(&str) -> Option<i64>) -> JsonValue {
    let number = map_enum(value)
        .or_else(|| value.parse::<i64>().ok())
        .unwrap_or(UNRECOGNIZED_ENUM);
    JsonValue::Number(number.into())
}

/// Hex ids pass through; base64 ids are re-encoded as hex.
fn hex_id(value: &str, key: &str) -> Result<Option<String>, DecodeError> {
    if hex::decode(value).is_ok() {
        return Ok(None);
    }

    match BASE64_STANDARD.decode(value) {
        Ok(bytes) => Ok(Some(hex::encode(bytes))),
        Err(_) => Err(DecodeError::InvalidId {
            field: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn span_kind_from_str(value: &str) -> Option<i64> {
    match value {
        "SPAN_KIND_UNSPECIFIED" => Some(0),
        "SPAN_KIND_INTERNAL" => Some(1),
        "SPAN_KIND_SERVER" => Some(2),
        "SPAN_KIND_CLIENT" => Some(3),
        "SPAN_KIND_PRODUCER" => Some(4),
        "SPAN_KIND_CONSUMER" => Some(5),
        _ => None,
    }
}

fn status_code_from_str(value: &str) -> Option<i64> {
    match value {
        "STATUS_CODE_UNSET" => Some(0),
        "STATUS_CODE_OK" => Some(1),
        "STATUS_CODE_ERROR" => Some(2),
        _ => None,
    }
}
