// Attribute and resource extraction
//
// Maps OTLP AnyValue trees onto plain JSON values and pulls the service identity out of
// a resource descriptor.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use opentelemetry_proto::tonic::{
    common::v1::{any_value, AnyValue, KeyValue},
    resource::v1::Resource,
};
use serde_json::{Map as JsonMap, Number as JsonNumber, Value as JsonValue};

use crate::error::{AttributeError, ResourceError};
use crate::field_names::semconv;

/// Plain key to value mapping of decoded attributes, ordered by key.
pub type Attributes = BTreeMap<String, JsonValue>;

/// Default limit for nested array/kvlist values.
pub const DEFAULT_MAX_ATTRIBUTE_DEPTH: usize = 16;

/// Extract string value from an AnyValue, if it's a string variant
pub(crate) fn any_value_string(any_val: &AnyValue) -> Option<&str> {
    match any_val.value.as_ref()? {
        any_value::Value::StringValue(s) => Some(s.as_str()),
        _ => None,
    }
}

/// Look up the service identity of a resource.
///
/// Returns the first `service.name` attribute rendered as text. A missing resource, a
/// missing attribute or an unset value all yield `Ok(None)`; only a value that cannot be
/// rendered at all is an error.
pub fn extract_service_name(
    resource: Option<&Resource>,
    max_depth: usize,
) -> Result<Option<String>, ResourceError> {
    let Some(attr) = resource.and_then(|resource| {
        resource
            .attributes
            .iter()
            .find(|attr| attr.key == semconv::SERVICE_NAME)
    }) else {
        return Ok(None);
    };

    let Some(value) = attr.value.as_ref() else {
        return Ok(None);
    };

    if let Some(s) = any_value_string(value) {
        return Ok(Some(s.to_owned()));
    }

    let rendered = match any_value_to_json(&attr.key, value, max_depth)? {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s),
        other => Some(other.to_string()),
    };
    Ok(rendered)
}

/// Decode every attribute of a resource. A missing resource has no attributes.
pub fn extract_attributes(
    resource: Option<&Resource>,
    max_depth: usize,
) -> Result<Attributes, ResourceError> {
    match resource {
        Some(resource) => Ok(decode_attributes(&resource.attributes, max_depth)?),
        None => Ok(Attributes::new()),
    }
}

/// Decode a list of key/value pairs. Later duplicates of a key replace earlier ones.
pub fn decode_attributes(
    attributes: &[KeyValue],
    max_depth: usize,
) -> Result<Attributes, AttributeError> {
    let mut decoded = Attributes::new();
    decode_attributes_into(&mut decoded, attributes, max_depth)?;
    Ok(decoded)
}

/// Decode key/value pairs on top of an existing map, overriding colliding keys.
pub(crate) fn decode_attributes_into(
    target: &mut Attributes,
    attributes: &[KeyValue],
    max_depth: usize,
) -> Result<(), AttributeError> {
    for attr in attributes {
        if attr.key.is_empty() {
            return Err(AttributeError::EmptyKey);
        }

        let value = match attr.value.as_ref() {
            Some(value) => any_value_to_json(&attr.key, value, max_depth)?,
            None => JsonValue::Null,
        };
        target.insert(attr.key.clone(), value);
    }

    Ok(())
}

/// Convert an OTLP AnyValue to a JSON value, preserving its type.
///
/// Strings, integers, booleans and doubles map to the matching JSON scalar; arrays and
/// kvlists map to arrays and objects; bytes become a base64 string; an unset value
/// becomes `null`.
pub fn any_value_to_json(
    key: &str,
    any_val: &AnyValue,
    max_depth: usize,
) -> Result<JsonValue, AttributeError> {
    convert(key, any_val, 1, max_depth)
}

fn convert(
    key: &str,
    any_val: &AnyValue,
    depth: usize,
    max_depth: usize,
) -> Result<JsonValue, AttributeError> {
    if depth > max_depth {
        return Err(AttributeError::NestingTooDeep {
            key: key.to_owned(),
            limit: max_depth,
        });
    }

    let value = match any_val.value.as_ref() {
        Some(any_value::Value::StringValue(s)) => JsonValue::String(s.clone()),
        Some(any_value::Value::BoolValue(b)) => JsonValue::Bool(*b),
        Some(any_value::Value::IntValue(i)) => JsonValue::Number(JsonNumber::from(*i)),
        Some(any_value::Value::DoubleValue(d)) => JsonNumber::from_f64(*d)
            .map(JsonValue::Number)
            .ok_or_else(|| AttributeError::NonFiniteDouble {
                key: key.to_owned(),
                value: *d,
            })?,
        Some(any_value::Value::BytesValue(b)) => JsonValue::String(BASE64.encode(b)),
        Some(any_value::Value::ArrayValue(arr)) => JsonValue::Array(
            arr.values
                .iter()
                .map(|item| convert(key, item, depth + 1, max_depth))
                .collect::<Result<_, _>>()?,
        ),
        Some(any_value::Value::KvlistValue(kv)) => {
            let mut map = JsonMap::new();
            for entry in &kv.values {
                if entry.key.is_empty() {
                    return Err(AttributeError::EmptyKey);
                }
                let value = match entry.value.as_ref() {
                    Some(value) => convert(key, value, depth + 1, max_depth)?,
                    None => JsonValue::Null,
                };
                map.insert(entry.key.clone(), value);
            }
            JsonValue::Object(map)
        }
        None => JsonValue::Null,
    };

    Ok(value)
}
