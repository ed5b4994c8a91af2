// Flat span records
//
// One record per OTLP span, carrying copies of the resource and scope context it was
// emitted under. Records own all of their data and serialize to one JSON object each;
// field names are listed in `field_names::record`.

use opentelemetry_proto::tonic::{
    common::v1::InstrumentationScope,
    trace::v1::{span, status, Span, Status},
};
use serde::{Deserialize, Serialize};

use crate::attributes::{decode_attributes, decode_attributes_into, Attributes};
use crate::error::{AttributeError, SpanError};
use crate::time;

/// Size of OpenTelemetry TraceId in bytes (128 bits)
pub const TRACE_ID_SIZE: usize = 16;

/// Size of OpenTelemetry SpanId in bytes (64 bits)
pub const SPAN_ID_SIZE: usize = 8;

/// A denormalized span: identity, timing, and merged resource/scope/span context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatSpanRecord {
    pub trace_id: String,
    pub span_id: String,
    /// `None` for root spans.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_state: Option<String>,
    pub name: String,
    pub kind: String,
    pub start_time: i64,
    pub end_time: i64,
    pub duration_in_nanos: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    pub attributes: Attributes,
    pub instrumentation_scope: ScopeInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SpanStatus>,
    #[serde(default)]
    pub events: Vec<SpanEvent>,
    #[serde(default)]
    pub links: Vec<SpanLink>,
    #[serde(default)]
    pub dropped_attributes_count: u32,
    #[serde(default)]
    pub dropped_events_count: u32,
    #[serde(default)]
    pub dropped_links_count: u32,
}

/// Instrumentation scope as it appears inside a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanStatus {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanEvent {
    /// Milliseconds since the Unix epoch
    pub time: i64,
    pub name: String,
    pub attributes: Attributes,
    #[serde(default)]
    pub dropped_attributes_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanLink {
    pub trace_id: String,
    pub span_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_state: Option<String>,
    pub attributes: Attributes,
    #[serde(default)]
    pub dropped_attributes_count: u32,
}

/// Instrumentation scope metadata, decoded once per scope group and shared by its spans.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeMetadata {
    pub info: ScopeInfo,
    pub attributes: Attributes,
}

impl ScopeMetadata {
    pub fn from_scope(
        scope: Option<&InstrumentationScope>,
        max_depth: usize,
    ) -> Result<Self, AttributeError> {
        let Some(scope) = scope else {
            return Ok(Self::default());
        };

        Ok(Self {
            info: ScopeInfo {
                name: non_empty(&scope.name),
                version: non_empty(&scope.version),
            },
            attributes: decode_attributes(&scope.attributes, max_depth)?,
        })
    }
}

/// Builds [`FlatSpanRecord`]s from a span and its enclosing context.
#[derive(Debug, Clone, Copy)]
pub struct SpanRecordBuilder {
    max_attribute_depth: usize,
}

impl SpanRecordBuilder {
    pub fn new(max_attribute_depth: usize) -> Self {
        Self {
            max_attribute_depth,
        }
    }

    /// Build one record.
    ///
    /// Attributes are merged resource first, then scope, then span, so the most specific
    /// level wins on key collisions.
    pub fn build(
        &self,
        span: &Span,
        scope: &ScopeMetadata,
        service_name: Option<&str>,
        resource_attributes: &Attributes,
    ) -> Result<FlatSpanRecord, SpanError> {
        check_id_len(&span.trace_id, TRACE_ID_SIZE).map_err(|actual| {
            SpanError::InvalidTraceId {
                expected: TRACE_ID_SIZE,
                actual,
            }
        })?;
        check_id_len(&span.span_id, SPAN_ID_SIZE).map_err(|actual| SpanError::InvalidSpanId {
            expected: SPAN_ID_SIZE,
            actual,
        })?;

        let parent_span_id = if span.parent_span_id.is_empty() {
            None
        } else {
            check_id_len(&span.parent_span_id, SPAN_ID_SIZE).map_err(|actual| {
                SpanError::InvalidParentSpanId {
                    expected: SPAN_ID_SIZE,
                    actual,
                }
            })?;
            Some(hex::encode(&span.parent_span_id))
        };

        let kind =
            span::SpanKind::try_from(span.kind).map_err(|_| SpanError::UnknownKind(span.kind))?;
        let times = time::normalize(span.start_time_unix_nano, span.end_time_unix_nano)?;

        let mut attributes = resource_attributes.clone();
        attributes.extend(
            scope
                .attributes
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        decode_attributes_into(&mut attributes, &span.attributes, self.max_attribute_depth)?;

        let events = span
            .events
            .iter()
            .map(|event| self.build_event(event))
            .collect::<Result<Vec<_>, _>>()?;
        let links = span
            .links
            .iter()
            .map(|link| self.build_link(link))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FlatSpanRecord {
            trace_id: hex::encode(&span.trace_id),
            span_id: hex::encode(&span.span_id),
            parent_span_id,
            trace_state: non_empty(&span.trace_state),
            name: span.name.clone(),
            kind: kind.as_str_name().to_owned(),
            start_time: times.start_millis,
            end_time: times.end_millis,
            duration_in_nanos: times.duration_nanos,
            service_name: service_name.map(str::to_owned),
            attributes,
            instrumentation_scope: scope.info.clone(),
            status: span.status.as_ref().map(convert_status),
            events,
            links,
            dropped_attributes_count: span.dropped_attributes_count,
            dropped_events_count: span.dropped_events_count,
            dropped_links_count: span.dropped_links_count,
        })
    }

    fn build_event(&self, event: &span::Event) -> Result<SpanEvent, SpanError> {
        Ok(SpanEvent {
            time: time::nanos_to_millis(event.time_unix_nano)?,
            name: event.name.clone(),
            attributes: decode_attributes(&event.attributes, self.max_attribute_depth)?,
            dropped_attributes_count: event.dropped_attributes_count,
        })
    }

    fn build_link(&self, link: &span::Link) -> Result<SpanLink, SpanError> {
        Ok(SpanLink {
            trace_id: hex::encode(&link.trace_id),
            span_id: hex::encode(&link.span_id),
            trace_state: non_empty(&link.trace_state),
            attributes: decode_attributes(&link.attributes, self.max_attribute_depth)?,
            dropped_attributes_count: link.dropped_attributes_count,
        })
    }
}

fn convert_status(status: &Status) -> SpanStatus {
    let code = status::StatusCode::try_from(status.code)
        .unwrap_or(status::StatusCode::Unset)
        .as_str_name();

    SpanStatus {
        code: code.to_owned(),
        message: non_empty(&status.message),
    }
}

fn check_id_len(id: &[u8], expected: usize) -> Result<(), usize> {
    if id.len() == expected {
        Ok(())
    } else {
        Err(id.len())
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}
