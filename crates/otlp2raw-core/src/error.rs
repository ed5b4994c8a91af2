//! Error taxonomy for trace normalization.
//!
//! Every error here is contained by the batch normalizer: resource errors drop one
//! resource group, span errors drop one span. Only [`DecodeError`] surfaces to callers,
//! because an undecodable payload never becomes a batch at all.

use thiserror::Error;

/// An attribute value that cannot be mapped onto a plain output value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttributeError {
    #[error("attribute key is empty")]
    EmptyKey,

    #[error("attribute `{key}` holds a non-finite double ({value})")]
    NonFiniteDouble { key: String, value: f64 },

    #[error("attribute `{key}` nests deeper than {limit} levels")]
    NestingTooDeep { key: String, limit: usize },
}

/// A nanosecond timestamp outside the range the output representation can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("timestamp {nanos}ns is outside the representable range")]
pub struct TimeConversionOverflow {
    pub nanos: u64,
}

/// Why a single span could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpanError {
    #[error("trace id must be {expected} bytes, got {actual}")]
    InvalidTraceId { expected: usize, actual: usize },

    #[error("span id must be {expected} bytes, got {actual}")]
    InvalidSpanId { expected: usize, actual: usize },

    #[error("parent span id must be empty or {expected} bytes, got {actual}")]
    InvalidParentSpanId { expected: usize, actual: usize },

    #[error("unrecognized span kind {0}")]
    UnknownKind(i32),

    #[error("invalid span attribute: {0}")]
    Attribute(#[from] AttributeError),

    #[error("invalid instrumentation scope attribute: {0}")]
    ScopeAttribute(AttributeError),

    #[error(transparent)]
    TimeConversionOverflow(#[from] TimeConversionOverflow),
}

/// Why a resource descriptor could not be decoded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResourceError {
    #[error("invalid resource attribute: {0}")]
    Attribute(#[from] AttributeError),
}

/// A failure contained by the batch normalizer, with enough identity for logging.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProcessingError {
    #[error("malformed resource at index {index}: {source}")]
    MalformedResource {
        /// Position of the resource group within the batch
        index: usize,
        /// Service name, when it could be read before decoding failed
        service_name: Option<String>,
        source: ResourceError,
    },

    #[error("malformed span `{name}` (trace {trace_id}, span {span_id}): {source}")]
    MalformedSpan {
        /// Hex-encoded trace id as received, possibly empty
        trace_id: String,
        /// Hex-encoded span id as received, possibly empty
        span_id: String,
        name: String,
        source: SpanError,
    },
}

impl ProcessingError {
    /// Counter incremented (alongside the total) when this error is contained.
    pub fn counter(&self) -> &'static str {
        use crate::field_names::counters;

        match self {
            Self::MalformedResource { .. } => counters::RESOURCE_SPANS_PROCESSING_ERRORS,
            Self::MalformedSpan { .. } => counters::SPAN_PROCESSING_ERRORS,
        }
    }
}

/// Raw payload bytes that could not be decoded into a trace batch.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to decode OTLP protobuf message: {0}")]
    Protobuf(#[from] prost::DecodeError),

    #[error("failed to parse OTLP JSON message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid {field} `{value}`: expected hex or base64")]
    InvalidId { field: String, value: String },

    #[error("failed to parse JSONL line {line}: {source}")]
    JsonLine {
        line: usize,
        source: Box<DecodeError>,
    },

    #[error("JSONL input is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("JSONL input contained no valid trace records")]
    EmptyJsonl,
}
