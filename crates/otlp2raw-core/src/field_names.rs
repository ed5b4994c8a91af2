//! Field name constants for flat span records.
//!
//! Downstream consumers (index writers, queues, file sinks) key off these names, so they
//! are part of the output contract. Record fields use camelCase; OpenTelemetry semantic
//! convention keys keep their dotted form.

/// Top-level fields of a serialized [`FlatSpanRecord`](crate::FlatSpanRecord).
pub mod record {
    // Span identity
    /// Trace identifier, lowercase hex (32 chars)
    pub const TRACE_ID: &str = "traceId";
    /// Span identifier, lowercase hex (16 chars)
    pub const SPAN_ID: &str = "spanId";
    /// Parent span identifier; omitted for root spans
    pub const PARENT_SPAN_ID: &str = "parentSpanId";
    /// W3C trace state; omitted when empty
    pub const TRACE_STATE: &str = "traceState";
    pub const NAME: &str = "name";
    pub const KIND: &str = "kind";

    // Time fields
    /// Span start, milliseconds since the Unix epoch
    pub const START_TIME: &str = "startTime";
    /// Span end, milliseconds since the Unix epoch
    pub const END_TIME: &str = "endTime";
    /// Exact span duration in nanoseconds
    pub const DURATION_IN_NANOS: &str = "durationInNanos";

    /// Service identity taken from the resource
    pub const SERVICE_NAME: &str = "serviceName";

    // Nested containers
    /// Merged resource, scope and span attributes
    pub const ATTRIBUTES: &str = "attributes";
    /// Instrumentation scope name and version
    pub const INSTRUMENTATION_SCOPE: &str = "instrumentationScope";

    pub const STATUS: &str = "status";
    pub const EVENTS: &str = "events";
    pub const LINKS: &str = "links";
    pub const DROPPED_ATTRIBUTES_COUNT: &str = "droppedAttributesCount";
    pub const DROPPED_EVENTS_COUNT: &str = "droppedEventsCount";
    pub const DROPPED_LINKS_COUNT: &str = "droppedLinksCount";
}

/// OTLP/JSON keys rewritten before decoding.
pub mod otlp {
    pub const TRACE_ID: &str = "traceId";
    pub const SPAN_ID: &str = "spanId";
    pub const PARENT_SPAN_ID: &str = "parentSpanId";
    pub const KIND: &str = "kind";
    /// Status code, inside `status`
    pub const CODE: &str = "code";
    pub const START_TIME_UNIX_NANO: &str = "startTimeUnixNano";
    pub const END_TIME_UNIX_NANO: &str = "endTimeUnixNano";
    /// Event timestamp
    pub const TIME_UNIX_NANO: &str = "timeUnixNano";
}

/// OpenTelemetry semantic conventions used during extraction.
///
/// Reference: https://opentelemetry.io/docs/specs/semconv/resource/
pub mod semconv {
    /// Logical name of the service (e.g., "checkout-service")
    pub const SERVICE_NAME: &str = "service.name";
}

/// Counter names exposed through [`MetricsSink`](crate::MetricsSink).
pub mod counters {
    /// Spans dropped because they could not be built into a record
    pub const SPAN_PROCESSING_ERRORS: &str = "spanProcessingErrors";
    /// Resource groups dropped because their resource could not be decoded
    pub const RESOURCE_SPANS_PROCESSING_ERRORS: &str = "resourceSpansProcessingErrors";
    /// Sum of the two counters above
    pub const TOTAL_PROCESSING_ERRORS: &str = "totalProcessingErrors";
}
