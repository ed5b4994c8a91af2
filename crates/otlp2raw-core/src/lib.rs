// otlp2raw-core - Platform-agnostic trace normalization
//
// Pure processing logic for turning OTLP trace export requests into flat,
// self-contained span records. No I/O, no async, no runtime dependencies:
// the transport that delivers batches and the sink that stores records live
// elsewhere.

pub mod attributes;
pub mod error;
pub mod field_names;
pub mod format;
mod json_normalizer;
pub mod metrics;
pub mod normalizer;
pub mod record;
pub mod time;

// Re-export commonly used types
pub use attributes::{extract_attributes, extract_service_name, Attributes};
pub use error::{
    AttributeError, DecodeError, ProcessingError, ResourceError, SpanError,
    TimeConversionOverflow,
};
pub use format::{parse_trace_batch, InputFormat, TraceBatch};
pub use metrics::{MetricsFacade, MetricsSink, NoopMetrics, ProcessingCounters};
pub use normalizer::{Normalized, NormalizerOptions, TraceNormalizer};
pub use record::{FlatSpanRecord, ScopeMetadata, SpanRecordBuilder};
pub use time::SpanTimes;
