// Batch normalization
//
// Walks resource -> scope -> span, building one flat record per span. Failures are
// contained at two levels: a resource that cannot be decoded drops its whole group, a
// span that cannot be built drops only itself. Both are counted and logged, and the
// walk always continues.

use opentelemetry_proto::tonic::trace::v1::{ResourceSpans, ScopeSpans, Span};
use tracing::{debug, warn};

use crate::attributes::{self, Attributes, DEFAULT_MAX_ATTRIBUTE_DEPTH};
use crate::error::{ProcessingError, ResourceError, SpanError};
use crate::field_names::counters;
use crate::format::TraceBatch;
use crate::metrics::MetricsSink;
use crate::record::{FlatSpanRecord, ScopeMetadata, SpanRecordBuilder};

/// Tunables for the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizerOptions {
    /// Deepest array/kvlist nesting accepted in any attribute value.
    pub max_attribute_depth: usize,
}

impl Default for NormalizerOptions {
    fn default() -> Self {
        Self {
            max_attribute_depth: DEFAULT_MAX_ATTRIBUTE_DEPTH,
        }
    }
}

/// Records produced from one batch, plus the failures that were contained along the way.
#[derive(Debug, Default)]
pub struct Normalized {
    pub records: Vec<FlatSpanRecord>,
    pub errors: Vec<ProcessingError>,
}

/// Converts trace batches into flat span records.
///
/// Holds no per-batch state, so one instance can normalize disjoint batches from
/// several threads at once as long as the metrics sink is shareable.
#[derive(Debug)]
pub struct TraceNormalizer<M> {
    metrics: M,
    builder: SpanRecordBuilder,
    options: NormalizerOptions,
}

struct ResourceContext {
    service_name: Option<String>,
    attributes: Attributes,
}

impl<M: MetricsSink> TraceNormalizer<M> {
    pub fn new(metrics: M) -> Self {
        Self::with_options(metrics, NormalizerOptions::default())
    }

    pub fn with_options(metrics: M, options: NormalizerOptions) -> Self {
        Self {
            metrics,
            builder: SpanRecordBuilder::new(options.max_attribute_depth),
            options,
        }
    }

    pub fn options(&self) -> NormalizerOptions {
        self.options
    }

    pub fn metrics(&self) -> &M {
        &self.metrics
    }

    /// Normalize a batch, returning records in traversal order.
    pub fn normalize(&self, batch: &TraceBatch) -> Vec<FlatSpanRecord> {
        self.normalize_with_report(batch).records
    }

    /// Normalize a batch and also return every contained failure.
    pub fn normalize_with_report(&self, batch: &TraceBatch) -> Normalized {
        let mut out = Normalized {
            records: Vec::with_capacity(estimate_span_count(batch)),
            errors: Vec::new(),
        };

        for (index, resource_spans) in batch.resource_spans.iter().enumerate() {
            self.process_resource_spans(index, resource_spans, &mut out);
        }

        debug!(
            resource_groups = batch.resource_spans.len(),
            records = out.records.len(),
            errors = out.errors.len(),
            "normalized trace batch"
        );

        out
    }

    fn process_resource_spans(
        &self,
        index: usize,
        resource_spans: &ResourceSpans,
        out: &mut Normalized,
    ) {
        let resource_ctx = match self.build_resource_context(resource_spans) {
            Ok(ctx) => ctx,
            Err(source) => {
                // Best effort identity for the log line; the name lookup may itself fail.
                let service_name = attributes::extract_service_name(
                    resource_spans.resource.as_ref(),
                    self.options.max_attribute_depth,
                )
                .ok()
                .flatten();
                self.contain(
                    ProcessingError::MalformedResource {
                        index,
                        service_name,
                        source,
                    },
                    out,
                );
                return;
            }
        };

        for scope_spans in &resource_spans.scope_spans {
            self.process_scope_spans(scope_spans, &resource_ctx, out);
        }
    }

    fn build_resource_context(
        &self,
        resource_spans: &ResourceSpans,
    ) -> Result<ResourceContext, ResourceError> {
        let resource = resource_spans.resource.as_ref();
        let depth = self.options.max_attribute_depth;

        Ok(ResourceContext {
            service_name: attributes::extract_service_name(resource, depth)?,
            attributes: attributes::extract_attributes(resource, depth)?,
        })
    }

    fn process_scope_spans(
        &self,
        scope_spans: &ScopeSpans,
        resource_ctx: &ResourceContext,
        out: &mut Normalized,
    ) {
        let scope = ScopeMetadata::from_scope(
            scope_spans.scope.as_ref(),
            self.options.max_attribute_depth,
        )
        .map_err(SpanError::ScopeAttribute);

        for span in &scope_spans.spans {
            let built = scope.as_ref().map_err(SpanError::clone).and_then(|scope| {
                self.builder.build(
                    span,
                    scope,
                    resource_ctx.service_name.as_deref(),
                    &resource_ctx.attributes,
                )
            });

            match built {
                Ok(record) => out.records.push(record),
                Err(source) => self.contain(malformed_span(span, source), out),
            }
        }
    }

    fn contain(&self, error: ProcessingError, out: &mut Normalized) {
        match &error {
            ProcessingError::MalformedResource {
                index,
                service_name,
                source,
            } => warn!(
                resource_index = *index,
                service_name = service_name.as_deref().unwrap_or_default(),
                error = %source,
                "Unable to process invalid resource spans"
            ),
            ProcessingError::MalformedSpan {
                trace_id,
                span_id,
                name,
                source,
            } => warn!(
                trace_id = %trace_id,
                span_id = %span_id,
                span_name = %name,
                error = %source,
                "Unable to process invalid span"
            ),
        }

        self.metrics.increment(error.counter());
        self.metrics.increment(counters::TOTAL_PROCESSING_ERRORS);
        out.errors.push(error);
    }
}

fn malformed_span(span: &Span, source: SpanError) -> ProcessingError {
    ProcessingError::MalformedSpan {
        trace_id: hex::encode(&span.trace_id),
        span_id: hex::encode(&span.span_id),
        name: span.name.clone(),
        source,
    }
}

fn estimate_span_count(batch: &TraceBatch) -> usize {
    batch
        .resource_spans
        .iter()
        .map(|resource_spans| {
            resource_spans
                .scope_spans
                .iter()
                .map(|scope_spans| scope_spans.spans.len())
                .sum::<usize>()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_names::semconv;
    use crate::metrics::ProcessingCounters;
    use opentelemetry_proto::tonic::{
        common::v1::{any_value, AnyValue, InstrumentationScope, KeyValue},
        resource::v1::Resource,
        trace::v1::span,
    };

    fn kv(key: &str, value: any_value::Value) -> KeyValue {
        KeyValue {
            key: key.into(),
            value: Some(AnyValue { value: Some(value) }),
        }
    }

    fn span_named(name: &str, id: u8) -> Span {
        Span {
            trace_id: vec![0xaa; 16],
            span_id: vec![id; 8],
            name: name.into(),
            kind: span::SpanKind::Internal as i32,
            start_time_unix_nano: 1_000_000,
            end_time_unix_nano: 3_000_000,
            ..Default::default()
        }
    }

    fn resource_spans(service: &str, scopes: Vec<ScopeSpans>) -> ResourceSpans {
        ResourceSpans {
            resource: Some(Resource {
                attributes: vec![kv(
                    semconv::SERVICE_NAME,
                    any_value::Value::StringValue(service.into()),
                )],
                ..Default::default()
            }),
            scope_spans: scopes,
            ..Default::default()
        }
    }

    fn scope_spans(spans: Vec<Span>) -> ScopeSpans {
        ScopeSpans {
            scope: Some(InstrumentationScope {
                name: "test-lib".into(),
                ..Default::default()
            }),
            spans,
            ..Default::default()
        }
    }

    #[test]
    fn empty_batch_yields_no_records() {
        let counters = ProcessingCounters::new();
        let normalizer = TraceNormalizer::new(&counters);

        let records = normalizer.normalize(&TraceBatch::default());

        assert!(records.is_empty());
        assert_eq!(counters.total_errors(), 0);
    }

    #[test]
    fn missing_resource_and_scope_are_tolerated() {
        let batch = TraceBatch {
            resource_spans: vec![ResourceSpans {
                resource: None,
                scope_spans: vec![ScopeSpans {
                    scope: None,
                    spans: vec![span_named("orphan", 1)],
                    ..Default::default()
                }],
                ..Default::default()
            }],
        };

        let normalizer = TraceNormalizer::new(ProcessingCounters::new());
        let records = normalizer.normalize(&batch);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].service_name, None);
        assert!(records[0].attributes.is_empty());
        assert_eq!(records[0].instrumentation_scope.name, None);
        assert_eq!(normalizer.metrics().total_errors(), 0);
    }

    #[test]
    fn resource_context_is_copied_into_every_span() {
        let mut group = resource_spans(
            "checkout",
            vec![scope_spans(vec![span_named("a", 1), span_named("b", 2)])],
        );
        if let Some(resource) = group.resource.as_mut() {
            resource
                .attributes
                .push(kv("host.name", any_value::Value::StringValue("web-1".into())));
        }

        let batch = TraceBatch {
            resource_spans: vec![group],
        };
        let records = TraceNormalizer::new(ProcessingCounters::new()).normalize(&batch);

        assert_eq!(records.len(), 2);
        for record in &records {
            assert_eq!(record.service_name.as_deref(), Some("checkout"));
            assert_eq!(record.attributes["host.name"], "web-1");
            assert_eq!(record.attributes[semconv::SERVICE_NAME], "checkout");
            assert_eq!(record.instrumentation_scope.name.as_deref(), Some("test-lib"));
        }
    }

    #[test]
    fn bad_scope_attribute_fails_each_span_in_scope_only() {
        let mut bad_scope = scope_spans(vec![span_named("x", 1), span_named("y", 2)]);
        if let Some(scope) = bad_scope.scope.as_mut() {
            scope
                .attributes
                .push(kv("weight", any_value::Value::DoubleValue(f64::NAN)));
        }
        let good_scope = scope_spans(vec![span_named("z", 3)]);

        let batch = TraceBatch {
            resource_spans: vec![resource_spans("svc", vec![bad_scope, good_scope])],
        };
        let counters = ProcessingCounters::new();
        let normalized = TraceNormalizer::new(&counters).normalize_with_report(&batch);

        assert_eq!(normalized.records.len(), 1);
        assert_eq!(normalized.records[0].name, "z");
        assert_eq!(normalized.errors.len(), 2);
        assert!(matches!(
            normalized.errors[0],
            ProcessingError::MalformedSpan {
                source: SpanError::ScopeAttribute(_),
                ..
            }
        ));
        assert_eq!(counters.span_errors(), 2);
        assert_eq!(counters.resource_errors(), 0);
        assert_eq!(counters.total_errors(), 2);
    }

    #[test]
    fn reports_span_identity_for_failures() {
        let mut broken = span_named("broken", 7);
        broken.kind = 99;

        let batch = TraceBatch {
            resource_spans: vec![resource_spans("svc", vec![scope_spans(vec![broken])])],
        };
        let normalized =
            TraceNormalizer::new(ProcessingCounters::new()).normalize_with_report(&batch);

        assert!(normalized.records.is_empty());
        match &normalized.errors[0] {
            ProcessingError::MalformedSpan {
                trace_id,
                span_id,
                name,
                source,
            } => {
                assert_eq!(trace_id, &hex::encode([0xaa; 16]));
                assert_eq!(span_id, "0707070707070707");
                assert_eq!(name, "broken");
                assert_eq!(source, &SpanError::UnknownKind(99));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn respects_configured_attribute_depth() {
        let mut span = span_named("nested", 1);
        span.attributes = vec![kv(
            "list",
            any_value::Value::ArrayValue(opentelemetry_proto::tonic::common::v1::ArrayValue {
                values: vec![AnyValue {
                    value: Some(any_value::Value::IntValue(1)),
                }],
            }),
        )];
        let batch = TraceBatch {
            resource_spans: vec![resource_spans("svc", vec![scope_spans(vec![span])])],
        };

        let shallow = TraceNormalizer::with_options(
            ProcessingCounters::new(),
            NormalizerOptions {
                max_attribute_depth: 1,
            },
        );
        assert!(shallow.normalize(&batch).is_empty());
        assert_eq!(shallow.metrics().span_errors(), 1);

        let deep = TraceNormalizer::new(ProcessingCounters::new());
        assert_eq!(deep.normalize(&batch).len(), 1);
    }
}
