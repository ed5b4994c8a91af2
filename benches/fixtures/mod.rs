// Synthetic OTLP trace data generators for benchmarking
//
// Creates ExportTraceServiceRequest instances with a configurable span count, spread
// over resource groups the way a busy collector would batch them.

use opentelemetry_proto::tonic::{
    collector::trace::v1::ExportTraceServiceRequest,
    common::v1::{any_value, AnyValue, InstrumentationScope, KeyValue},
    resource::v1::Resource,
    trace::v1::{span, ResourceSpans, ScopeSpans, Span},
};
use prost::Message;

/// Workload size presets
#[derive(Debug, Clone, Copy)]
#[allow(dead_code)]
pub enum WorkloadSize {
    Small,  // 10k spans
    Medium, // 100k spans
}

impl WorkloadSize {
    pub fn span_count(&self) -> usize {
        match self {
            WorkloadSize::Small => 10_000,
            WorkloadSize::Medium => 100_000,
        }
    }
}

/// Generate a synthetic trace export request
pub fn generate_otlp_traces(size: WorkloadSize) -> ExportTraceServiceRequest {
    let span_count = size.span_count();
    let base_nanos: u64 = 1_705_327_800_000_000_000;

    let num_resources = (span_count / 1000).clamp(1, 100);
    let spans_per_resource = span_count / num_resources;

    let resource_spans = (0..num_resources)
        .map(|resource_idx| ResourceSpans {
            resource: Some(Resource {
                attributes: vec![
                    key_value("service.name", &format!("bench-service-{}", resource_idx % 10)),
                    key_value("host.name", &format!("host-{}", resource_idx % 20)),
                    key_value("deployment.environment", "benchmark"),
                ],
                ..Default::default()
            }),
            scope_spans: vec![ScopeSpans {
                scope: Some(InstrumentationScope {
                    name: "bench-tracer".to_string(),
                    version: "1.0.0".to_string(),
                    ..Default::default()
                }),
                spans: (0..spans_per_resource)
                    .map(|i| {
                        let start = base_nanos + (i as u64) * 1_000_000;
                        Span {
                            trace_id: ((resource_idx * spans_per_resource + i) as u128)
                                .to_be_bytes()
                                .to_vec(),
                            span_id: (i as u64 + 1).to_be_bytes().to_vec(),
                            parent_span_id: if i % 4 == 0 {
                                Vec::new()
                            } else {
                                (i as u64).to_be_bytes().to_vec()
                            },
                            name: format!("GET /api/items/{}", i % 50),
                            kind: span::SpanKind::Server as i32,
                            start_time_unix_nano: start,
                            end_time_unix_nano: start + 2_500_000,
                            attributes: vec![
                                key_value("http.method", "GET"),
                                key_value("http.route", "/api/items/:id"),
                            ],
                            ..Default::default()
                        }
                    })
                    .collect(),
                ..Default::default()
            }],
            ..Default::default()
        })
        .collect();

    ExportTraceServiceRequest { resource_spans }
}

pub fn to_protobuf(request: &ExportTraceServiceRequest) -> Vec<u8> {
    request.encode_to_vec()
}

fn key_value(key: &str, value: &str) -> KeyValue {
    KeyValue {
        key: key.to_string(),
        value: Some(AnyValue {
            value: Some(any_value::Value::StringValue(value.to_string())),
        }),
    }
}
