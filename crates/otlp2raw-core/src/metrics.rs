//! Error counters.
//!
//! The normalizer reports contained failures through [`MetricsSink`] instead of global
//! state. [`ProcessingCounters`] keeps the counts in memory; [`MetricsFacade`] forwards
//! them to whatever recorder is installed for the `metrics` crate.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::field_names::counters;

/// Capability to increment a named monotonic counter.
pub trait MetricsSink: Send + Sync {
    fn increment(&self, counter: &'static str);
}

impl<T: MetricsSink + ?Sized> MetricsSink for &T {
    fn increment(&self, counter: &'static str) {
        (**self).increment(counter)
    }
}

impl<T: MetricsSink + ?Sized> MetricsSink for Arc<T> {
    fn increment(&self, counter: &'static str) {
        (**self).increment(counter)
    }
}

/// Fan out every increment to two sinks.
impl<A: MetricsSink, B: MetricsSink> MetricsSink for (A, B) {
    fn increment(&self, counter: &'static str) {
        self.0.increment(counter);
        self.1.increment(counter);
    }
}

/// In-memory error counters, safe to share between threads.
#[derive(Debug, Default)]
pub struct ProcessingCounters {
    span_errors: AtomicU64,
    resource_errors: AtomicU64,
    total_errors: AtomicU64,
}

impl ProcessingCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn span_errors(&self) -> u64 {
        self.span_errors.load(Ordering::Relaxed)
    }

    pub fn resource_errors(&self) -> u64 {
        self.resource_errors.load(Ordering::Relaxed)
    }

    pub fn total_errors(&self) -> u64 {
        self.total_errors.load(Ordering::Relaxed)
    }
}

impl MetricsSink for ProcessingCounters {
    fn increment(&self, counter: &'static str) {
        let slot = match counter {
            counters::SPAN_PROCESSING_ERRORS => &self.span_errors,
            counters::RESOURCE_SPANS_PROCESSING_ERRORS => &self.resource_errors,
            counters::TOTAL_PROCESSING_ERRORS => &self.total_errors,
            other => {
                tracing::debug!(counter = other, "ignoring unknown counter");
                return;
            }
        };
        slot.fetch_add(1, Ordering::Relaxed);
    }
}

/// Forwards increments to the global `metrics` recorder.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsFacade;

impl MetricsSink for MetricsFacade {
    fn increment(&self, counter: &'static str) {
        metrics::counter!(counter).increment(1);
    }
}

/// Discards every increment.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn increment(&self, _counter: &'static str) {}
}
