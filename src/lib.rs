// otlp2raw - read one OTLP trace payload, write one JSON line per span
//
// The binary in main.rs resolves configuration; everything after that lives here so
// integration tests can drive a full run without spawning a process.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};

use anyhow::{Context, Result};
use otlp2raw_config::{InputConfig, OutputConfig, RuntimeConfig};
use otlp2raw_core::{
    parse_trace_batch, FlatSpanRecord, MetricsFacade, ProcessingCounters, TraceNormalizer,
};
use tracing::{debug, info};

pub mod init;

/// Outcome of one run, reported once the output is flushed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub records: usize,
    pub span_errors: u64,
    pub resource_errors: u64,
    pub total_errors: u64,
}

/// Read, decode, normalize and write one payload.
///
/// Only configuration, I/O and decode failures are returned as errors; malformed
/// spans and resources are dropped and show up in the summary counters.
pub fn run(config: &RuntimeConfig) -> Result<RunSummary> {
    let payload = read_input(&config.input)?;
    let format = config.input.resolved_format();
    debug!(bytes = payload.len(), %format, "read trace payload");

    let batch = parse_trace_batch(&payload, format)
        .with_context(|| format!("Failed to decode {} trace payload", format))?;

    let counters = ProcessingCounters::new();
    let normalizer =
        TraceNormalizer::with_options((&counters, MetricsFacade), config.normalizer.options());
    let records = normalizer.normalize(&batch);

    write_output(&config.output, &records)?;

    let summary = RunSummary {
        records: records.len(),
        span_errors: counters.span_errors(),
        resource_errors: counters.resource_errors(),
        total_errors: counters.total_errors(),
    };
    info!(
        records = summary.records,
        span_processing_errors = summary.span_errors,
        resource_spans_processing_errors = summary.resource_errors,
        total_processing_errors = summary.total_errors,
        "normalized trace payload"
    );

    Ok(summary)
}

fn read_input(input: &InputConfig) -> Result<Vec<u8>> {
    let mut payload = Vec::new();
    match input.path.as_deref() {
        Some(path) if !input.reads_stdin() => {
            File::open(path)
                .and_then(|mut file| file.read_to_end(&mut payload))
                .with_context(|| format!("Failed to read input file: {}", path))?;
        }
        _ => {
            io::stdin()
                .lock()
                .read_to_end(&mut payload)
                .context("Failed to read payload from stdin")?;
        }
    }
    Ok(payload)
}

fn write_output(output: &OutputConfig, records: &[FlatSpanRecord]) -> Result<()> {
    match output.path.as_deref() {
        Some(path) if !output.writes_stdout() => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            write_records(BufWriter::new(file), records)
                .with_context(|| format!("Failed to write records to {}", path))
        }
        _ => write_records(BufWriter::new(io::stdout().lock()), records)
            .context("Failed to write records to stdout"),
    }
}

/// Write each record as one JSON line and flush.
pub fn write_records<W: Write>(mut writer: W, records: &[FlatSpanRecord]) -> Result<()> {
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
