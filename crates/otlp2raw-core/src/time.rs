//! Conversion of OTLP nanosecond timestamps into record time fields.

use crate::error::TimeConversionOverflow;

pub const NANOS_PER_MILLI: u64 = 1_000_000;

/// Start/end of a span at millisecond precision, with the exact duration retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanTimes {
    pub start_millis: i64,
    pub end_millis: i64,
    /// `end - start` in nanoseconds; negative when the span ends before it starts.
    pub duration_nanos: i64,
}

/// Convert a start/end pair of nanoseconds since the Unix epoch.
///
/// Milliseconds are truncated (floor), so converting an already millisecond-aligned
/// value is lossless. Values beyond `i64::MAX` nanoseconds are rejected.
pub fn normalize(start_nanos: u64, end_nanos: u64) -> Result<SpanTimes, TimeConversionOverflow> {
    let start = to_signed(start_nanos)?;
    let end = to_signed(end_nanos)?;

    Ok(SpanTimes {
        start_millis: start / NANOS_PER_MILLI as i64,
        end_millis: end / NANOS_PER_MILLI as i64,
        // Both operands are non-negative i64 values, so the difference cannot overflow.
        duration_nanos: end - start,
    })
}

/// Convert one nanosecond timestamp to whole milliseconds since the epoch.
pub fn nanos_to_millis(nanos: u64) -> Result<i64, TimeConversionOverflow> {
    Ok(to_signed(nanos)? / NANOS_PER_MILLI as i64)
}

fn to_signed(nanos: u64) -> Result<i64, TimeConversionOverflow> {
    i64::try_from(nanos).map_err(|_| TimeConversionOverflow { nanos })
}
