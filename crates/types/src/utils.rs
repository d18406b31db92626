//! Utility functions and helpers

use crate::error::ConversionError;
use std::time::Duration;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;
const NANOS_PER_MINUTE: u128 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MINUTE;
const NANOS_PER_DAY: u128 = 24 * NANOS_PER_HOUR;

/// Time units from largest to smallest with the label used when formatting.
/// Every label is accepted by [`parse_duration`].
const TIME_UNITS: &[(u128, &str)] = &[
    (NANOS_PER_DAY, "d"),
    (NANOS_PER_HOUR, "h"),
    (NANOS_PER_MINUTE, "min"),
    (NANOS_PER_SECOND, "s"),
    (NANOS_PER_MILLI, "ms"),
    (NANOS_PER_MICRO, "us"),
    (1, "ns"),
];

/// Parse a duration literal such as `30 s`, `5min` or `1h 30m`.
///
/// A bare number is read as milliseconds. Units are matched ignoring case,
/// so `M` is a minute like `m`.
pub fn parse_duration(text: &str) -> Result<Duration, ConversionError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ConversionError::parse(text, "duration", "value is empty"));
    }

    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        return trimmed
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| ConversionError::overflow(trimmed, "duration"));
    }

    // units are case-insensitive; humantime only knows the lowercase forms
    humantime::parse_duration(&trimmed.to_lowercase())
        .map_err(|e| ConversionError::parse(text, "duration", e.to_string()))
}

/// Format a duration with the largest unit that represents it exactly,
/// e.g. `120 s` becomes `2 min` while `90 s` stays `90 s`.
///
/// Counts too large for the parser are split into seconds and nanoseconds.
pub fn format_with_highest_unit(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0 ms".to_string();
    }

    let (unit_nanos, label) = TIME_UNITS
        .iter()
        .find(|(unit_nanos, _)| nanos % unit_nanos == 0)
        .unwrap_or(&TIME_UNITS[TIME_UNITS.len() - 1]);
    let count = nanos / unit_nanos;
    if count > u128::from(u64::MAX) {
        return format!("{} s {} ns", duration.as_secs(), duration.subsec_nanos());
    }
    format!("{} {}", count, label)
}
