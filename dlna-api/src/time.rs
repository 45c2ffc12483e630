//! `H+:MM:SS` time strings used by AVTransport

use std::time::Duration;

/// Format a position for `Seek` with `Unit="REL_TIME"`
///
/// Hours are not zero padded, sub-second precision is dropped.
pub fn format_position(position: Duration) -> String {
    let total = position.as_secs();
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

/// Parse a `RelTime` / `TrackDuration` value
///
/// Returns `None` for `NOT_IMPLEMENTED`, empty strings and anything else
/// that is not `H+:MM:SS[.F+]`, including hour counts too large to hold.
pub fn parse_position(value: &str) -> Option<Duration> {
    let value = value.trim();
    let mut parts = value.split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds_part = parts.next()?;
    if parts.next().is_some() || minutes >= 60 {
        return None;
    }

    let (whole, fraction) = match seconds_part.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (seconds_part, None),
    };
    let seconds: u64 = whole.parse().ok()?;
    if seconds >= 60 {
        return None;
    }

    let total = hours
        .checked_mul(3600)?
        .checked_add(minutes * 60 + seconds)?;
    let mut duration = Duration::from_secs(total);
    if let Some(fraction) = fraction.filter(|f| !f.is_empty()) {
        let millis: String = fraction.chars().chain("000".chars()).take(3).collect();
        duration += Duration::from_millis(millis.parse().ok()?);
    }
    Some(duration)
}
