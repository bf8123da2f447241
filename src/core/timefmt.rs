// src/core/timefmt.rs

//! Parsing of the query service's duration strings (`"1.234ms"`, `"2m3.5s"`) and of
//! request timestamps, whose layout depends on the server's major version.

use chrono::{DateTime, Utc};

/// Returned by the duration helpers when a value cannot be parsed.
/// A malformed duration degrades a single field, never the whole record.
pub const INVALID_DURATION: i64 = -1;

const NANOS_PER_MICRO: i64 = 1_000;
const NANOS_PER_MILLI: i64 = 1_000_000;

/// chrono format for the legacy layout, minus the trailing zone abbreviation.
const LEGACY_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f %z";

/// Parses a duration string into whole milliseconds, truncating any remainder.
/// Returns [`INVALID_DURATION`] on failure.
pub fn parse_duration_millis(text: &str) -> i64 {
    parse_duration_nanos(text)
        .map(|nanos| nanos / NANOS_PER_MILLI)
        .unwrap_or(INVALID_DURATION)
}

/// Parses a duration string into whole microseconds.
/// Returns [`INVALID_DURATION`] on failure.
pub fn parse_duration_micros(text: &str) -> i64 {
    parse_duration_nanos(text)
        .map(|nanos| nanos / NANOS_PER_MICRO)
        .unwrap_or(INVALID_DURATION)
}

/// Parses a signed sequence of `<number>[.<fraction>]<unit>` groups into nanoseconds.
///
/// Accepted units are `ns`, `us`, `µs`, `μs`, `ms`, `s`, `m` and `h`. The bare
/// string `"0"` is the only unit-less value accepted.
pub fn parse_duration_nanos(text: &str) -> Option<i64> {
    let mut s = text;
    let negative = match s.as_bytes().first() {
        Some(b'-') => {
            s = &s[1..];
            true
        }
        Some(b'+') => {
            s = &s[1..];
            false
        }
        _ => false,
    };

    if s == "0" {
        return Some(0);
    }
    if s.is_empty() {
        return None;
    }

    let mut total: i128 = 0;
    while !s.is_empty() {
        let int_len = s.bytes().take_while(u8::is_ascii_digit).count();
        let (int_part, rest) = s.split_at(int_len);

        let (frac_part, rest) = match rest.strip_prefix('.') {
            Some(after_dot) => {
                let frac_len = after_dot.bytes().take_while(u8::is_ascii_digit).count();
                after_dot.split_at(frac_len)
            }
            None => ("", rest),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }

        let unit_len = rest
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (unit, rest) = rest.split_at(unit_len);
        let scale = unit_nanos(unit)?;

        let whole: i128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().ok()?
        };
        let mut value = whole.checked_mul(scale)?;

        if !frac_part.is_empty() {
            // Digits beyond nanosecond precision of an hour cannot change the result.
            let digits = &frac_part[..frac_part.len().min(18)];
            let fraction: i128 = digits.parse().ok()?;
            value += fraction * scale / 10i128.pow(digits.len() as u32);
        }

        total = total.checked_add(value)?;
        s = rest;
    }

    if negative {
        total = -total;
    }
    i64::try_from(total).ok()
}

fn unit_nanos(unit: &str) -> Option<i128> {
    let nanos = match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60 * 1_000_000_000,
        "h" => 3_600 * 1_000_000_000,
        _ => return None,
    };
    Some(nanos)
}

/// The timestamp layout used by a cluster's query service for `requestTime`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateLayout {
    /// `2018-05-10 17:35:21.123456789 +0000 UTC`, used by 5.x servers.
    Legacy,
    /// RFC 3339 with nanosecond precision, used by every other version.
    #[default]
    Rfc3339Nano,
}

impl DateLayout {
    /// Selects the layout from a discovered server version such as `5.5.0-4958-enterprise`.
    pub fn from_version(version: &str) -> Self {
        match version.split('.').next() {
            Some("5") => DateLayout::Legacy,
            _ => DateLayout::Rfc3339Nano,
        }
    }

    /// Parses `text` with this layout, normalizing the result to UTC.
    pub fn parse(&self, text: &str) -> Option<DateTime<Utc>> {
        let text = text.trim();
        let parsed = match self {
            DateLayout::Legacy => DateTime::parse_from_str(text, LEGACY_FORMAT)
                .ok()
                .or_else(|| {
                    let (stamp, _zone) = text.rsplit_once(' ')?;
                    DateTime::parse_from_str(stamp, LEGACY_FORMAT).ok()
                }),
            DateLayout::Rfc3339Nano => DateTime::parse_from_rfc3339(text).ok(),
        };
        parsed.map(|dt| dt.with_timezone(&Utc))
    }
}
