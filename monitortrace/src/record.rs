// Copyright (C) 2025 Category Labs, Inc.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Decoding of a single monitor log line.
//!
//! ```text
//! Jan 01 00:00:00.000 I ns/default pod/foo Created
//! Jan 01 00:00:05.250 - 2.5s W node/worker-0 reason/NotReady
//! ```
//!
//! The first 19 characters are the timestamp (no year), then one space,
//! an optional `- <duration>` block, the severity character and the message.

use crate::duration::{parse_duration, DurationError};
use chrono::NaiveDateTime;
use std::time::Duration;
use thiserror::Error;

/// Byte width of the timestamp prefix.
pub const TIMESTAMP_WIDTH: usize = 19;

const TIMESTAMP_FORMAT: &str = "%Y %b %d %H:%M:%S%.f";

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("line is not valid UTF-8: {0}")]
    InvalidUtf8(#[source] std::str::Utf8Error),
    #[error("unexpected line {0:?}: shorter than the timestamp prefix")]
    TooShort(String),
    #[error("unexpected line {0:?}: no space after the timestamp")]
    MissingSeparator(String),
    #[error("invalid timestamp {text:?}: {source}")]
    Timestamp {
        text: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("timestamp {0:?} is before the unix epoch")]
    TimestampOutOfRange(String),
    #[error("unexpected line {0:?}: duration marker without a duration")]
    MissingDuration(String),
    #[error(transparent)]
    Duration(#[from] DurationError),
    #[error("unexpected line {line:?}: invalid severity {found:?}")]
    Severity { line: String, found: String },
}

/// Severity marker of a record. Carried through but never alters output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "I" => Some(Severity::Info),
            "W" => Some(Severity::Warning),
            "E" => Some(Severity::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Microseconds since the unix epoch, under the run's reference year.
    pub timestamp_us: u64,
    pub prior_duration: Duration,
    pub severity: Severity,
    pub message: String,
}

/// Decodes one non-blank line. `reference_year` supplies the year the
/// timestamp text lacks.
pub fn decode_line(line: &str, reference_year: i32) -> Result<LogRecord, DecodeError> {
    // `get` also rejects a prefix that would split a multi-byte character.
    let (Some(stamp), Some(rest)) = (line.get(..TIMESTAMP_WIDTH), line.get(TIMESTAMP_WIDTH..))
    else {
        return Err(DecodeError::TooShort(line.to_string()));
    };
    let Some(body) = rest.strip_prefix(' ') else {
        return Err(if rest.is_empty() {
            DecodeError::TooShort(line.to_string())
        } else {
            DecodeError::MissingSeparator(line.to_string())
        });
    };

    let timestamp_us = parse_timestamp(stamp, reference_year)?;

    let (prior_duration, body) = match body.strip_prefix('-') {
        Some(after_marker) => {
            let after_marker = after_marker.strip_prefix(' ').unwrap_or(after_marker);
            let (literal, tail) = after_marker
                .split_once(' ')
                .ok_or_else(|| DecodeError::MissingDuration(line.to_string()))?;
            (parse_duration(literal)?, tail.trim_start_matches(' '))
        }
        None => (Duration::ZERO, body),
    };

    let (marker, message) = body.split_once(' ').unwrap_or((body, ""));
    let severity = Severity::from_marker(marker).ok_or_else(|| DecodeError::Severity {
        line: line.to_string(),
        found: marker.to_string(),
    })?;

    Ok(LogRecord {
        timestamp_us,
        prior_duration,
        severity,
        message: message.to_string(),
    })
}

fn parse_timestamp(stamp: &str, reference_year: i32) -> Result<u64, DecodeError> {
    let text = format!("{reference_year} {stamp}");
    let parsed = NaiveDateTime::parse_from_str(&text, TIMESTAMP_FORMAT).map_err(|source| {
        DecodeError::Timestamp {
            text: stamp.to_string(),
            source,
        }
    })?;
    u64::try_from(parsed.and_utc().timestamp_micros())
        .map_err(|_| DecodeError::TimestampOutOfRange(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    // 2021-01-01T00:00:00Z
    const JAN_1_2021_US: u64 = 1_609_459_200_000_000;

    #[test]
    fn test_decode_plain_record() {
        let record = decode_line("Jan 01 00:00:00.000 I ns/default pod/foo Created", 2021)
            .expect("decode");
        assert_eq!(
            record,
            LogRecord {
                timestamp_us: JAN_1_2021_US,
                prior_duration: Duration::ZERO,
                severity: Severity::Info,
                message: "ns/default pod/foo Created".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_keeps_milliseconds() {
        let record = decode_line("Jan 01 00:00:01.250 W node/worker-0 NotReady", 2021)
            .expect("decode");
        assert_eq!(record.timestamp_us, JAN_1_2021_US + 1_250_000);
        assert_eq!(record.severity, Severity::Warning);
    }

    #[test]
    fn test_decode_prior_duration() {
        let record = decode_line(
            "Jan 01 00:01:00.000 - 1h2m3s E clusteroperator/dns condition/Degraded status/True",
            2021,
        )
        .expect("decode");
        assert_eq!(record.prior_duration, Duration::from_secs(3723));
        assert_eq!(record.severity, Severity::Error);
        assert_eq!(
            record.message,
            "clusteroperator/dns condition/Degraded status/True"
        );
    }

    #[test]
    fn test_decode_tolerates_padding_after_duration() {
        let record =
            decode_line("Jan 01 00:01:00.000 - 300ms   I node/a", 2021).expect("decode");
        assert_eq!(record.prior_duration, Duration::from_millis(300));
        assert_eq!(record.message, "node/a");
    }

    #[test]
    fn test_reference_year_shifts_timestamp() {
        let a = decode_line("Jan 01 00:00:00.000 I x", 2021).expect("decode");
        let b = decode_line("Jan 01 00:00:00.000 I x", 2020).expect("decode");
        // 2020 is a leap year, so 366 days separate the two.
        assert_eq!(a.timestamp_us - b.timestamp_us, 366 * 86_400 * 1_000_000);
    }

    #[test]
    fn test_severity_without_message() {
        let record = decode_line("Jan 01 00:00:00.000 I", 2021).expect("decode");
        assert_eq!(record.message, "");
    }

    #[rstest]
    #[case("Jan 01 00:00:00.000")]
    #[case("short")]
    #[case("")]
    fn test_too_short(#[case] line: &str) {
        assert!(matches!(
            decode_line(line, 2021),
            Err(DecodeError::TooShort(_))
        ));
    }

    #[test]
    fn test_missing_separator() {
        assert!(matches!(
            decode_line("Jan 01 00:00:00.000XI node/a", 2021),
            Err(DecodeError::MissingSeparator(_))
        ));
    }

    #[rstest]
    #[case("2021 Jan 01 00:00:00 I ns/default pod/foo Created")]
    #[case("Foo 01 00:00:00.000 I node/a")]
    #[case("Jan 32 00:00:00.000 I node/a")]
    fn test_bad_timestamp(#[case] line: &str) {
        assert!(matches!(
            decode_line(line, 2021),
            Err(DecodeError::Timestamp { .. }) | Err(DecodeError::MissingSeparator(_))
        ));
    }

    #[test]
    fn test_bad_duration() {
        assert!(matches!(
            decode_line("Jan 01 00:00:00.000 - 5days I node/a", 2021),
            Err(DecodeError::Duration(DurationError::UnknownUnit { .. }))
        ));
        assert!(matches!(
            decode_line("Jan 01 00:00:00.000 - 5s", 2021),
            Err(DecodeError::MissingDuration(_))
        ));
    }

    #[rstest]
    #[case("Jan 01 00:00:00.000 X node/a", "X")]
    #[case("Jan 01 00:00:00.000 Info node/a", "Info")]
    fn test_bad_severity(#[case] line: &str, #[case] marker: &str) {
        match decode_line(line, 2021) {
            Err(DecodeError::Severity { found, .. }) => assert_eq!(found, marker),
            other => panic!("expected severity error, got {other:?}"),
        }
    }
}
