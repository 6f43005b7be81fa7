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

use crate::record::{decode_line, DecodeError};
use crate::translator::{LineTranslator, TranslatorOptions};
use crate::{Error, Result};
use chrome_trace_format::JsonArrayWriter;
use std::io::{BufRead, Write};
use tracing::{trace, warn};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub lines: usize,
    pub blank_lines: usize,
    pub events: u64,
    pub processes: usize,
    /// Process and thread ids handed out.
    pub tracks: u32,
    /// Labels of intervals never closed, in track order.
    pub open_intervals: Vec<String>,
}

/// Reads monitor log lines from `input` and streams the trace array to
/// `output`.
///
/// Any malformed line aborts the conversion. Whatever was written before
/// the failure stays in `output` and the array is not terminated.
pub fn convert<R: BufRead, W: Write>(
    input: R,
    output: W,
    options: &TranslatorOptions,
) -> Result<Summary> {
    let mut writer = JsonArrayWriter::new(output)?;
    let mut translator = LineTranslator::new(options, &mut writer)?;
    let mut summary = Summary::default();

    for (index, bytes) in input.split(b'\n').enumerate() {
        let raw = bytes?;
        let bytes = raw.strip_suffix(b"\r").unwrap_or(raw.as_slice());
        let decode_error = |source: DecodeError| Error::Decode {
            line: index + 1,
            source,
        };
        let line = std::str::from_utf8(bytes)
            .map_err(|e| decode_error(DecodeError::InvalidUtf8(e)))?;
        summary.lines += 1;
        if line.is_empty() {
            summary.blank_lines += 1;
            continue;
        }
        let record = decode_line(line, options.reference_year).map_err(decode_error)?;
        trace!(line = index + 1, message = %record.message, "decoded record");
        translator.translate(&record, &mut writer)?;
    }

    summary.events = writer.events_written();
    writer.finish()?;

    summary.processes = translator.registry().process_count();
    summary.tracks = translator.registry().allocated();
    for (key, interval) in translator.open_intervals().iter() {
        warn!(
            pid = key.pid,
            tid = key.tid,
            label = %interval.label,
            "interval still open at end of input"
        );
        summary.open_intervals.push(interval.label.clone());
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrome_trace_format::{Phase, TraceEvent};
    use std::io::Cursor;

    fn run(input: &str) -> (Result<Summary>, String) {
        let mut output = Vec::new();
        let result = convert(
            Cursor::new(input.as_bytes()),
            &mut output,
            &TranslatorOptions::default(),
        );
        (result, String::from_utf8(output).expect("utf8"))
    }

    #[test]
    fn test_empty_input_still_names_other() {
        let (result, output) = run("");
        let summary = result.expect("convert");
        assert_eq!(summary.lines, 0);
        assert_eq!(summary.events, 2);
        let events: Vec<TraceEvent> = serde_json::from_str(&output).expect("valid json");
        assert!(events.iter().all(|e| *e.phase() == Phase::Metadata));
        assert!(output.ends_with("]\n"));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let (result, output) = run("\nJan 01 00:00:00.000 I node/a\n\r\n\n");
        let summary = result.expect("convert");
        assert_eq!(summary.lines, 4);
        assert_eq!(summary.blank_lines, 3);
        let events: Vec<TraceEvent> = serde_json::from_str(&output).expect("valid json");
        assert_eq!(events.len(), 5);
    }

    #[test]
    fn test_decode_error_names_line() {
        let (result, output) = run("Jan 01 00:00:00.000 I node/a\nshort\nJan 01 00:00:02.000 I node/b\n");
        match result {
            Err(Error::Decode { line, source }) => {
                assert_eq!(line, 2);
                assert!(matches!(source, DecodeError::TooShort(_)));
            }
            other => panic!("expected decode error, got {other:?}"),
        }
        assert!(output.starts_with('['));
        assert!(!output.trim_end().ends_with(']'));
        assert!(!output.contains("node/b"));
    }

    #[test]
    fn test_invalid_utf8_names_line() {
        let mut input = b"Jan 01 00:00:00.000 I node/a\n".to_vec();
        input.extend_from_slice(b"Jan 01 00:00:01.000 I node/\xff\n");
        let mut output = Vec::new();
        let result = convert(
            Cursor::new(input),
            &mut output,
            &TranslatorOptions::default(),
        );
        match result {
            Err(Error::Decode { line, source }) => {
                assert_eq!(line, 2);
                assert!(matches!(source, DecodeError::InvalidUtf8(_)));
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_open_intervals_reported() {
        let (result, _) = run(concat!(
            "Jan 01 00:00:00.000 I clusteroperator/dns condition/Degraded status/True\n",
            "Jan 01 00:00:01.000 I e2e-test/\"Foo\" started\n",
        ));
        let summary = result.expect("convert");
        assert_eq!(
            summary.open_intervals,
            vec![
                "clusteroperator/dns condition/Degraded status/True".to_string(),
                "Foo".to_string(),
            ]
        );
        assert_eq!(summary.processes, 3);
        assert_eq!(summary.tracks, 5);
    }
}
