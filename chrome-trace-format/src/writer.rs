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

use crate::{Result, TraceEvent, TraceSink};
use std::io::Write;

/// Streams trace events as a JSON array, one compact object per line.
///
/// The opening `[` is written by [`JsonArrayWriter::new`]; the closing `]`
/// only by [`JsonArrayWriter::finish`]. Dropping the writer without finishing
/// leaves the array unterminated.
pub struct JsonArrayWriter<W: Write> {
    writer: W,
    events_written: u64,
}

impl<W: Write> JsonArrayWriter<W> {
    pub fn new(mut writer: W) -> Result<Self> {
        writer.write_all(b"[")?;
        Ok(Self {
            writer,
            events_written: 0,
        })
    }

    pub fn write_event(&mut self, event: &TraceEvent) -> Result<()> {
        if self.events_written > 0 {
            self.writer.write_all(b",")?;
        }
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        self.events_written += 1;
        Ok(())
    }

    pub fn events_written(&self) -> u64 {
        self.events_written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Closes the array and hands back the underlying writer, flushed.
    pub fn finish(mut self) -> Result<W> {
        self.writer.write_all(b"]\n")?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> TraceSink for JsonArrayWriter<W> {
    fn push(&mut self, event: TraceEvent) -> Result<()> {
        self.write_event(&event)
    }
}
