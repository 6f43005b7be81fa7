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

//! # Chrome Trace Format
//!
//! Rust types for the part of the Chrome Trace Event Format used by
//! `monitortrace`: duration begin/end events, complete events and the
//! process/thread naming metadata events.
//!
//! Traces are written in the **JSON Array Format**, a plain array of events,
//! streamed one event at a time through [`JsonArrayWriter`].
//!
//! ## Timestamps
//!
//! All timestamps and durations are in microseconds.

mod writer;

pub use writer::JsonArrayWriter;

use bon::Builder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A single trace event.
///
/// Variants are ordered so that untagged deserialization picks the most
/// specific shape first: metadata needs a known `name` and `args`, complete
/// events need `dur`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TraceEvent {
    Metadata(MetadataEvent),
    Complete(CompleteEvent),
    Duration(DurationEvent),
}

impl TraceEvent {
    pub fn phase(&self) -> &Phase {
        match self {
            TraceEvent::Metadata(event) => &event.ph,
            TraceEvent::Complete(event) => &event.ph,
            TraceEvent::Duration(event) => &event.ph,
        }
    }

    pub fn pid(&self) -> u32 {
        match self {
            TraceEvent::Metadata(event) => event.pid,
            TraceEvent::Complete(event) => event.pid,
            TraceEvent::Duration(event) => event.pid,
        }
    }

    pub fn tid(&self) -> u32 {
        match self {
            TraceEvent::Metadata(event) => event.tid,
            TraceEvent::Complete(event) => event.tid,
            TraceEvent::Duration(event) => event.tid,
        }
    }
}

/// Event phase types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Begin phase of a duration event. Closed by a later DurationEnd on the
    /// same pid/tid.
    #[serde(rename = "B")]
    DurationBegin,
    /// End phase of a duration event.
    #[serde(rename = "E")]
    DurationEnd,
    /// Complete event carrying both a timestamp and a duration.
    #[serde(rename = "X")]
    Complete,
    /// Metadata event for process/thread names.
    #[serde(rename = "M")]
    Metadata,
}

/// Duration event marking the beginning or end of an interval on a thread.
///
/// Begin and end events on one thread must nest; the viewer matches an `E`
/// with the most recent open `B` on the same pid/tid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct DurationEvent {
    /// Display name of the event in the trace viewer.
    pub name: String,
    /// Event phase - must be DurationBegin (B) or DurationEnd (E).
    pub ph: Phase,
    pub pid: u32,
    pub tid: u32,
    /// Timestamp in microseconds.
    pub ts: u64,
    /// Comma-separated list of categories for filtering in the trace viewer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cat: Option<String>,
}

/// Complete event combining begin and end with a duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct CompleteEvent {
    pub name: String,
    /// Event phase - must be Complete (X).
    pub ph: Phase,
    pub pid: u32,
    pub tid: u32,
    /// Start timestamp in microseconds.
    pub ts: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cat: Option<String>,
    /// Duration in microseconds.
    pub dur: u64,
}

/// Metadata event names for process and thread information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetadataName {
    /// Sets the display name for a thread.
    #[serde(rename = "thread_name")]
    ThreadName,
    /// Sets the display name for a process.
    #[serde(rename = "process_name")]
    ProcessName,
}

/// Metadata event giving a process or thread id its display name.
///
/// `args` holds `{"name": "..."}`. A sorted map keeps the serialized form
/// stable across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct MetadataEvent {
    /// Type of metadata being set.
    pub name: MetadataName,
    /// Event phase - must be Metadata (M).
    pub ph: Phase,
    pub pid: u32,
    pub tid: u32,
    /// Metadata carries no meaningful time; the viewer ignores it.
    #[builder(default)]
    pub ts: u64,
    pub args: BTreeMap<String, String>,
}

impl MetadataEvent {
    /// Builds a `process_name`/`thread_name` event for `pid`/`tid`.
    pub fn named(kind: MetadataName, pid: u32, tid: u32, display_name: &str) -> Self {
        MetadataEvent::builder()
            .name(kind)
            .ph(Phase::Metadata)
            .pid(pid)
            .tid(tid)
            .args(BTreeMap::from([(
                "name".to_string(),
                display_name.to_string(),
            )]))
            .build()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.args.get("name").map(String::as_str)
    }
}

/// Destination for trace events as they are produced.
pub trait TraceSink {
    fn push(&mut self, event: TraceEvent) -> Result<()>;
}

impl TraceSink for Vec<TraceEvent> {
    fn push(&mut self, event: TraceEvent) -> Result<()> {
        Vec::push(self, event);
        Ok(())
    }
}
