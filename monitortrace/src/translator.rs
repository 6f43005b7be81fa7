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

use crate::classify::{classify, Resource, TestPhase, E2E_NAMESPACE_PROCESS, E2E_TEST_PROCESS};
use crate::intervals::{OpenIntervals, TrackKey};
use crate::record::LogRecord;
use crate::registry::Registry;
use chrome_trace_format::{CompleteEvent, DurationEvent, Phase, TraceEvent, TraceSink};
use std::time::Duration;
use tracing::{debug, trace};

/// Process receiving every record no rule claims.
pub const OTHER_PROCESS: &str = "other";

pub const DEFAULT_REFERENCE_YEAR: i32 = 2021;
/// Floor for complete event durations. Shorter events vanish at the zoom
/// levels a whole cluster run is viewed at.
pub const DEFAULT_MIN_DURATION: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatorOptions {
    /// Year applied to the year-less record timestamps.
    pub reference_year: i32,
    /// Complete events shorter than this are stretched to it. Values below
    /// [`DEFAULT_MIN_DURATION`] are raised to it.
    pub min_duration: Duration,
}

impl Default for TranslatorOptions {
    fn default() -> Self {
        Self {
            reference_year: DEFAULT_REFERENCE_YEAR,
            min_duration: DEFAULT_MIN_DURATION,
        }
    }
}

/// Turns decoded records into trace events.
///
/// Every record yields one complete event on the track its resource maps
/// to. Cluster operator conditions and e2e tests additionally drive
/// begin/end pairs: an observation first closes whatever interval is open on
/// its track, then an abnormal condition or a test start opens a new one.
pub struct LineTranslator {
    registry: Registry,
    intervals: OpenIntervals,
    other_pid: u32,
    min_duration_us: u64,
}

impl LineTranslator {
    /// Creates a translator with a fresh registry. The `other` process is
    /// registered up front, so its metadata leads the trace.
    pub fn new(
        options: &TranslatorOptions,
        sink: &mut impl TraceSink,
    ) -> chrome_trace_format::Result<Self> {
        let mut registry = Registry::new();
        let other_pid = registry.process_id(OTHER_PROCESS, sink)?;
        Ok(Self {
            registry,
            intervals: OpenIntervals::new(),
            other_pid,
            min_duration_us: duration_us(options.min_duration.max(DEFAULT_MIN_DURATION)),
        })
    }

    pub fn translate(
        &mut self,
        record: &LogRecord,
        sink: &mut impl TraceSink,
    ) -> chrome_trace_format::Result<()> {
        let ts = record.timestamp_us;
        let mut pid = self.other_pid;
        let mut tid = None;
        let mut begin = None;

        match classify(&record.message) {
            Resource::Unclassified => {}
            Resource::E2eNamespace => {
                pid = self.registry.process_id(E2E_NAMESPACE_PROCESS, sink)?;
            }
            Resource::Namespace { namespace, pod } => {
                pid = self.registry.process_id(namespace, sink)?;
                if let Some(pod) = pod {
                    tid = Some(self.registry.thread_id(pid, pod, sink)?);
                }
            }
            Resource::Node { node } => {
                pid = self.registry.process_id(node, sink)?;
            }
            Resource::ClusterOperator {
                operator,
                condition,
            } => {
                pid = self.registry.process_id(operator, sink)?;
                if let Some(condition) = condition {
                    let key = TrackKey {
                        pid,
                        tid: self.registry.thread_id(pid, condition.name, sink)?,
                    };
                    tid = Some(key.tid);
                    self.close_interval(key, ts, sink)?;
                    if condition.is_abnormal() {
                        begin = Some((key, record.message.clone()));
                    }
                }
            }
            Resource::E2eTest(observation) => {
                pid = self.registry.process_id(E2E_TEST_PROCESS, sink)?;
                if let Some(observation) = observation {
                    let key = TrackKey {
                        pid,
                        tid: self.registry.thread_id(pid, observation.name, sink)?,
                    };
                    tid = Some(key.tid);
                    self.close_interval(key, ts, sink)?;
                    if observation.phase == TestPhase::Started {
                        begin = Some((key, observation.name.to_string()));
                    }
                }
            }
        }

        let tid = tid.unwrap_or(pid);
        trace!(pid, tid, ts, severity = ?record.severity, "translated record");

        if let Some((key, label)) = begin {
            debug!(pid, tid, label = %label, "interval opened");
            sink.push(TraceEvent::Duration(
                DurationEvent::builder()
                    .name(label.clone())
                    .ph(Phase::DurationBegin)
                    .pid(pid)
                    .tid(tid)
                    .ts(ts)
                    .build(),
            ))?;
            self.intervals.open(key, label, ts);
        }

        let dur = duration_us(record.prior_duration).max(self.min_duration_us);
        sink.push(TraceEvent::Complete(
            CompleteEvent::builder()
                .name(record.message.clone())
                .ph(Phase::Complete)
                .pid(pid)
                .tid(tid)
                .ts(ts)
                .dur(dur)
                .build(),
        ))
    }

    fn close_interval(
        &mut self,
        key: TrackKey,
        ts: u64,
        sink: &mut impl TraceSink,
    ) -> chrome_trace_format::Result<()> {
        let Some(interval) = self.intervals.close(key) else {
            return Ok(());
        };
        debug!(
            pid = key.pid,
            tid = key.tid,
            label = %interval.label,
            elapsed_us = ts.saturating_sub(interval.started_us),
            "interval closed"
        );
        sink.push(TraceEvent::Duration(
            DurationEvent::builder()
                .name(interval.label)
                .ph(Phase::DurationEnd)
                .pid(key.pid)
                .tid(key.tid)
                .ts(ts)
                .build(),
        ))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Intervals still waiting for their closing observation. No end event
    /// is synthesized for these.
    pub fn open_intervals(&self) -> &OpenIntervals {
        &self.intervals
    }
}

fn duration_us(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}
