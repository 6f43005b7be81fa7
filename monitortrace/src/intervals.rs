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

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackKey {
    pub pid: u32,
    pub tid: u32,
}

/// An interval that has been opened on a track and not yet closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenInterval {
    pub label: String,
    pub started_us: u64,
}

/// At most one open interval per track.
///
/// Ordered by key so the leftovers reported at end of input come out the
/// same way every run.
#[derive(Debug, Default)]
pub struct OpenIntervals {
    open: BTreeMap<TrackKey, OpenInterval>,
}

impl OpenIntervals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns the interval open on `key`, if any.
    pub fn close(&mut self, key: TrackKey) -> Option<OpenInterval> {
        self.open.remove(&key)
    }

    /// Callers close the key first; opening over a live interval would lose
    /// its end event.
    pub fn open(&mut self, key: TrackKey, label: String, started_us: u64) {
        let previous = self.open.insert(key, OpenInterval { label, started_us });
        debug_assert!(previous.is_none(), "interval reopened without closing");
    }

    pub fn get(&self, key: TrackKey) -> Option<&OpenInterval> {
        self.open.get(&key)
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TrackKey, &OpenInterval)> {
        self.open.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: TrackKey = TrackKey { pid: 2, tid: 3 };

    #[test]
    fn test_open_then_close() {
        let mut intervals = OpenIntervals::new();
        assert!(intervals.close(KEY).is_none());
        intervals.open(KEY, "label".to_string(), 10);
        assert_eq!(intervals.get(KEY).map(|i| i.label.as_str()), Some("label"));
        assert_eq!(
            intervals.close(KEY),
            Some(OpenInterval {
                label: "label".to_string(),
                started_us: 10
            })
        );
        assert!(intervals.is_empty());
    }

    #[test]
    fn test_keys_are_independent() {
        let mut intervals = OpenIntervals::new();
        let other = TrackKey { pid: 2, tid: 4 };
        intervals.open(KEY, "a".to_string(), 0);
        intervals.open(other, "b".to_string(), 0);
        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals.close(other).map(|i| i.label), Some("b".to_string()));
        assert_eq!(intervals.len(), 1);
    }

    #[test]
    fn test_iteration_is_key_ordered() {
        let mut intervals = OpenIntervals::new();
        intervals.open(TrackKey { pid: 9, tid: 1 }, "late".to_string(), 0);
        intervals.open(TrackKey { pid: 1, tid: 7 }, "early".to_string(), 0);
        let labels: Vec<_> = intervals.iter().map(|(_, i)| i.label.as_str()).collect();
        assert_eq!(labels, vec!["early", "late"]);
    }
}
