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

use chrome_trace_format::{MetadataEvent, MetadataName, TraceEvent, TraceSink};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Process id used as the parent of top-level names.
pub const ROOT: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ResourceKey {
    parent: u32,
    name: String,
}

/// Hands out stable pid/tid values for resource names and emits the
/// metadata events that name them in the viewer.
///
/// Ids come from one counter shared by processes and threads, starting at 1
/// and assigned in first-seen order. Nothing is ever removed.
#[derive(Debug, Default)]
pub struct Registry {
    next_id: u32,
    ids: HashMap<ResourceKey, u32>,
    announced_processes: HashSet<u32>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_id(
        &mut self,
        name: &str,
        sink: &mut impl TraceSink,
    ) -> chrome_trace_format::Result<u32> {
        let pid = self.thread_id(ROOT, name, sink)?;
        if self.announced_processes.insert(pid) {
            sink.push(TraceEvent::Metadata(MetadataEvent::named(
                MetadataName::ProcessName,
                pid,
                pid,
                name,
            )))?;
        }
        Ok(pid)
    }

    /// Returns the id of `name` under `parent`. A new id under [`ROOT`] is
    /// also its own pid.
    pub fn thread_id(
        &mut self,
        parent: u32,
        name: &str,
        sink: &mut impl TraceSink,
    ) -> chrome_trace_format::Result<u32> {
        let key = ResourceKey {
            parent,
            name: name.to_string(),
        };
        if let Some(&tid) = self.ids.get(&key) {
            return Ok(tid);
        }

        self.next_id += 1;
        let tid = self.next_id;
        let pid = if parent == ROOT { tid } else { parent };
        self.ids.insert(key, tid);
        debug!(pid, tid, name, "allocated track");

        sink.push(TraceEvent::Metadata(MetadataEvent::named(
            MetadataName::ThreadName,
            pid,
            tid,
            name,
        )))?;
        Ok(tid)
    }

    pub fn process_count(&self) -> usize {
        self.announced_processes.len()
    }

    /// Number of ids allocated so far, processes included.
    pub fn allocated(&self) -> u32 {
        self.next_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrome_trace_format::Phase;
    use rstest::*;

    #[fixture]
    fn registry() -> Registry {
        Registry::new()
    }

    fn metadata(events: &[TraceEvent]) -> Vec<(MetadataName, u32, u32, String)> {
        events
            .iter()
            .map(|event| match event {
                TraceEvent::Metadata(m) => {
                    assert_eq!(m.ph, Phase::Metadata);
                    (
                        m.name.clone(),
                        m.pid,
                        m.tid,
                        m.display_name().unwrap_or_default().to_string(),
                    )
                }
                other => panic!("unexpected event {other:?}"),
            })
            .collect()
    }

    #[rstest]
    fn test_process_announced_once(mut registry: Registry) {
        let mut events = Vec::new();
        let first = registry.process_id("ns/default", &mut events).unwrap();
        let again = registry.process_id("ns/default", &mut events).unwrap();
        assert_eq!(first, 1);
        assert_eq!(first, again);
        assert_eq!(
            metadata(&events),
            vec![
                (MetadataName::ThreadName, 1, 1, "ns/default".to_string()),
                (MetadataName::ProcessName, 1, 1, "ns/default".to_string()),
            ]
        );
        assert_eq!(registry.process_count(), 1);
    }

    #[rstest]
    fn test_thread_scoped_to_parent(mut registry: Registry) {
        let mut events = Vec::new();
        let ns_a = registry.process_id("ns/a", &mut events).unwrap();
        let ns_b = registry.process_id("ns/b", &mut events).unwrap();
        let pod_a = registry.thread_id(ns_a, "pod/web", &mut events).unwrap();
        let pod_b = registry.thread_id(ns_b, "pod/web", &mut events).unwrap();
        assert_ne!(pod_a, pod_b);
        assert_eq!(registry.thread_id(ns_a, "pod/web", &mut events).unwrap(), pod_a);

        let named = metadata(&events);
        assert_eq!(named.len(), 6);
        assert_eq!(
            named[4],
            (MetadataName::ThreadName, ns_a, pod_a, "pod/web".to_string())
        );
        assert_eq!(
            named[5],
            (MetadataName::ThreadName, ns_b, pod_b, "pod/web".to_string())
        );
    }

    #[rstest]
    fn test_ids_unique_and_first_seen(mut registry: Registry) {
        let mut events = Vec::new();
        let other = registry.process_id("other", &mut events).unwrap();
        let node = registry.process_id("node/a", &mut events).unwrap();
        let cond = registry
            .thread_id(node, "condition/Available", &mut events)
            .unwrap();
        let operator = registry
            .process_id("clusteroperator/dns", &mut events)
            .unwrap();
        assert_eq!((other, node, cond, operator), (1, 2, 3, 4));
        assert_eq!(registry.allocated(), 4);
        assert_eq!(registry.process_count(), 3);
    }

    #[rstest]
    fn test_name_reused_as_thread_and_process(mut registry: Registry) {
        let mut events = Vec::new();
        // A root-level thread name later used as a process is announced then.
        let tid = registry.thread_id(ROOT, "node/a", &mut events).unwrap();
        assert_eq!(events.len(), 1);
        let pid = registry.process_id("node/a", &mut events).unwrap();
        assert_eq!(tid, pid);
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[1],
            TraceEvent::Metadata(m) if m.name == MetadataName::ProcessName
        ));
    }

    #[test]
    fn test_registries_are_independent() {
        let mut events = Vec::new();
        let mut first = Registry::new();
        let mut second = Registry::new();
        first.process_id("node/a", &mut events).unwrap();
        first.process_id("node/b", &mut events).unwrap();
        assert_eq!(second.process_id("node/b", &mut events).unwrap(), 1);
    }
}
