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

//! Maps a record message to the resource it describes.
//!
//! Rules are tried in table order against the first space-delimited token;
//! the first matching prefix wins, so `ns/e2e-` must precede `ns/`.

/// Synthetic process collecting every per-test namespace.
pub const E2E_NAMESPACE_PROCESS: &str = "ns/e2e-*";
/// Synthetic process collecting every e2e test.
pub const E2E_TEST_PROCESS: &str = "e2e-test/*";

const E2E_TEST_PREFIX: &str = "e2e-test/";
const STARTED_SUFFIX: &str = " started";
const FINISHED_MARKER: &str = " finishedStatus/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource<'a> {
    E2eNamespace,
    Namespace {
        namespace: &'a str,
        pod: Option<&'a str>,
    },
    Node {
        node: &'a str,
    },
    ClusterOperator {
        operator: &'a str,
        condition: Option<Condition<'a>>,
    },
    E2eTest(Option<TestObservation<'a>>),
    Unclassified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition<'a> {
    pub name: &'a str,
    /// Everything after the condition token, e.g. `status/False reason/...`.
    pub status: &'a str,
}

impl Condition<'_> {
    /// `condition/Available` is a problem when false; every other condition
    /// (Degraded, Progressing, ...) is a problem when true.
    pub fn is_abnormal(&self) -> bool {
        match self.name {
            "condition/Available" => self.status.starts_with("status/False"),
            _ => self.status.starts_with("status/True"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestPhase {
    Started,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestObservation<'a> {
    /// Test name without the `e2e-test/` prefix and surrounding quotes.
    pub name: &'a str,
    pub phase: TestPhase,
}

struct Rule {
    prefix: &'static str,
    resolve: for<'a> fn(head: &'a str, rest: &'a str, message: &'a str) -> Resource<'a>,
}

const RULES: [Rule; 5] = [
    Rule {
        prefix: "ns/e2e-",
        resolve: e2e_namespace,
    },
    Rule {
        prefix: "ns/",
        resolve: namespace,
    },
    Rule {
        prefix: "node/",
        resolve: node,
    },
    Rule {
        prefix: "clusteroperator/",
        resolve: cluster_operator,
    },
    Rule {
        prefix: E2E_TEST_PREFIX,
        resolve: e2e_test,
    },
];

pub fn classify(message: &str) -> Resource<'_> {
    let (head, rest) = split_token(message);
    RULES
        .iter()
        .find(|rule| head.starts_with(rule.prefix))
        .map_or(Resource::Unclassified, |rule| {
            (rule.resolve)(head, rest, message)
        })
}

fn e2e_namespace<'a>(_: &'a str, _: &'a str, _: &'a str) -> Resource<'a> {
    Resource::E2eNamespace
}

fn namespace<'a>(head: &'a str, rest: &'a str, _: &'a str) -> Resource<'a> {
    let (next, _) = split_token(rest);
    Resource::Namespace {
        namespace: head,
        pod: next.starts_with("pod/").then_some(next),
    }
}

fn node<'a>(head: &'a str, _: &'a str, _: &'a str) -> Resource<'a> {
    Resource::Node { node: head }
}

fn cluster_operator<'a>(head: &'a str, rest: &'a str, _: &'a str) -> Resource<'a> {
    let (next, status) = split_token(rest);
    Resource::ClusterOperator {
        operator: head,
        condition: next
            .starts_with("condition/")
            .then_some(Condition { name: next, status }),
    }
}

fn e2e_test<'a>(_: &'a str, _: &'a str, message: &'a str) -> Resource<'a> {
    Resource::E2eTest(test_observation(message))
}

fn test_observation(message: &str) -> Option<TestObservation<'_>> {
    let (test, phase) = if let Some(test) = message.strip_suffix(STARTED_SUFFIX) {
        (test, TestPhase::Started)
    } else {
        let idx = message.find(FINISHED_MARKER)?;
        (&message[..idx], TestPhase::Finished)
    };
    Some(TestObservation {
        name: bare_test_name(test),
        phase,
    })
}

fn bare_test_name(test: &str) -> &str {
    let name = test.strip_prefix(E2E_TEST_PREFIX).unwrap_or(test);
    name.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(name)
}

fn split_token(s: &str) -> (&str, &str) {
    s.split_once(' ').unwrap_or((s, ""))
}
