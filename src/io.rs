// Copyright 2021 by Michael Thies <mail@mhthies.de>
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not use this file except in compliance with
// the License. You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the License for the
// specific language governing permissions and limitations under the License.

pub mod boroughs;
pub mod candidates;
pub mod graphml;

use std::fmt::Write;

use petgraph::graph::NodeIndex;

use crate::{Candidate, ClubGraph};

/// Format the candidate list into a human readable String (e.g. to print it to stdout), using
/// the external vertex identifiers from the graph.
///
/// The output format will look like
/// ```text
///      0  [n1, n4, n5]
///      1  [n2, n3, n4]
/// …
/// ```
pub fn format_candidates(candidates: &[Candidate], graph: &ClubGraph) -> String {
    let mut result = String::new();
    for (id, candidate) in candidates.iter().enumerate() {
        let names: Vec<&str> = candidate
            .members
            .ones()
            .map(|v| graph[NodeIndex::new(v)].as_str())
            .collect();
        writeln!(result, "{:>6}  [{}]", id, names.join(", ")).unwrap();
    }
    result
}
