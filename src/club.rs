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

//! A specialization of the generic tree search from `search` for the all-2-clubs problem.
//!
//! The module provides the search tree node and model types as well as the `find_candidates()`
//! function to run the complete search on a graph. The model precomputes everything immutable:
//! the initial two-hop connectivity matrix C = A + A·A, the neighbor lists (which describe each
//! vertex's rank-1 contribution to C) and the driver table for symmetry breaking. Each node then
//! carries its own connectivity matrix, updated incrementally by subtracting the contribution of
//! every excluded vertex.

use std::sync::Arc;
use std::time;

use fixedbitset::FixedBitSet;
use log::{debug, info};
use ndarray::Array2;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use crate::drivers::find_drivers;
use crate::drop::drop_vertex;
use crate::search;
use crate::{Candidate, ClubGraph, Membership};

/// A node in the 2-club search tree.
pub struct ClubNode {
    /// Two-hop connectivity among the surviving vertices. Terminal nodes carry no matrix.
    connectivity: Option<Array2<i32>>,
    /// Membership state per vertex.
    labels: Vec<Membership>,
    terminal: bool,
}

impl search::Node for ClubNode {
    fn terminal(&self) -> bool {
        self.terminal
    }
}

/// The tree search model for the all-2-clubs problem: the immutable graph-derived data plus the
/// branching rule.
pub struct TwoClubModel {
    /// Initial connectivity matrix C = A + A·A. C[i][j] > 0 iff i and j are within two hops;
    /// the diagonal holds the degrees.
    connectivity: Array2<i32>,
    /// Neighbor lists. The contribution matrix of vertex v (counting the two-paths through v)
    /// is non-zero exactly on N(v) × N(v), so excluding v subtracts one from those entries.
    neighbors: Vec<Vec<usize>>,
    /// Driver table: the lifters forced out alongside each excluded vertex.
    drivers: Vec<Vec<usize>>,
}

impl TwoClubModel {
    pub fn new(graph: &ClubGraph) -> TwoClubModel {
        let n = graph.node_count();
        let mut adjacency = Array2::<i32>::zeros((n, n));
        for edge in graph.edge_references() {
            let u = edge.source().index();
            let v = edge.target().index();
            if u != v {
                adjacency[[u, v]] = 1;
                adjacency[[v, u]] = 1;
            }
        }

        let connectivity = &adjacency + &adjacency.dot(&adjacency);
        let neighbors = (0..n)
            .map(|v| (0..n).filter(|&u| adjacency[[v, u]] != 0).collect())
            .collect();
        let drivers = find_drivers(graph).drivers;

        TwoClubModel {
            connectivity,
            neighbors,
            drivers,
        }
    }

    /// Exclude vertex v from a connectivity matrix: subtract its contribution of two-paths
    /// u-v-w from every entry [u, w] with u, w neighbors of v.
    fn exclude(&self, connectivity: &mut Array2<i32>, v: usize) {
        for &u in self.neighbors[v].iter() {
            for &w in self.neighbors[v].iter() {
                connectivity[[u, w]] -= 1;
            }
        }
    }
}

impl search::Model for TwoClubModel {
    type Node = ClubNode;

    fn root(&self) -> ClubNode {
        ClubNode {
            connectivity: Some(self.connectivity.clone()),
            labels: vec![Membership::Undecided; self.neighbors.len()],
            terminal: false,
        }
    }

    fn expand(&self, node: ClubNode) -> Vec<ClubNode> {
        let labels = node.labels;
        let connectivity = match node.connectivity {
            Some(connectivity) => connectivity,
            None => return Vec::new(),
        };
        let n = labels.len();

        // Two committed members out of two-hop reach make the whole branch infeasible.
        let members: Vec<usize> = (0..n)
            .filter(|&i| labels[i] == Membership::Included)
            .collect();
        for &i in members.iter() {
            for &j in members.iter() {
                if connectivity[[i, j]] == 0 {
                    return Vec::new();
                }
            }
        }

        let to_remove = match drop_vertex(&connectivity, &labels) {
            Some(r) => r,
            // Every surviving pair is within two hops: a leaf is reached.
            None => {
                return vec![ClubNode {
                    connectivity: None,
                    labels,
                    terminal: true,
                }]
            }
        };

        let mut children = Vec::with_capacity(2);

        // Include branch: commit the branch vertex. Everything out of its two-hop reach has to
        // leave; a committed member out of reach kills the branch.
        let mut feasible = true;
        let mut keep_labels = labels.clone();
        keep_labels[to_remove] = Membership::Included;
        let mut keep_connectivity = connectivity.clone();
        for i in 0..n {
            if connectivity[[i, to_remove]] == 0 {
                match keep_labels[i] {
                    Membership::Included => {
                        feasible = false;
                        break;
                    }
                    Membership::Undecided => {
                        self.exclude(&mut keep_connectivity, i);
                        keep_labels[i] = Membership::Excluded;
                    }
                    Membership::Excluded => {}
                }
            }
        }
        if feasible {
            children.push(ClubNode {
                connectivity: Some(keep_connectivity),
                labels: keep_labels,
                terminal: false,
            });
        }

        // Exclude branch: drop the branch vertex together with its still undecided lifters. A
        // lifter that is already committed kills the branch instead.
        let mut feasible = true;
        let mut to_remove_list = vec![to_remove];
        for &lifter in self.drivers[to_remove].iter() {
            match labels[lifter] {
                Membership::Included => {
                    feasible = false;
                    break;
                }
                Membership::Undecided => to_remove_list.push(lifter),
                Membership::Excluded => {}
            }
        }
        if feasible {
            let mut rem_connectivity = connectivity;
            let mut rem_labels = labels;
            for &v in to_remove_list.iter() {
                self.exclude(&mut rem_connectivity, v);
                rem_labels[v] = Membership::Excluded;
            }
            children.push(ClubNode {
                connectivity: Some(rem_connectivity),
                labels: rem_labels,
                terminal: false,
            });
        }

        children
    }
}

/// Run the complete 2-club search on a graph and return the elapsed time together with the
/// candidate list (one candidate per terminal search tree node, a superset of the maximal
/// 2-clubs).
///
/// An empty graph yields no candidates.
pub fn find_candidates(
    graph: &ClubGraph,
    hub_division: &[usize],
    max_len: usize,
) -> (time::Duration, Vec<Candidate>) {
    if graph.node_count() == 0 {
        return (time::Duration::default(), Vec::new());
    }

    let model = Arc::new(TwoClubModel::new(graph));
    info!(
        "Searching 2-clubs of a graph with {} vertices, hub division {:?}",
        graph.node_count(),
        hub_division
    );

    let tic = time::Instant::now();
    let answers = search::solve(model, hub_division, max_len);
    let elapsed = tic.elapsed();
    debug!(
        "Collected {} terminal nodes in {:.3}s",
        answers.len(),
        elapsed.as_millis() as f32 / 1000f32
    );

    let mut candidates: Vec<Candidate> = answers
        .iter()
        .map(|node| Candidate::from_labels(&node.labels))
        .collect();

    // An isolated vertex is a maximal 2-club of its own, but no search leaf reports it: without
    // neighbors its include branch is always infeasible. Emit those singletons directly to keep
    // the candidate stream a superset of all maximal 2-clubs.
    for v in 0..graph.node_count() {
        if graph.neighbors(NodeIndex::new(v)).next().is_none() {
            let mut members = FixedBitSet::with_capacity(graph.node_count());
            members.insert(v);
            candidates.push(Candidate { members });
        }
    }

    (elapsed, candidates)
}
