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

//! Driver/lifter analysis of a graph, used by the search to collapse symmetric branches.
//!
//! A vertex u is a *lifter* of v when u's closed neighborhood is strictly contained in v's. Any
//! maximal 2-club that excludes v must then exclude u as well (otherwise v could be added along
//! u's connections), so the exclude branch of the search removes a vertex together with its
//! lifters. Vertices whose closed neighborhoods coincide modulo each other are *peers*; their
//! subtrees mirror each other, so only one of a peer group keeps its driver role.

use fixedbitset::FixedBitSet;
use petgraph::graph::NodeIndex;

use crate::ClubGraph;

/// Result of the analysis.
pub struct DriverTable {
    /// For each vertex, the lifters that are forced out with it. Empty for vertices that are not
    /// exported as drivers.
    pub drivers: Vec<Vec<usize>>,
    /// For each vertex, its peers (symmetric).
    pub peers: Vec<Vec<usize>>,
}

/// Compute the driver table of a graph.
///
/// Lifter candidacy uses strict containment of closed neighborhoods, which makes the relation
/// antisymmetric. The pruning pass runs in ascending vertex order: a vertex loses its exported
/// driver entry at the first non-peer vertex it lifts, since its subtree is then fully explored
/// as part of that vertex's exclude branch. Peers never cost each other their entries.
pub fn find_drivers(graph: &ClubGraph) -> DriverTable {
    let n = graph.node_count();

    // Closed neighborhoods
    let mut hoods: Vec<FixedBitSet> = Vec::with_capacity(n);
    for v in 0..n {
        let mut hood = FixedBitSet::with_capacity(n);
        hood.insert(v);
        for u in graph.neighbors(NodeIndex::new(v)) {
            hood.insert(u.index());
        }
        hoods.push(hood);
    }

    let is_lifter = |u: usize, v: usize| -> bool {
        hoods[u].is_subset(&hoods[v]) && hoods[u].count_ones(..) < hoods[v].count_ones(..)
    };
    let are_peers = |u: usize, v: usize| -> bool {
        let mut a = hoods[u].clone();
        a.set(u, false);
        a.set(v, false);
        let mut b = hoods[v].clone();
        b.set(u, false);
        b.set(v, false);
        a == b
    };

    let mut candidates: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut peers: Vec<Vec<usize>> = vec![Vec::new(); n];
    for v in 0..n {
        for u in 0..n {
            if u == v {
                continue;
            }
            if is_lifter(u, v) {
                candidates[v].push(u);
            }
            if are_peers(u, v) {
                peers[v].push(u);
            }
        }
    }

    let mut exported = vec![true; n];
    for v in 0..n {
        for u in 0..n {
            if u == v || peers[v].binary_search(&u).is_ok() {
                continue;
            }
            if candidates[u].binary_search(&v).is_ok() {
                exported[v] = false;
                break;
            }
        }
    }

    let drivers = candidates
        .into_iter()
        .enumerate()
        .map(|(v, lifters)| if exported[v] { lifters } else { Vec::new() })
        .collect();

    DriverTable { drivers, peers }
}

#[cfg(test)]
mod tests {
    use super::find_drivers;
    use crate::ClubGraph;

    fn graph_from_edges(n: usize, edges: &[(usize, usize)]) -> ClubGraph {
        let mut graph = ClubGraph::default();
        let indices: Vec<_> = (0..n).map(|i| graph.add_node(i.to_string())).collect();
        for &(u, v) in edges {
            graph.add_edge(indices[u], indices[v], ());
        }
        graph
    }

    #[test]
    fn test_star_center_drives_its_leaves() {
        // Star with center 0: every leaf's closed neighborhood {0, leaf} sits strictly inside
        // the center's. The leaves are pairwise peers and all lose their (empty) driver entries
        // to the center anyway.
        let table = find_drivers(&graph_from_edges(5, &[(0, 1), (0, 2), (0, 3), (0, 4)]));
        assert_eq!(table.drivers[0], vec![1, 2, 3, 4]);
        for leaf in 1..5 {
            assert!(table.drivers[leaf].is_empty());
            let expected: Vec<usize> = (1..5).filter(|&u| u != leaf).collect();
            assert_eq!(table.peers[leaf], expected);
        }
    }

    #[test]
    fn test_path_midpoint_drives_endpoints() {
        // 0-1-2: both endpoints lift the midpoint and are non-adjacent twins of each other.
        let table = find_drivers(&graph_from_edges(3, &[(0, 1), (1, 2)]));
        assert_eq!(table.drivers[1], vec![0, 2]);
        assert!(table.drivers[0].is_empty());
        assert!(table.drivers[2].is_empty());
        assert_eq!(table.peers[0], vec![2]);
        assert_eq!(table.peers[2], vec![0]);
    }

    #[test]
    fn test_adjacent_twins_are_peers() {
        // Triangle: all closed neighborhoods are equal, so nobody lifts anybody but everybody
        // peers with everybody.
        let table = find_drivers(&graph_from_edges(3, &[(0, 1), (1, 2), (0, 2)]));
        for v in 0..3 {
            assert!(table.drivers[v].is_empty());
            assert_eq!(table.peers[v].len(), 2);
        }
    }

    #[test]
    fn test_antisymmetry_and_peer_symmetry() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        for seed in 0..30u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let n = rng.gen_range(2..9);
            let mut edges = Vec::new();
            for u in 0..n {
                for v in (u + 1)..n {
                    if rng.gen_bool(0.4) {
                        edges.push((u, v));
                    }
                }
            }
            let table = find_drivers(&graph_from_edges(n, &edges));

            for v in 0..n {
                assert!(!table.drivers[v].contains(&v));
                for &u in table.drivers[v].iter() {
                    assert!(
                        !table.drivers[u].contains(&v),
                        "driver relation not antisymmetric for {} and {} (seed {})",
                        u,
                        v,
                        seed
                    );
                }
                for &u in table.peers[v].iter() {
                    assert!(
                        table.peers[u].contains(&v),
                        "peer relation not symmetric for {} and {} (seed {})",
                        u,
                        v,
                        seed
                    );
                }
            }
        }
    }
}
