//! The DROP branching heuristic of Bourjolly, Laporte and Pesant ("Heuristics for finding
//! k-clubs in an undirected graph", Computers & Operations Research 27(6): 559-569, 2000),
//! evaluated on the two-hop connectivity matrix of a partial solution.

use ndarray::Array2;

use crate::Membership;

/// Pick the vertex to drop from the partial solution described by `connectivity` and `labels`.
///
/// For every participating vertex i (not excluded), q(i) counts the participating vertices that
/// i cannot reach within two hops through surviving vertices. `None` is returned when all q are
/// zero: the surviving set already forms a 2-club and no further branching is needed. Otherwise
/// the vertex with maximal q wins, ties going to the smaller diagonal entry (the degree within
/// the surviving subgraph), scanning in ascending index order. Committed members are never
/// dropped.
pub fn drop_vertex(connectivity: &Array2<i32>, labels: &[Membership]) -> Option<usize> {
    let participating: Vec<usize> = labels
        .iter()
        .enumerate()
        .filter(|(_, label)| label.participates())
        .map(|(i, _)| i)
        .collect();

    let mut q = vec![0usize; labels.len()];
    let mut all_connected = true;
    for &i in participating.iter() {
        for &j in participating.iter() {
            if connectivity[[i, j]] == 0 {
                q[i] += 1;
            }
        }
        if q[i] > 0 {
            all_connected = false;
        }
    }
    if all_connected {
        return None;
    }

    let mut to_remove: Option<usize> = None;
    for &i in participating.iter() {
        if labels[i] == Membership::Included {
            continue;
        }
        match to_remove {
            None => to_remove = Some(i),
            Some(r) => {
                if q[i] > q[r] || (q[i] == q[r] && connectivity[[i, i]] < connectivity[[r, r]]) {
                    to_remove = Some(i);
                }
            }
        }
    }
    to_remove
}

#[cfg(test)]
mod tests {
    use super::drop_vertex;
    use crate::Membership::{Excluded, Included, Undecided};
    use ndarray::Array2;

    /// C = A + A·A for the given edge list.
    fn connectivity(n: usize, edges: &[(usize, usize)]) -> Array2<i32> {
        let mut a = Array2::<i32>::zeros((n, n));
        for &(u, v) in edges {
            a[[u, v]] = 1;
            a[[v, u]] = 1;
        }
        &a + &a.dot(&a)
    }

    #[test]
    fn test_connected_set_needs_no_branching() {
        // Triangle: every pair adjacent, q all zero.
        let c = connectivity(3, &[(0, 1), (1, 2), (0, 2)]);
        assert_eq!(drop_vertex(&c, &[Undecided; 3]), None);
    }

    #[test]
    fn test_path_endpoints_obstruct() {
        // 0-1-2-3: only the endpoint pair (0, 3) is more than two hops apart. Both endpoints
        // have q = 1 and degree 1; the scan order settles the tie on vertex 0.
        let c = connectivity(4, &[(0, 1), (1, 2), (2, 3)]);
        assert_eq!(drop_vertex(&c, &[Undecided; 4]), Some(0));
    }

    #[test]
    fn test_members_are_ineligible() {
        // Same path, but vertex 0 is committed: vertex 3 is the only remaining obstructor.
        let c = connectivity(4, &[(0, 1), (1, 2), (2, 3)]);
        let labels = [Included, Undecided, Undecided, Undecided];
        assert_eq!(drop_vertex(&c, &labels), Some(3));
    }

    #[test]
    fn test_degree_breaks_ties() {
        // A triangle with a pendant (vertices 0..3) next to a disconnected path 5-4-6. The path
        // vertices each obstruct the four triangle-side vertices, the triangle side only the
        // three path vertices. Within the winning path, the endpoints 5 and 6 beat the middle
        // vertex 4 on degree, and 5 is scanned first.
        let c = connectivity(
            7,
            &[(0, 1), (0, 2), (1, 2), (0, 3), (5, 4), (4, 6)],
        );
        assert_eq!(drop_vertex(&c, &[Undecided; 7]), Some(5));
    }

    #[test]
    fn test_excluded_vertices_are_invisible() {
        // 0-1-2-3 with both endpoints already excluded: the middle edge is a 2-club on its own.
        let c = connectivity(4, &[(0, 1), (1, 2), (2, 3)]);
        let labels = [Excluded, Undecided, Undecided, Excluded];
        assert_eq!(drop_vertex(&c, &labels), None);
    }
}
