pub mod club;
pub mod drivers;
pub mod drop;
pub mod io;
pub mod search;

use fixedbitset::FixedBitSet;

/// The input graph type: an undirected petgraph graph whose node weights are
/// the external (GraphML) vertex identifiers. Internal vertex indices are the
/// petgraph node indices, assigned in input order.
pub type ClubGraph = petgraph::graph::UnGraph<String, ()>;

/// Membership state of a vertex in a partial solution of the search tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Membership {
    /// The vertex has been removed from the solution.
    Excluded,
    /// No decision about the vertex has been made yet.
    Undecided,
    /// The vertex is committed to the solution.
    Included,
}

impl Membership {
    /// Whether the vertex still takes part in the partial solution.
    pub fn participates(self) -> bool {
        !matches!(self, Membership::Excluded)
    }
}

/// A candidate 2-club emitted by the search: the vertices of one terminal
/// search tree node, as a bitvector over the graph's vertex indices.
///
/// Undecided vertices of a terminal node are members: the branching
/// heuristic only declares a leaf once every surviving pair is within two
/// hops, so the whole surviving set is a 2-club. The candidate list is a
/// superset of the maximal 2-clubs; reducing it to the maximal members is
/// the job of an external filter pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub members: FixedBitSet,
}

impl Candidate {
    /// Build a candidate from the label vector of a terminal node.
    pub fn from_labels(labels: &[Membership]) -> Candidate {
        let mut members = FixedBitSet::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            if label.participates() {
                members.insert(i);
            }
        }
        Candidate { members }
    }

    /// The member vertex indices in ascending order.
    pub fn vertices(&self) -> Vec<usize> {
        self.members.ones().collect()
    }

    /// Number of member vertices.
    pub fn len(&self) -> usize {
        self.members.count_ones(..)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
