//! Reading borough decomposition files.
//!
//! A borough file describes a pre-decomposition of the input graph into weakly connected
//! chunks, as produced by the cycle-based partitioning pre-pass. The file is a JSON array of
//! boroughs, ordered by size (index 0 = largest); each borough is an array of
//! `[source, target]` vertex identifier pairs.

use std::collections::HashMap;
use std::io::Read;

use crate::ClubGraph;

/// One borough: the edge list of a chunk of the input graph, in external vertex identifiers.
pub type Borough = Vec<(String, String)>;

/// Read all boroughs from a borough file.
pub fn read<R: Read>(reader: R) -> Result<Vec<Borough>, String> {
    serde_json::from_reader(reader).map_err(|e| format!("invalid borough file: {}", e))
}

/// Build the subgraph of one borough. Vertices are indexed in order of their first appearance
/// in the edge list; self loops and duplicate edges are dropped.
pub fn to_graph(borough: &[(String, String)]) -> ClubGraph {
    let mut graph = ClubGraph::default();
    let mut indices = HashMap::new();
    for (source, target) in borough.iter() {
        let u = *indices
            .entry(source.clone())
            .or_insert_with(|| graph.add_node(source.clone()));
        let v = *indices
            .entry(target.clone())
            .or_insert_with(|| graph.add_node(target.clone()));
        if u != v && graph.find_edge(u, v).is_none() {
            graph.add_edge(u, v, ());
        }
    }
    graph
}

#[cfg(test)]
mod tests {
    use petgraph::graph::NodeIndex;

    #[test]
    fn test_read_and_select() {
        let data = r#"[
            [["a", "b"], ["b", "c"], ["c", "a"]],
            [["x", "y"]]
        ]"#;
        let boroughs = super::read(data.as_bytes()).unwrap();
        assert_eq!(boroughs.len(), 2);

        let graph = super::to_graph(&boroughs[0]);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
        // First appearance order
        assert_eq!(graph[NodeIndex::new(0)], "a");
        assert_eq!(graph[NodeIndex::new(1)], "b");
        assert_eq!(graph[NodeIndex::new(2)], "c");

        let graph = super::to_graph(&boroughs[1]);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_reject_garbage() {
        assert!(super::read("{}".as_bytes()).is_err());
        assert!(super::read("[[[1, 2]]]".as_bytes()).is_err());
    }
}
