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

//! Reading graphs from GraphML files.

use std::collections::HashMap;
use std::io::Read;

use xmltree::Element;

use crate::ClubGraph;

/// Read an undirected graph from a GraphML document.
///
/// Vertex identifiers are kept as opaque strings in the node weights; internal indices follow
/// the order of the `<node>` elements. The `edgedefault` attribute and all `<data>` annotations
/// are ignored, every edge is treated as undirected. Self loops and duplicate edges are dropped.
pub fn read<R: Read>(reader: R) -> Result<ClubGraph, String> {
    let root = Element::parse(reader).map_err(|e| format!("invalid XML: {}", e))?;
    if root.name != "graphml" {
        return Err(format!(
            "expected a <graphml> document, found <{}>",
            root.name
        ));
    }
    let graph_element = root
        .get_child("graph")
        .ok_or_else(|| String::from("missing <graph> element"))?;

    let mut graph = ClubGraph::default();
    let mut indices = HashMap::new();
    for node in graph_element
        .children
        .iter()
        .filter_map(|c| c.as_element())
        .filter(|e| e.name == "node")
    {
        let id = node
            .attributes
            .get("id")
            .ok_or_else(|| String::from("<node> element without id attribute"))?;
        if indices.contains_key(id) {
            return Err(format!("duplicate node id {:?}", id));
        }
        indices.insert(id.clone(), graph.add_node(id.clone()));
    }

    for edge in graph_element
        .children
        .iter()
        .filter_map(|c| c.as_element())
        .filter(|e| e.name == "edge")
    {
        let source = edge
            .attributes
            .get("source")
            .ok_or_else(|| String::from("<edge> element without source attribute"))?;
        let target = edge
            .attributes
            .get("target")
            .ok_or_else(|| String::from("<edge> element without target attribute"))?;
        let u = *indices
            .get(source)
            .ok_or_else(|| format!("edge references unknown node {:?}", source))?;
        let v = *indices
            .get(target)
            .ok_or_else(|| format!("edge references unknown node {:?}", target))?;
        if u != v && graph.find_edge(u, v).is_none() {
            graph.add_edge(u, v, ());
        }
    }

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use petgraph::graph::NodeIndex;

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<graphml xmlns="http://graphml.graphdrawing.org/xmlns">
  <graph id="G" edgedefault="undirected">
    <node id="n0"/>
    <node id="n1"/>
    <node id="n2"/>
    <edge source="n0" target="n1"/>
    <edge source="n1" target="n2"/>
    <edge source="n2" target="n1"/>
    <edge source="n2" target="n2"/>
  </graph>
</graphml>"#;

    #[test]
    fn test_read_graphml() {
        let graph = super::read(DOCUMENT.as_bytes()).unwrap();
        assert_eq!(graph.node_count(), 3);
        // Duplicate edge and self loop are dropped
        assert_eq!(graph.edge_count(), 2);
        // Indices follow document order
        assert_eq!(graph[NodeIndex::new(0)], "n0");
        assert_eq!(graph[NodeIndex::new(1)], "n1");
        assert_eq!(graph[NodeIndex::new(2)], "n2");
        assert!(graph.find_edge(NodeIndex::new(0), NodeIndex::new(1)).is_some());
        assert!(graph.find_edge(NodeIndex::new(1), NodeIndex::new(2)).is_some());
        assert!(graph.find_edge(NodeIndex::new(0), NodeIndex::new(2)).is_none());
    }

    #[test]
    fn test_reject_garbage() {
        assert!(super::read("not even xml".as_bytes()).is_err());
        assert!(super::read("<something/>".as_bytes()).is_err());
        assert!(super::read("<graphml></graphml>".as_bytes()).is_err());
        let dangling = r#"<graphml><graph><node id="a"/><edge source="a" target="b"/></graph></graphml>"#;
        assert!(super::read(dangling.as_bytes()).is_err());
    }
}
