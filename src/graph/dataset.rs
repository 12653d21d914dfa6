//! GraphDataset - the full node/link collection for one view.
//!
//! A dataset is loaded whole and never patched in place: a new chat turn or a
//! new bundled resource replaces it wholesale. On construction it is
//! normalised and indexed once:
//! - Nodes are deduplicated by id (first occurrence wins)
//! - Links are deduplicated by endpoint pair and relation, ignoring direction:
//!   `(b, a, r)` after `(a, b, r)` is dropped (first occurrence wins)
//! - Degrees are counted over every link, as source or target
//! - An undirected petgraph adjacency is built over links whose endpoints
//!   both exist, for traversal by the subset selector

use std::collections::{HashMap, HashSet};

use petgraph::stable_graph::{NodeIndex, StableUnGraph};
use serde::{Deserialize, Serialize};

use super::edge::Link;
use super::node::Node;
use crate::error::DatasetError;

const BUNDLED_SAMPLE: &str = include_str!("sample_graph.json");

/// Wire shape of a dataset as supplied by the host or persisted by the store.
///
/// Both arrays are optional here so a missing one can be reported precisely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDataset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<Node>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Link>>,
}

/// Immutable, indexed node/link collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawDataset", into = "RawDataset")]
pub struct GraphDataset {
    nodes: Vec<Node>,
    links: Vec<Link>,

    /// Degree per node id, counted over all links
    degree_by_id: HashMap<String, usize>,

    /// Undirected adjacency; node weights are slots, edge weights link indices
    adjacency: StableUnGraph<usize, usize>,
}

impl GraphDataset {
    /// Build a dataset from node and link lists, normalising as described in
    /// the module docs.
    pub fn new(nodes: Vec<Node>, links: Vec<Link>) -> Self {
        let mut seen_nodes = HashSet::with_capacity(nodes.len());
        let nodes: Vec<Node> = nodes
            .into_iter()
            .filter(|node| !node.id.is_empty() && seen_nodes.insert(node.id.clone()))
            .collect();

        let mut seen_links = HashSet::with_capacity(links.len());
        let links: Vec<Link> = links
            .into_iter()
            .filter(|link| !link.source.is_empty() && !link.target.is_empty())
            .filter(|link| {
                let (low, high) = if link.source <= link.target {
                    (&link.source, &link.target)
                } else {
                    (&link.target, &link.source)
                };
                seen_links.insert((low.clone(), high.clone(), link.relation.clone()))
            })
            .collect();

        let index_by_id: HashMap<String, usize> = nodes
            .iter()
            .enumerate()
            .map(|(slot, node)| (node.id.clone(), slot))
            .collect();

        let mut degree_by_id: HashMap<String, usize> = HashMap::new();
        for link in &links {
            *degree_by_id.entry(link.source.clone()).or_insert(0) += 1;
            *degree_by_id.entry(link.target.clone()).or_insert(0) += 1;
        }

        let mut adjacency = StableUnGraph::with_capacity(nodes.len(), links.len());
        for slot in 0..nodes.len() {
            adjacency.add_node(slot);
        }
        for (link_index, link) in links.iter().enumerate() {
            if let (Some(&source), Some(&target)) =
                (index_by_id.get(&link.source), index_by_id.get(&link.target))
            {
                adjacency.add_edge(NodeIndex::new(source), NodeIndex::new(target), link_index);
            }
        }

        Self {
            nodes,
            links,
            degree_by_id,
            adjacency,
        }
    }

    /// Create an empty dataset.
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    /// The dataset compiled into the crate (7 nodes, 10 links).
    pub fn bundled_sample() -> Self {
        // The bundled resource is validated by tests; fall back to empty
        // rather than panicking if it is ever edited into a bad shape.
        Self::from_json(BUNDLED_SAMPLE).unwrap_or_else(|error| {
            log::warn!("bundled sample dataset is invalid: {error}");
            Self::empty()
        })
    }

    /// Parse a dataset from JSON text.
    pub fn from_json(text: &str) -> Result<Self, DatasetError> {
        let raw: RawDataset =
            serde_json::from_str(text).map_err(|error| DatasetError::Malformed(error.to_string()))?;
        Self::try_from(raw)
    }

    /// Build a dataset from an already-parsed JSON value, such as a graph
    /// field read off a stored conversation record.
    pub fn from_value(value: serde_json::Value) -> Result<Self, DatasetError> {
        let raw: RawDataset =
            serde_json::from_value(value).map_err(|error| DatasetError::Malformed(error.to_string()))?;
        Self::try_from(raw)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// All nodes in dataset order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All links in dataset order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of links.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Whether the dataset has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of links touching the node id, as source or target.
    pub fn degree(&self, id: &str) -> usize {
        self.degree_by_id.get(id).copied().unwrap_or(0)
    }

    /// Degree of the node at a slot.
    pub fn degree_at(&self, slot: usize) -> usize {
        self.nodes.get(slot).map(|node| self.degree(&node.id)).unwrap_or(0)
    }

    /// Slots adjacent to `slot`, ignoring direction. May contain repeats for
    /// parallel links.
    pub fn neighbor_slots(&self, slot: usize) -> Vec<usize> {
        if slot >= self.nodes.len() {
            return Vec::new();
        }
        self.adjacency
            .neighbors(NodeIndex::new(slot))
            .filter_map(|index| self.adjacency.node_weight(index).copied())
            .collect()
    }
}

impl Default for GraphDataset {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for GraphDataset {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes && self.links == other.links
    }
}

impl TryFrom<RawDataset> for GraphDataset {
    type Error = DatasetError;

    fn try_from(raw: RawDataset) -> Result<Self, Self::Error> {
        let nodes = raw.nodes.ok_or(DatasetError::MissingNodes)?;
        let links = raw.links.ok_or(DatasetError::MissingLinks)?;
        Ok(Self::new(nodes, links))
    }
}

impl From<GraphDataset> for RawDataset {
    fn from(dataset: GraphDataset) -> Self {
        Self {
            nodes: Some(dataset.nodes),
            links: Some(dataset.links),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> GraphDataset {
        GraphDataset::new(
            vec![Node::new("a", "A"), Node::new("b", "B"), Node::new("c", "C")],
            vec![
                Link::new("a", "b", "r"),
                Link::new("b", "c", "r"),
                Link::new("a", "c", "r"),
            ],
        )
    }

    #[test]
    fn test_bundled_sample_shape() {
        let sample = GraphDataset::bundled_sample();
        assert_eq!(sample.node_count(), 7);
        assert_eq!(sample.link_count(), 10);
    }

    #[test]
    fn test_degrees() {
        let dataset = triangle();
        assert_eq!(dataset.degree("a"), 2);
        assert_eq!(dataset.degree("b"), 2);
        assert_eq!(dataset.degree("missing"), 0);
        assert_eq!(dataset.degree_at(2), 2);
    }

    #[test]
    fn test_neighbor_slots() {
        let dataset = triangle();
        let mut neighbors = dataset.neighbor_slots(0);
        neighbors.sort();
        assert_eq!(neighbors, vec![1, 2]);
        assert!(dataset.neighbor_slots(99).is_empty());
    }

    #[test]
    fn test_deduplicates_nodes_and_links() {
        let dataset = GraphDataset::new(
            vec![Node::new("a", "first"), Node::new("a", "second"), Node::new("b", "B")],
            vec![
                Link::new("a", "b", "r"),
                Link::new("a", "b", "r"),
                Link::new("a", "b", "other"),
            ],
        );
        assert_eq!(dataset.node_count(), 2);
        assert_eq!(dataset.nodes()[0].name, "first");
        assert_eq!(dataset.link_count(), 2);
        assert_eq!(dataset.degree("a"), 2);
    }

    #[test]
    fn test_reversed_links_are_duplicates() {
        let dataset = GraphDataset::new(
            vec![Node::new("a", "A"), Node::new("b", "B")],
            vec![
                Link::new("a", "b", "r"),
                Link::new("b", "a", "r"),
                Link::new("b", "a", "other"),
            ],
        );
        assert_eq!(dataset.link_count(), 2);
        assert_eq!(dataset.links()[0], Link::new("a", "b", "r"));
        assert_eq!(dataset.links()[1], Link::new("b", "a", "other"));
        assert_eq!(dataset.degree("a"), 2);
        assert_eq!(dataset.neighbor_slots(0), vec![1, 1]);
    }

    #[test]
    fn test_dangling_links_count_toward_degree_only() {
        let dataset = GraphDataset::new(
            vec![Node::new("a", "A")],
            vec![Link::new("a", "ghost", "r")],
        );
        assert_eq!(dataset.link_count(), 1);
        assert_eq!(dataset.degree("a"), 1);
        assert!(dataset.neighbor_slots(0).is_empty());
    }

    #[test]
    fn test_from_json_missing_arrays() {
        assert_eq!(
            GraphDataset::from_json(r#"{"links": []}"#),
            Err(DatasetError::MissingNodes)
        );
        assert_eq!(
            GraphDataset::from_json(r#"{"nodes": []}"#),
            Err(DatasetError::MissingLinks)
        );
        assert!(matches!(
            GraphDataset::from_json("not json"),
            Err(DatasetError::Malformed(_))
        ));
    }

    #[test]
    fn test_from_value() {
        let value = serde_json::json!({
            "nodes": [{"id": "a", "name": "A"}, {"id": "b"}],
            "links": [{"source": "a", "target": "b", "relation": "knows"}],
        });
        let dataset = GraphDataset::from_value(value).unwrap();
        assert_eq!(dataset.node_count(), 2);
        assert_eq!(dataset.degree("b"), 1);
        assert_eq!(
            GraphDataset::from_value(serde_json::json!({"nodes": []})),
            Err(DatasetError::MissingLinks)
        );
    }

    #[test]
    fn test_json_roundtrip_keeps_content() {
        let dataset = triangle();
        let text = serde_json::to_string(&dataset).unwrap();
        let parsed = GraphDataset::from_json(&text).unwrap();
        assert_eq!(parsed, dataset);
        assert_eq!(parsed.degree("c"), 2);
    }
}
