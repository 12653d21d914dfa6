//! Subset selection.
//!
//! Reduces a large dataset to a bounded, connected, renderable subset under
//! independent node-count and link-count limits.
//!
//! # Pipeline
//!
//! 1. **Node stage:** if the dataset has more nodes than `max_nodes`, pick
//!    nodes with the configured [`SelectionStrategy`]; otherwise keep all.
//! 2. **Connectivity filter:** keep only links whose endpoints were both
//!    selected, so no dangling link ever reaches the layout engine.
//! 3. **Link stage:** if more than `max_links` links remain, score each as
//!    `degree(source) + degree(target)` over the full dataset and keep the
//!    top `max_links` (stable on dataset order for ties).

mod connected;
mod randomized;

use std::cmp::Reverse;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::graph::{GraphDataset, Link, Node};

/// Default node limit for a freshly loaded dataset.
pub const DEFAULT_MAX_NODES: usize = 50;

/// Default link limit for a freshly loaded dataset.
pub const DEFAULT_MAX_LINKS: usize = 100;

/// Smallest limit the view will apply (when the dataset is at least this big).
pub const LIMIT_FLOOR: usize = 10;

/// Node and link limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Limits {
    pub max_nodes: usize,
    pub max_links: usize,
}

impl Limits {
    /// Create limits without clamping.
    pub fn new(max_nodes: usize, max_links: usize) -> Self {
        Self {
            max_nodes,
            max_links,
        }
    }

    /// Default limits for a dataset: `min(50, nodes)` and `min(100, links)`.
    pub fn default_for(dataset: &GraphDataset) -> Self {
        Self::with_defaults(dataset, DEFAULT_MAX_NODES, DEFAULT_MAX_LINKS)
    }

    /// Default limits with custom caps.
    pub fn with_defaults(dataset: &GraphDataset, max_nodes: usize, max_links: usize) -> Self {
        Self {
            max_nodes: max_nodes.min(dataset.node_count()),
            max_links: max_links.min(dataset.link_count()),
        }
    }

    /// Limits that show the whole dataset.
    pub fn show_all(dataset: &GraphDataset) -> Self {
        Self {
            max_nodes: dataset.node_count(),
            max_links: dataset.link_count(),
        }
    }

    /// Clamp each limit into `[LIMIT_FLOOR, total]`. When the total is below
    /// the floor, the total wins.
    pub fn clamped(self, dataset: &GraphDataset) -> Self {
        Self {
            max_nodes: clamp_limit(self.max_nodes, dataset.node_count()),
            max_links: clamp_limit(self.max_links, dataset.link_count()),
        }
    }
}

fn clamp_limit(value: usize, total: usize) -> usize {
    value.max(LIMIT_FLOOR.min(total)).min(total)
}

/// Node-stage selection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SelectionStrategy {
    /// Breadth-first growth from the highest-degree node, visiting
    /// higher-degree neighbors first. Deterministic.
    #[default]
    Connected,
    /// About 70% uniformly random nodes, the rest grown by degree-biased
    /// breadth-first search from a random chosen node. Deterministic for a
    /// fixed seed.
    Randomized { seed: u64 },
}

/// A derived, disposable view of a dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subset {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

impl Subset {
    /// Ids of the selected nodes.
    pub fn node_ids(&self) -> HashSet<&str> {
        self.nodes.iter().map(|node| node.id.as_str()).collect()
    }

    /// Whether no node was selected.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Derive a subset of `dataset` under `limits` using `strategy`.
pub fn select(dataset: &GraphDataset, limits: Limits, strategy: SelectionStrategy) -> Subset {
    let slots: Vec<usize> = if dataset.node_count() <= limits.max_nodes {
        (0..dataset.node_count()).collect()
    } else {
        match strategy {
            SelectionStrategy::Connected => connected::select_slots(dataset, limits.max_nodes),
            SelectionStrategy::Randomized { seed } => {
                randomized::select_slots(dataset, limits.max_nodes, seed)
            }
        }
    };

    let nodes: Vec<Node> = slots
        .iter()
        .map(|&slot| dataset.nodes()[slot].clone())
        .collect();

    let selected: HashSet<&str> = nodes.iter().map(|node| node.id.as_str()).collect();
    let within = links_within(dataset, &selected);
    let links = trim_links(dataset, within, limits.max_links);

    log::debug!(
        "selected {}/{} nodes, {}/{} links ({:?})",
        nodes.len(),
        dataset.node_count(),
        links.len(),
        dataset.link_count(),
        strategy
    );

    Subset { nodes, links }
}

/// Links whose endpoints are both in `selected`, in dataset order.
fn links_within<'a>(dataset: &'a GraphDataset, selected: &HashSet<&str>) -> Vec<&'a Link> {
    dataset
        .links()
        .iter()
        .filter(|link| {
            selected.contains(link.source.as_str()) && selected.contains(link.target.as_str())
        })
        .collect()
}

/// Keep the `max_links` highest-scoring links. Ties keep dataset order.
fn trim_links(dataset: &GraphDataset, mut links: Vec<&Link>, max_links: usize) -> Vec<Link> {
    if links.len() > max_links {
        // sort_by_key is stable, so equal scores stay in dataset order
        links.sort_by_key(|link| Reverse(dataset.degree(&link.source) + dataset.degree(&link.target)));
        links.truncate(max_links);
    }
    links.into_iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(subset: &Subset) -> Vec<&str> {
        subset.nodes.iter().map(|node| node.id.as_str()).collect()
    }

    fn assert_no_dangling(subset: &Subset) {
        let ids = subset.node_ids();
        for link in &subset.links {
            assert!(ids.contains(link.source.as_str()), "dangling source {}", link);
            assert!(ids.contains(link.target.as_str()), "dangling target {}", link);
        }
    }

    /// Two stars joined by a bridge, plus a few isolated nodes.
    fn two_stars() -> GraphDataset {
        let mut nodes = Vec::new();
        let mut links = Vec::new();
        for i in 0..30 {
            nodes.push(Node::new(format!("n{i}"), format!("Node {i}")));
        }
        for i in 1..10 {
            links.push(Link::new("n0", format!("n{i}"), "star"));
        }
        for i in 11..20 {
            links.push(Link::new("n10", format!("n{i}"), "star"));
        }
        links.push(Link::new("n9", "n10", "bridge"));
        GraphDataset::new(nodes, links)
    }

    #[test]
    fn test_small_dataset_kept_whole() {
        let sample = GraphDataset::bundled_sample();
        let subset = select(&sample, Limits::new(50, 100), SelectionStrategy::Connected);
        assert_eq!(subset.nodes.len(), 7);
        assert_eq!(subset.links.len(), 10);
        assert_eq!(subset.nodes, sample.nodes());
        assert_eq!(subset.links, sample.links());
    }

    #[test]
    fn test_zero_node_limit() {
        let subset = select(&two_stars(), Limits::new(0, 100), SelectionStrategy::Connected);
        assert!(subset.nodes.is_empty());
        assert!(subset.links.is_empty());
    }

    #[test]
    fn test_zero_link_limit() {
        let subset = select(&two_stars(), Limits::new(5, 0), SelectionStrategy::Connected);
        assert_eq!(subset.nodes.len(), 5);
        assert!(subset.links.is_empty());
    }

    #[test]
    fn test_link_trim_prefers_high_degree_endpoints() {
        let dataset = two_stars();
        let subset = select(&dataset, Limits::show_all(&dataset), SelectionStrategy::Connected);
        assert_eq!(subset.links.len(), dataset.link_count());

        let trimmed = select(&dataset, Limits::new(30, 1), SelectionStrategy::Connected);
        assert_eq!(trimmed.links.len(), 1);
        // n9-n10 scores 2 + 10, every other link at most 10 + 1
        assert_eq!(trimmed.links[0].relation, "bridge");
    }

    #[test]
    fn test_link_trim_is_stable_on_ties() {
        let dataset = two_stars();
        let trimmed = select(&dataset, Limits::new(30, 3), SelectionStrategy::Connected);
        // n0-n9 and n10-n11 both score 11; n0-n9 comes first in the dataset
        assert_eq!(trimmed.links[0].relation, "bridge");
        assert_eq!(trimmed.links[1].target, "n9");
        assert_eq!(trimmed.links[2].target, "n11");
    }

    #[test]
    fn test_never_returns_dangling_links() {
        let dataset = two_stars();
        for max_nodes in [1, 3, 10, 15, 25] {
            for strategy in [
                SelectionStrategy::Connected,
                SelectionStrategy::Randomized { seed: 7 },
            ] {
                let subset = select(&dataset, Limits::new(max_nodes, 100), strategy);
                assert!(subset.nodes.len() <= max_nodes);
                assert!(!subset.nodes.is_empty());
                assert_no_dangling(&subset);
            }
        }
    }

    #[test]
    fn test_connected_is_idempotent() {
        let dataset = two_stars();
        let first = select(&dataset, Limits::new(12, 5), SelectionStrategy::Connected);
        let second = select(&dataset, Limits::new(12, 5), SelectionStrategy::Connected);
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(first.links, second.links);
    }

    #[test]
    fn test_randomized_is_idempotent_per_seed() {
        let dataset = two_stars();
        let strategy = SelectionStrategy::Randomized { seed: 42 };
        let first = select(&dataset, Limits::new(12, 100), strategy);
        let second = select(&dataset, Limits::new(12, 100), strategy);
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(first.nodes.len(), 12);
    }

    #[test]
    fn test_limits_defaults_and_clamp() {
        let dataset = two_stars();
        assert_eq!(Limits::default_for(&dataset), Limits::new(30, 19));
        assert_eq!(Limits::show_all(&dataset), Limits::new(30, 19));
        assert_eq!(Limits::new(3, 500).clamped(&dataset), Limits::new(10, 19));

        let sample = GraphDataset::bundled_sample();
        assert_eq!(Limits::new(0, 0).clamped(&sample), Limits::new(7, 10));
        assert_eq!(Limits::new(0, 0).clamped(&GraphDataset::empty()), Limits::new(0, 0));
    }

    #[test]
    fn test_strategy_deserializes_from_tagged_object() {
        let strategy: SelectionStrategy =
            serde_json::from_str(r#"{"kind":"randomized","seed":3}"#).unwrap();
        assert_eq!(strategy, SelectionStrategy::Randomized { seed: 3 });
        let strategy: SelectionStrategy = serde_json::from_str(r#"{"kind":"connected"}"#).unwrap();
        assert_eq!(strategy, SelectionStrategy::Connected);
    }
}
