//! Subset size relative to the full dataset.

use serde::Serialize;

use crate::graph::GraphDataset;
use crate::selection::Subset;

/// Shown vs. total counts for a status bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsetStats {
    pub shown_nodes: usize,
    pub total_nodes: usize,
    pub shown_links: usize,
    pub total_links: usize,
    /// Share of nodes shown, 0..=100. Zero when the dataset has none.
    pub node_percent: f32,
    /// Share of links shown, 0..=100. Zero when the dataset has none.
    pub link_percent: f32,
}

impl SubsetStats {
    pub fn new(subset: &Subset, dataset: &GraphDataset) -> Self {
        let (shown_nodes, total_nodes) = (subset.nodes.len(), dataset.node_count());
        let (shown_links, total_links) = (subset.links.len(), dataset.link_count());
        Self {
            shown_nodes,
            total_nodes,
            shown_links,
            total_links,
            node_percent: percent(shown_nodes, total_nodes),
            link_percent: percent(shown_links, total_links),
        }
    }
}

fn percent(shown: usize, total: usize) -> f32 {
    if total == 0 {
        return 0.0;
    }
    shown as f32 / total as f32 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::{Limits, SelectionStrategy, select};

    #[test]
    fn test_full_sample() {
        let dataset = GraphDataset::bundled_sample();
        let subset = select(&dataset, Limits::default_for(&dataset), SelectionStrategy::Connected);
        let stats = SubsetStats::new(&subset, &dataset);
        assert_eq!(stats.shown_nodes, 7);
        assert_eq!(stats.total_links, 10);
        assert_eq!(stats.node_percent, 100.0);
        assert_eq!(stats.link_percent, 100.0);
    }

    #[test]
    fn test_partial_and_empty() {
        let dataset = GraphDataset::bundled_sample();
        let subset = select(&dataset, Limits::new(7, 5), SelectionStrategy::Connected);
        let stats = SubsetStats::new(&subset, &dataset);
        assert_eq!(stats.shown_links, 5);
        assert_eq!(stats.link_percent, 50.0);

        let empty = SubsetStats::new(&Subset::default(), &GraphDataset::empty());
        assert_eq!(empty.node_percent, 0.0);
        assert_eq!(empty.link_percent, 0.0);
    }
}
