//! Deterministic connectivity-preserving node selection.
//!
//! Seeds with the highest-degree node (first encountered on ties) and grows
//! breadth-first over the undirected adjacency, visiting each frontier node's
//! neighbors in descending degree order. A disconnected dataset may yield
//! fewer than `max_nodes` nodes once the frontier is exhausted.

use std::cmp::Reverse;
use std::collections::VecDeque;

use crate::graph::GraphDataset;

/// Select up to `max_nodes` node slots.
pub(super) fn select_slots(dataset: &GraphDataset, max_nodes: usize) -> Vec<usize> {
    let node_count = dataset.node_count();
    if max_nodes == 0 || node_count == 0 {
        return Vec::new();
    }

    // No links means an empty degree map: sample isolated nodes in order.
    if dataset.link_count() == 0 {
        return (0..node_count.min(max_nodes)).collect();
    }

    let seed = highest_degree_slot(dataset);
    let mut visited = vec![false; node_count];
    let mut selected = Vec::with_capacity(max_nodes.min(node_count));
    let mut frontier = VecDeque::new();

    visited[seed] = true;
    selected.push(seed);
    frontier.push_back(seed);

    while selected.len() < max_nodes {
        let Some(current) = frontier.pop_front() else {
            break;
        };

        for neighbor in neighbors_by_degree(dataset, current) {
            if selected.len() >= max_nodes {
                break;
            }
            if visited[neighbor] {
                continue;
            }
            visited[neighbor] = true;
            selected.push(neighbor);
            frontier.push_back(neighbor);
        }
    }

    selected
}

/// Slot of the node with the highest degree; the earliest slot wins ties.
pub(super) fn highest_degree_slot(dataset: &GraphDataset) -> usize {
    let mut best = 0;
    let mut best_degree = 0;
    for slot in 0..dataset.node_count() {
        let degree = dataset.degree_at(slot);
        if degree > best_degree {
            best = slot;
            best_degree = degree;
        }
    }
    best
}

/// Distinct neighbors of `slot`, highest degree first, then by slot.
fn neighbors_by_degree(dataset: &GraphDataset, slot: usize) -> Vec<usize> {
    let mut neighbors = dataset.neighbor_slots(slot);
    neighbors.sort_unstable();
    neighbors.dedup();
    neighbors.sort_by_key(|&neighbor| Reverse(dataset.degree_at(neighbor)));
    neighbors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Link, Node};

    /// 200 nodes. `n1` links to n2..=n51 (degree 50). n2..=n10 each get one
    /// extra link to n100..=n108 so they have degree 2; the rest have degree 1
    /// or 0.
    fn hub_dataset() -> GraphDataset {
        let nodes = (1..=200)
            .map(|i| Node::new(format!("n{i}"), format!("Node {i}")))
            .collect();
        let mut links = Vec::new();
        for i in 2..=51 {
            links.push(Link::new("n1", format!("n{i}"), "hub"));
        }
        for i in 2..=10 {
            links.push(Link::new(format!("n{i}"), format!("n{}", i + 98), "side"));
        }
        GraphDataset::new(nodes, links)
    }

    #[test]
    fn test_hub_first_then_high_degree_neighbors() {
        let dataset = hub_dataset();
        assert_eq!(dataset.degree("n1"), 50);

        let slots = select_slots(&dataset, 10);
        assert_eq!(slots.len(), 10);

        let ids: Vec<&str> = slots
            .iter()
            .map(|&slot| dataset.nodes()[slot].id.as_str())
            .collect();
        assert_eq!(ids[0], "n1");
        for id in &ids[1..] {
            assert_eq!(dataset.degree(id), 2, "{id} should be a degree-2 neighbor");
        }
    }

    #[test]
    fn test_seed_tie_breaks_on_first() {
        let dataset = GraphDataset::new(
            vec![Node::new("a", ""), Node::new("b", ""), Node::new("c", "")],
            vec![Link::new("b", "c", "r")],
        );
        // b and c both have degree 1; b comes first
        assert_eq!(highest_degree_slot(&dataset), 1);
    }

    #[test]
    fn test_disconnected_stops_at_frontier() {
        let dataset = GraphDataset::new(
            vec![
                Node::new("a", ""),
                Node::new("b", ""),
                Node::new("c", ""),
                Node::new("d", ""),
            ],
            vec![Link::new("a", "b", "r"), Link::new("a", "b", "again")],
        );
        let slots = select_slots(&dataset, 3);
        assert_eq!(slots, vec![0, 1]);
    }

    #[test]
    fn test_zero_links_samples_in_order() {
        let nodes = (0..20).map(|i| Node::new(format!("n{i}"), "")).collect();
        let dataset = GraphDataset::new(nodes, Vec::new());
        assert_eq!(select_slots(&dataset, 4), vec![0, 1, 2, 3]);
    }
}
