//! R-tree hit index using the rstar crate.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::layout::TickSnapshot;

/// A drawn node: position plus its slot in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Marker {
    slot: usize,
    x: f32,
    y: f32,
}

impl RTreeObject for Marker {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for Marker {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }
}

/// Nearest-node lookup for pointer events.
#[derive(Default)]
pub struct HitIndex {
    tree: RTree<Marker>,
    ids: Vec<String>,
}

impl HitIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the index contents with the positions in `snapshot`.
    pub fn rebuild(&mut self, snapshot: &TickSnapshot) {
        let markers: Vec<Marker> = snapshot
            .nodes
            .iter()
            .enumerate()
            .map(|(slot, node)| Marker {
                slot,
                x: node.x,
                y: node.y,
            })
            .collect();
        self.ids = snapshot.nodes.iter().map(|node| node.id.clone()).collect();
        self.tree = RTree::bulk_load(markers);
    }

    /// Id of the nearest node within `radius` of `(x, y)`.
    pub fn node_at(&self, x: f32, y: f32, radius: f32) -> Option<&str> {
        let point = [x, y];
        self.tree
            .nearest_neighbor(&point)
            .filter(|marker| marker.distance_2(&point) <= radius * radius)
            .and_then(|marker| self.ids.get(marker.slot))
            .map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.tree = RTree::new();
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::NodePosition;

    fn snapshot(points: &[(&str, f32, f32)]) -> TickSnapshot {
        TickSnapshot {
            generation: 7,
            alpha: 0.1,
            nodes: points
                .iter()
                .map(|&(id, x, y)| NodePosition {
                    id: id.to_owned(),
                    name: id.to_uppercase(),
                    x,
                    y,
                    pinned: false,
                })
                .collect(),
            links: Vec::new(),
        }
    }

    #[test]
    fn test_node_at() {
        let mut index = HitIndex::new();
        index.rebuild(&snapshot(&[("a", 0.0, 0.0), ("b", 100.0, 100.0), ("c", 50.0, 50.0)]));
        assert_eq!(index.len(), 3);

        assert_eq!(index.node_at(3.0, 4.0, 20.0), Some("a"));
        assert_eq!(index.node_at(55.0, 50.0, 20.0), Some("c"));
        // Nearest is 35 away
        assert_eq!(index.node_at(75.0, 75.0, 20.0), None);
    }

    #[test]
    fn test_rebuild_replaces_and_clear() {
        let mut index = HitIndex::new();
        index.rebuild(&snapshot(&[("a", 0.0, 0.0)]));
        index.rebuild(&snapshot(&[("z", 200.0, 200.0)]));
        assert_eq!(index.node_at(0.0, 0.0, 20.0), None);
        assert_eq!(index.node_at(200.0, 200.0, 1.0), Some("z"));

        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.node_at(200.0, 200.0, 1.0), None);
    }
}
