//! Per-tick output handed to the rendering boundary.
//!
//! A snapshot joins the immutable node/link records with the engine-owned
//! positions for one moment. Renderers read it; they never write positions
//! back except through the pin API.

use serde::Serialize;

/// Position of one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePosition {
    pub id: String,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub pinned: bool,
}

/// Anchors for drawing one link and its relation label.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSegment {
    pub source: String,
    pub target: String,
    #[serde(rename = "sourceXY")]
    pub source_xy: [f32; 2],
    #[serde(rename = "targetXY")]
    pub target_xy: [f32; 2],
    #[serde(rename = "midpointXY")]
    pub midpoint_xy: [f32; 2],
    pub relation: String,
}

impl LinkSegment {
    /// Build a segment, computing the label anchor at the midpoint.
    pub fn new(
        source: &str,
        target: &str,
        source_xy: [f32; 2],
        target_xy: [f32; 2],
        relation: &str,
    ) -> Self {
        Self {
            source: source.to_owned(),
            target: target.to_owned(),
            source_xy,
            target_xy,
            midpoint_xy: [
                (source_xy[0] + target_xy[0]) * 0.5,
                (source_xy[1] + target_xy[1]) * 0.5,
            ],
            relation: relation.to_owned(),
        }
    }
}

/// Everything a renderer needs to draw one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickSnapshot {
    /// Simulation generation that produced this snapshot.
    pub generation: u64,
    pub alpha: f32,
    pub nodes: Vec<NodePosition>,
    pub links: Vec<LinkSegment>,
}

impl TickSnapshot {
    /// Position entry for a node id.
    pub fn node(&self, id: &str) -> Option<&NodePosition> {
        self.nodes.iter().find(|node| node.id == id)
    }
}
