//! Node record.
//!
//! Nodes are the vertices of the knowledge graph. A node carries only its
//! domain fields:
//! - A unique string identifier (unique within one dataset)
//! - A display name (free text, not unique)
//!
//! Kinematic state (position, velocity, pin) never lives on the node. It is
//! owned by the layout engine for one simulation generation and keyed by slot.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Immutable domain record for one graph vertex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    /// Stable identifier, unique within a dataset.
    pub id: String,
    /// Display label.
    #[serde(default)]
    pub name: String,
}

impl Node {
    /// Create a node from an id and a display name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Label to render: the name, or the id when the name is blank.
    pub fn label(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_new() {
        let node = Node::new("n1", "Python");
        assert_eq!(node.id, "n1");
        assert_eq!(node.name, "Python");
        assert_eq!(format!("{}", node), "Node(n1)");
    }

    #[test]
    fn test_label_falls_back_to_id() {
        assert_eq!(Node::new("n1", "").label(), "n1");
        assert_eq!(Node::new("n1", "  ").label(), "n1");
        assert_eq!(Node::new("n1", "Pandas").label(), "Pandas");
    }

    #[test]
    fn test_name_defaults_when_missing() {
        let node: Node = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        assert_eq!(node.id, "x");
        assert!(node.name.is_empty());
    }
}
