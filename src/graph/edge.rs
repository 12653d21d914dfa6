//! Link (edge) record.
//!
//! Links connect two nodes by id. Each link has:
//! - Source and target node ids
//! - A free-text relation label drawn at the edge midpoint
//!
//! Links are treated as undirected for degree and traversal purposes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Immutable domain record for one graph edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    /// Id of the source node.
    pub source: String,
    /// Id of the target node.
    pub target: String,
    /// Relation label.
    #[serde(default)]
    pub relation: String,
}

impl Link {
    /// Create a link between two node ids.
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation: relation.into(),
        }
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Link({} -[{}]-> {})", self.source, self.relation, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_display() {
        let link = Link::new("a", "b", "uses");
        assert_eq!(format!("{}", link), "Link(a -[uses]-> b)");
    }

    #[test]
    fn test_relation_defaults_when_missing() {
        let link: Link = serde_json::from_str(r#"{"source":"a","target":"b"}"#).unwrap();
        assert_eq!(link, Link::new("a", "b", ""));
    }
}
