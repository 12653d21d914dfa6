//! Graph data structures.
//!
//! This module provides the immutable domain layer: `Node` and `Link`
//! records and the indexed `GraphDataset` they are loaded into. Nothing here
//! carries simulation state.

mod dataset;
mod edge;
mod node;

pub use dataset::{GraphDataset, RawDataset};
pub use edge::Link;
pub use node::Node;
