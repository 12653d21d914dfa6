//! Error types.
//!
//! Every failure in the core is recoverable: the view turns these into a
//! status label and skips the draw rather than propagating them to the host.

use thiserror::Error;

/// Failures while ingesting a dataset.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DatasetError {
    #[error("dataset has no `nodes` array")]
    MissingNodes,

    #[error("dataset has no `links` array")]
    MissingLinks,

    #[error("malformed dataset: {0}")]
    Malformed(String),
}

/// Failures raised by the layout engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("no nodes to lay out")]
    EmptySelection,

    #[error("simulation handle {0} is no longer active")]
    StaleHandle(u64),

    #[error("node not found in active simulation: {0}")]
    UnknownNode(String),
}

/// Failures surfaced by the viewport binding as a status label.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ViewError {
    #[error("invalid dataset: {0}")]
    InvalidDataset(#[from] DatasetError),

    #[error("selection is empty")]
    EmptySelection,

    #[error("rendering surface is not available yet")]
    MissingContainer,
}

impl From<LayoutError> for ViewError {
    fn from(error: LayoutError) -> Self {
        match error {
            LayoutError::EmptySelection => ViewError::EmptySelection,
            other => ViewError::InvalidDataset(DatasetError::Malformed(other.to_string())),
        }
    }
}

/// Failures while persisting the conversation store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("conversation not found: {0}")]
    NotFound(String),

    #[error("conversation graph rejected: {0}")]
    InvalidGraph(#[from] DatasetError),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
