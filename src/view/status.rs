//! User-visible status state machine.

use std::fmt;

use crate::error::ViewError;

/// Where the view is in its initializing → selecting → laying out → settled
/// cycle, or why it is not drawing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Initializing,
    Selecting,
    LayingOut,
    Settled,
    Error(ViewError),
}

impl Status {
    /// Short label for a status indicator.
    pub fn label(&self) -> String {
        match self {
            Status::Initializing => "Initializing".to_owned(),
            Status::Selecting => "Selecting subset".to_owned(),
            Status::LayingOut => "Laying out".to_owned(),
            Status::Settled => "Settled".to_owned(),
            Status::Error(error) => format!("Error: {error}"),
        }
    }

    /// Whether this status blocks drawing.
    pub fn is_error(&self) -> bool {
        matches!(self, Status::Error(_))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
