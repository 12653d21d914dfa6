//! Pointer hit testing over laid-out nodes.
//!
//! The index is rebuilt from each snapshot the host actually draws, so a hit
//! always refers to what is on screen.

mod hit_index;

pub use hit_index::HitIndex;
