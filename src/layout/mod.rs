//! Force-directed layout.
//!
//! `LayoutEngine` owns one simulation generation at a time and emits a
//! `TickSnapshot` per tick. Underneath, `Simulation` integrates the named
//! forces in [`forces`] over a Structure of Arrays body store, clamped to the
//! viewport every tick.

pub mod config;
pub mod engine;
pub mod forces;
pub mod simulation;
pub mod snapshot;

pub use config::{LayoutConfig, LinkDistance};
pub use engine::{LayoutEngine, SettleCallback, SimulationHandle, TickCallback};
pub use forces::Force;
pub use simulation::{Bodies, ForceSimulation, Simulation, TickContext};
pub use snapshot::{LinkSegment, NodePosition, TickSnapshot};
