//! Drag-to-pin interaction.
//!
//! Pointer gestures map onto simulation pin state:
//! - start pins the node where it is and holds energy up
//! - move retargets the pin to the pointer
//! - end unpins and lets energy decay
//!
//! No other gestures are handled here; panning and zooming belong to the
//! renderer.

use crate::error::LayoutError;
use crate::layout::{LayoutEngine, SimulationHandle, TickSnapshot};
use crate::spatial::HitIndex;

/// Node currently being dragged, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DragState {
    pub node_id: Option<String>,
}

impl DragState {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.node_id.is_some()
    }
}

/// Translates drag phases into pin/unpin calls on the layout engine.
#[derive(Default)]
pub struct InteractionController {
    drag: DragState,
    hits: HitIndex,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current drag state.
    pub fn drag(&self) -> &DragState {
        &self.drag
    }

    /// Feed the snapshot being drawn so pointer hits match the screen.
    pub fn observe(&mut self, snapshot: &TickSnapshot) {
        self.hits.rebuild(snapshot);
    }

    /// Node under the pointer, within one node radius.
    pub fn node_at(&self, x: f32, y: f32, radius: f32) -> Option<String> {
        self.hits.node_at(x, y, radius).map(str::to_owned)
    }

    /// Pin `id` at its current position and hold energy at the drag target.
    pub fn drag_start(
        &mut self,
        engine: &mut LayoutEngine,
        handle: SimulationHandle,
        id: &str,
    ) -> Result<(), LayoutError> {
        let (x, y) = engine.position_of(handle, id)?;
        engine.pin(handle, id, x, y)?;
        let target = engine.config().drag_alpha_target;
        engine.set_alpha_target(handle, target)?;
        engine.reheat(handle, target)?;

        self.drag = DragState {
            node_id: Some(id.to_owned()),
        };
        log::debug!("drag start: {id} at ({x}, {y})");
        Ok(())
    }

    /// Move the pin target of `id` to the pointer.
    pub fn drag_move(
        &mut self,
        engine: &mut LayoutEngine,
        handle: SimulationHandle,
        id: &str,
        x: f32,
        y: f32,
    ) -> Result<(), LayoutError> {
        if self.drag.node_id.as_deref() != Some(id) {
            // Move without a start, e.g. the host missed the down event
            self.drag_start(engine, handle, id)?;
        }
        engine.pin(handle, id, x, y)
    }

    /// Release `id` and let energy decay.
    pub fn drag_end(
        &mut self,
        engine: &mut LayoutEngine,
        handle: SimulationHandle,
        id: &str,
    ) -> Result<(), LayoutError> {
        self.drag = DragState::default();
        engine.set_alpha_target(handle, 0.0)?;
        engine.unpin(handle, id)?;
        log::debug!("drag end: {id}");
        Ok(())
    }

    /// Start a drag on whatever node is under `(x, y)`. Returns its id.
    pub fn pointer_down(
        &mut self,
        engine: &mut LayoutEngine,
        handle: SimulationHandle,
        x: f32,
        y: f32,
    ) -> Result<Option<String>, LayoutError> {
        let radius = engine.config().node_radius;
        let Some(id) = self.node_at(x, y, radius) else {
            return Ok(None);
        };
        self.drag_start(engine, handle, &id)?;
        Ok(Some(id))
    }

    /// Forget any drag and indexed positions, e.g. when a generation ends.
    pub fn reset(&mut self) {
        self.drag = DragState::default();
        self.hits.clear();
    }
}
