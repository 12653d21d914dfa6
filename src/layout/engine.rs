//! LayoutEngine - generation-scoped force layout.
//!
//! The engine owns at most one simulation generation at a time. Starting a
//! new generation always stops the previous one first, and a generation's
//! callbacks live inside it, so ticks from two generations can never
//! interleave and nothing fires after `stop`.
//!
//! The host drives time: `tick(now_ms)` is called from the display refresh
//! callback. Re-agitation is evaluated against that clock, which means
//! stopping a generation cancels its agitation timer along with its ticks.

use std::collections::HashMap;
use std::fmt;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::config::LayoutConfig;
use super::forces::{Axis, AxisForce, CenterForce, CollideForce, JitterForce, LinkForce, ManyBodyForce};
use super::simulation::{ForceSimulation, Simulation, clamp_axis};
use super::snapshot::{LinkSegment, NodePosition, TickSnapshot};
use crate::error::LayoutError;
use crate::graph::{Link, Node};

/// Identifies one simulation generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimulationHandle(u64);

impl SimulationHandle {
    /// Get the raw generation number.
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SimulationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Generation({})", self.0)
    }
}

/// Called with every emitted snapshot.
pub type TickCallback = Box<dyn FnMut(&TickSnapshot)>;

/// Called each time a generation's energy decays below the rest threshold.
pub type SettleCallback = Box<dyn FnMut(SimulationHandle)>;

/// One simulation run over one subset.
struct Generation {
    handle: SimulationHandle,
    nodes: Vec<Node>,
    links: Vec<(usize, usize, String)>,
    slot_by_id: HashMap<String, usize>,
    simulation: Box<dyn ForceSimulation>,
    width: f32,
    height: f32,
    tick_callbacks: Vec<TickCallback>,
    settle_callbacks: Vec<SettleCallback>,
    settled_at_ms: Option<f64>,
    rng: SmallRng,
}

impl Generation {
    fn snapshot(&self) -> TickSnapshot {
        let bodies = self.simulation.nodes();
        let nodes = self
            .nodes
            .iter()
            .enumerate()
            .map(|(slot, node)| NodePosition {
                id: node.id.clone(),
                name: node.label().to_owned(),
                x: bodies.x[slot],
                y: bodies.y[slot],
                pinned: bodies.is_pinned(slot),
            })
            .collect();

        let links = self
            .links
            .iter()
            .map(|(source, target, relation)| {
                LinkSegment::new(
                    &self.nodes[*source].id,
                    &self.nodes[*target].id,
                    [bodies.x[*source], bodies.y[*source]],
                    [bodies.x[*target], bodies.y[*target]],
                    relation,
                )
            })
            .collect();

        TickSnapshot {
            generation: self.handle.raw(),
            alpha: self.simulation.alpha(),
            nodes,
            links,
        }
    }

    fn slot(&self, id: &str) -> Result<usize, LayoutError> {
        self.slot_by_id
            .get(id)
            .copied()
            .ok_or_else(|| LayoutError::UnknownNode(id.to_owned()))
    }

    fn agitation_due(&self, now_ms: f64, interval_ms: Option<f64>) -> bool {
        match (interval_ms, self.settled_at_ms) {
            (Some(interval), Some(since)) => now_ms - since >= interval,
            _ => false,
        }
    }

    fn agitate(&mut self, velocity: f32, alpha: f32) {
        let bodies = self.simulation.nodes_mut();
        for i in 0..bodies.len() {
            if bodies.is_pinned(i) {
                continue;
            }
            bodies.vx[i] += self.rng.gen_range(-1.0_f32..=1.0) * velocity;
            bodies.vy[i] += self.rng.gen_range(-1.0_f32..=1.0) * velocity;
        }
        self.simulation.restart(alpha);
        self.settled_at_ms = None;
    }

    /// Release kinematic state; no callback survives this.
    fn teardown(&mut self) {
        self.tick_callbacks.clear();
        self.settle_callbacks.clear();
        self.simulation.clear();
    }
}

/// Runs one force layout generation at a time.
pub struct LayoutEngine {
    config: LayoutConfig,
    next_generation: u64,
    current: Option<Generation>,
}

impl LayoutEngine {
    /// Create an idle engine.
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            next_generation: 1,
            current: None,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Handle of the running generation, if any.
    pub fn current(&self) -> Option<SimulationHandle> {
        self.current.as_ref().map(|generation| generation.handle)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Stop any running generation and start a new one over `nodes`/`links`.
    ///
    /// Link endpoints are resolved to slots here; links naming an absent node
    /// are dropped.
    pub fn start(
        &mut self,
        nodes: &[Node],
        links: &[Link],
        width: f32,
        height: f32,
    ) -> Result<SimulationHandle, LayoutError> {
        self.stop_current();

        if nodes.is_empty() {
            log::warn!("layout requested for an empty selection");
            return Err(LayoutError::EmptySelection);
        }

        let handle = SimulationHandle(self.next_generation);
        self.next_generation += 1;

        let slot_by_id: HashMap<String, usize> = nodes
            .iter()
            .enumerate()
            .map(|(slot, node)| (node.id.clone(), slot))
            .collect();

        let resolved: Vec<(usize, usize, String)> = links
            .iter()
            .filter_map(|link| {
                let source = *slot_by_id.get(&link.source)?;
                let target = *slot_by_id.get(&link.target)?;
                Some((source, target, link.relation.clone()))
            })
            .collect();
        if resolved.len() != links.len() {
            log::debug!("dropped {} unresolved links", links.len() - resolved.len());
        }

        let seed = self.config.seed ^ handle.raw().wrapping_mul(0x9e37_79b9_7f4a_7c15);
        let simulation = self.build_simulation(nodes.len(), &resolved, width, height, seed);

        log::info!(
            "{handle}: laying out {} nodes, {} links in {width}x{height}",
            nodes.len(),
            resolved.len()
        );

        self.current = Some(Generation {
            handle,
            nodes: nodes.to_vec(),
            links: resolved,
            slot_by_id,
            simulation,
            width,
            height,
            tick_callbacks: Vec::new(),
            settle_callbacks: Vec::new(),
            settled_at_ms: None,
            rng: SmallRng::seed_from_u64(seed.rotate_left(17)),
        });
        Ok(handle)
    }

    fn build_simulation(
        &self,
        count: usize,
        links: &[(usize, usize, String)],
        width: f32,
        height: f32,
        seed: u64,
    ) -> Box<dyn ForceSimulation> {
        let config = &self.config;
        let pairs: Vec<(usize, usize)> = links.iter().map(|(s, t, _)| (*s, *t)).collect();

        let mut simulation = Simulation::new(count, width, height, config);
        simulation.add_force(
            "link",
            Box::new(LinkForce::new(&pairs, count, config.link_distance, config.link_strength, seed)),
        );
        simulation.add_force("charge", Box::new(ManyBodyForce::new(config.charge)));
        simulation.add_force("center", Box::new(CenterForce::new(config.center_strength)));
        simulation.add_force("x", Box::new(AxisForce::new(Axis::X, config.axis_strength)));
        simulation.add_force("y", Box::new(AxisForce::new(Axis::Y, config.axis_strength)));
        simulation.add_force(
            "collide",
            Box::new(CollideForce::new(config.collide_radius, config.collide_strength)),
        );
        if let Some(strength) = config.jitter {
            simulation.add_force("jitter", Box::new(JitterForce::new(strength, seed.wrapping_add(1))));
        }
        Box::new(simulation)
    }

    /// Stop a generation. Returns false if `handle` is not the running one.
    pub fn stop(&mut self, handle: SimulationHandle) -> bool {
        if self.current() != Some(handle) {
            return false;
        }
        self.stop_current();
        true
    }

    /// Stop whatever is running.
    pub fn stop_current(&mut self) {
        if let Some(mut generation) = self.current.take() {
            generation.teardown();
            log::debug!("{}: stopped", generation.handle);
        }
    }

    fn active_mut(&mut self, handle: SimulationHandle) -> Result<&mut Generation, LayoutError> {
        match self.current.as_mut() {
            Some(generation) if generation.handle == handle => Ok(generation),
            _ => Err(LayoutError::StaleHandle(handle.raw())),
        }
    }

    fn active(&self, handle: SimulationHandle) -> Result<&Generation, LayoutError> {
        match self.current.as_ref() {
            Some(generation) if generation.handle == handle => Ok(generation),
            _ => Err(LayoutError::StaleHandle(handle.raw())),
        }
    }

    // =========================================================================
    // Callbacks
    // =========================================================================

    /// Register a callback for every tick of `handle`.
    pub fn on_tick(&mut self, handle: SimulationHandle, callback: TickCallback) -> Result<(), LayoutError> {
        self.active_mut(handle)?.tick_callbacks.push(callback);
        Ok(())
    }

    /// Register a callback for each time `handle` settles.
    pub fn on_settle(
        &mut self,
        handle: SimulationHandle,
        callback: SettleCallback,
    ) -> Result<(), LayoutError> {
        self.active_mut(handle)?.settle_callbacks.push(callback);
        Ok(())
    }

    // =========================================================================
    // Pinning and energy
    // =========================================================================

    /// Hold a node at `(x, y)` (clamped to bounds) until unpinned.
    pub fn pin(&mut self, handle: SimulationHandle, id: &str, x: f32, y: f32) -> Result<(), LayoutError> {
        let radius = self.config.node_radius;
        let generation = self.active_mut(handle)?;
        let slot = generation.slot(id)?;
        let (x, y) = (
            clamp_axis(x, radius, generation.width),
            clamp_axis(y, radius, generation.height),
        );
        let bodies = generation.simulation.nodes_mut();
        bodies.fx[slot] = Some(x);
        bodies.fy[slot] = Some(y);
        bodies.x[slot] = x;
        bodies.y[slot] = y;
        bodies.vx[slot] = 0.0;
        bodies.vy[slot] = 0.0;
        Ok(())
    }

    /// Release a pinned node and briefly raise energy so it settles.
    pub fn unpin(&mut self, handle: SimulationHandle, id: &str) -> Result<(), LayoutError> {
        let release_alpha = self.config.release_alpha;
        let generation = self.active_mut(handle)?;
        let slot = generation.slot(id)?;
        let bodies = generation.simulation.nodes_mut();
        bodies.fx[slot] = None;
        bodies.fy[slot] = None;
        generation.simulation.restart(release_alpha);
        generation.settled_at_ms = None;
        Ok(())
    }

    /// Set the energy level alpha decays toward.
    pub fn set_alpha_target(&mut self, handle: SimulationHandle, target: f32) -> Result<(), LayoutError> {
        let generation = self.active_mut(handle)?;
        generation.simulation.set_alpha_target(target);
        generation.settled_at_ms = None;
        Ok(())
    }

    /// Raise energy to at least `alpha`.
    pub fn reheat(&mut self, handle: SimulationHandle, alpha: f32) -> Result<(), LayoutError> {
        let generation = self.active_mut(handle)?;
        generation.simulation.restart(alpha);
        generation.settled_at_ms = None;
        Ok(())
    }

    /// Cheap re-layout for a viewport change: new bounds and center, same
    /// nodes, energy raised.
    pub fn resize(&mut self, handle: SimulationHandle, width: f32, height: f32) -> Result<(), LayoutError> {
        let resize_alpha = self.config.resize_alpha;
        let generation = self.active_mut(handle)?;
        generation.width = width;
        generation.height = height;
        generation.simulation.resize(width, height);
        generation.simulation.restart(resize_alpha);
        generation.settled_at_ms = None;
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether `handle` is running and at rest.
    pub fn is_settled(&self, handle: SimulationHandle) -> bool {
        self.active(handle)
            .map(|generation| generation.simulation.is_settled())
            .unwrap_or(false)
    }

    /// Current energy of `handle`.
    pub fn alpha(&self, handle: SimulationHandle) -> Option<f32> {
        self.active(handle).ok().map(|generation| generation.simulation.alpha())
    }

    /// Current position of a node.
    pub fn position_of(&self, handle: SimulationHandle, id: &str) -> Result<(f32, f32), LayoutError> {
        let generation = self.active(handle)?;
        let slot = generation.slot(id)?;
        generation
            .simulation
            .nodes()
            .position(slot)
            .ok_or_else(|| LayoutError::UnknownNode(id.to_owned()))
    }

    /// Snapshot of the running generation without advancing it.
    pub fn snapshot(&self) -> Option<TickSnapshot> {
        self.current.as_ref().map(Generation::snapshot)
    }

    // =========================================================================
    // Scheduling
    // =========================================================================

    /// Advance the running generation by one tick at host time `now_ms`.
    ///
    /// A settled generation does not tick until it is reheated, pinned, or its
    /// re-agitation interval elapses. Returns true if a tick was emitted.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        let interval = self.config.agitation_interval_ms;
        let (velocity, alpha) = (self.config.agitation_velocity, self.config.agitation_alpha);
        let Some(generation) = self.current.as_mut() else {
            return false;
        };

        if generation.simulation.is_settled() {
            if !generation.agitation_due(now_ms, interval) {
                return false;
            }
            log::debug!("{}: re-agitating after idle", generation.handle);
            generation.agitate(velocity, alpha);
        }

        generation.simulation.tick();
        let snapshot = generation.snapshot();
        for callback in &mut generation.tick_callbacks {
            callback(&snapshot);
        }

        if generation.simulation.is_settled() {
            generation.settled_at_ms = Some(now_ms);
            let handle = generation.handle;
            log::debug!("{handle}: settled");
            for callback in &mut generation.settle_callbacks {
                callback(handle);
            }
        }
        true
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}
