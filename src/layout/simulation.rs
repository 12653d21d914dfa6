//! Force simulation core.
//!
//! `Simulation` integrates named forces over a Structure of Arrays body
//! store. It knows nothing about node ids or links: the engine resolves those
//! to slots once per generation and hands slot-based forces in.
//!
//! Each tick:
//! 1. Alpha moves toward its target by `alpha_decay`
//! 2. Every registered force adjusts velocities (or positions)
//! 3. Velocities decay and positions advance; pinned bodies are held at
//!    their pin target with zero velocity
//! 4. Positions are clamped into `[r, width - r] x [r, height - r]`

use super::config::LayoutConfig;
use super::forces::Force;

/// Per-tick values forces may read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    /// Current simulation energy.
    pub alpha: f32,
    /// Viewport width.
    pub width: f32,
    /// Viewport height.
    pub height: f32,
}

impl TickContext {
    /// Center of the viewport.
    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (self.width * 0.5, self.height * 0.5)
    }
}

/// Kinematic state for every body, in SoA layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bodies {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub vx: Vec<f32>,
    pub vy: Vec<f32>,
    /// Pin target X, if pinned
    pub fx: Vec<Option<f32>>,
    /// Pin target Y, if pinned
    pub fy: Vec<Option<f32>>,
}

impl Bodies {
    /// Create `count` bodies at rest at the origin.
    pub fn new(count: usize) -> Self {
        Self {
            x: vec![0.0; count],
            y: vec![0.0; count],
            vx: vec![0.0; count],
            vy: vec![0.0; count],
            fx: vec![None; count],
            fy: vec![None; count],
        }
    }

    /// Number of bodies.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether there are no bodies.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Position of a body.
    pub fn position(&self, slot: usize) -> Option<(f32, f32)> {
        Some((*self.x.get(slot)?, *self.y.get(slot)?))
    }

    /// Whether a body is pinned.
    pub fn is_pinned(&self, slot: usize) -> bool {
        self.fx.get(slot).is_some_and(Option::is_some)
    }

    /// Drop all kinematic state.
    pub fn clear(&mut self) {
        self.x.clear();
        self.y.clear();
        self.vx.clear();
        self.vy.clear();
        self.fx.clear();
        self.fy.clear();
    }
}

/// Minimal capability the layout engine needs from a force simulation.
pub trait ForceSimulation {
    /// Register a force under `name`, replacing any force with that name.
    fn add_force(&mut self, name: &str, force: Box<dyn Force>);

    /// Remove a named force. Returns true if it existed.
    fn remove_force(&mut self, name: &str) -> bool;

    /// Advance one step.
    fn tick(&mut self);

    /// Read access to body state.
    fn nodes(&self) -> &Bodies;

    /// Write access to body state (pinning, nudging).
    fn nodes_mut(&mut self) -> &mut Bodies;

    /// Raise energy to at least `alpha`.
    fn restart(&mut self, alpha: f32);

    /// Current energy.
    fn alpha(&self) -> f32;

    /// Set the energy level alpha decays toward.
    fn set_alpha_target(&mut self, target: f32);

    /// Change the bounds bodies are clamped into.
    fn resize(&mut self, width: f32, height: f32);

    /// Whether energy has decayed below the rest threshold.
    fn is_settled(&self) -> bool;

    /// Release all kinematic state and forces.
    fn clear(&mut self);
}

/// Velocity-Verlet style integrator in the d3-force manner.
pub struct Simulation {
    bodies: Bodies,
    forces: Vec<(String, Box<dyn Force>)>,
    alpha: f32,
    alpha_min: f32,
    alpha_decay: f32,
    alpha_target: f32,
    velocity_decay: f32,
    width: f32,
    height: f32,
    radius: f32,
}

impl Simulation {
    /// Create a simulation with `count` bodies seeded on a phyllotaxis
    /// spiral around the viewport center.
    pub fn new(count: usize, width: f32, height: f32, config: &LayoutConfig) -> Self {
        let mut bodies = Bodies::new(count);
        let (cx, cy) = (width * 0.5, height * 0.5);
        let golden_angle = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
        for i in 0..count {
            let radius = 10.0 * (0.5 + i as f32).sqrt();
            let angle = i as f32 * golden_angle;
            bodies.x[i] = cx + radius * angle.cos();
            bodies.y[i] = cy + radius * angle.sin();
        }

        let mut simulation = Self {
            bodies,
            forces: Vec::new(),
            alpha: 1.0,
            alpha_min: config.alpha_min,
            alpha_decay: config.alpha_decay,
            alpha_target: 0.0,
            velocity_decay: config.velocity_decay,
            width,
            height,
            radius: config.node_radius,
        };
        simulation.clamp_all();
        simulation
    }

    fn clamp_all(&mut self) {
        let (width, height, radius) = (self.width, self.height, self.radius);
        let bodies = &mut self.bodies;
        for i in 0..bodies.len() {
            let x = clamp_axis(bodies.x[i], radius, width);
            if x != bodies.x[i] {
                bodies.x[i] = x;
                bodies.vx[i] = 0.0;
            }
            let y = clamp_axis(bodies.y[i], radius, height);
            if y != bodies.y[i] {
                bodies.y[i] = y;
                bodies.vy[i] = 0.0;
            }
        }
    }
}

impl ForceSimulation for Simulation {
    fn add_force(&mut self, name: &str, force: Box<dyn Force>) {
        if let Some(slot) = self.forces.iter_mut().find(|(existing, _)| existing == name) {
            slot.1 = force;
        } else {
            self.forces.push((name.to_owned(), force));
        }
    }

    fn remove_force(&mut self, name: &str) -> bool {
        let before = self.forces.len();
        self.forces.retain(|(existing, _)| existing != name);
        self.forces.len() != before
    }

    fn tick(&mut self) {
        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;

        let context = TickContext {
            alpha: self.alpha,
            width: self.width,
            height: self.height,
        };
        for (_, force) in &mut self.forces {
            force.apply(&mut self.bodies, &context);
        }

        let keep = 1.0 - self.velocity_decay;
        let bodies = &mut self.bodies;
        for i in 0..bodies.len() {
            match bodies.fx[i] {
                Some(fx) => {
                    bodies.x[i] = fx;
                    bodies.vx[i] = 0.0;
                }
                None => {
                    bodies.vx[i] *= keep;
                    bodies.x[i] += bodies.vx[i];
                }
            }
            match bodies.fy[i] {
                Some(fy) => {
                    bodies.y[i] = fy;
                    bodies.vy[i] = 0.0;
                }
                None => {
                    bodies.vy[i] *= keep;
                    bodies.y[i] += bodies.vy[i];
                }
            }
        }

        self.clamp_all();
    }

    fn nodes(&self) -> &Bodies {
        &self.bodies
    }

    fn nodes_mut(&mut self) -> &mut Bodies {
        &mut self.bodies
    }

    fn restart(&mut self, alpha: f32) {
        self.alpha = self.alpha.max(alpha);
    }

    fn alpha(&self) -> f32 {
        self.alpha
    }

    fn set_alpha_target(&mut self, target: f32) {
        self.alpha_target = target.max(0.0);
    }

    fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        self.clamp_all();
    }

    fn is_settled(&self) -> bool {
        self.alpha < self.alpha_min && self.alpha_target < self.alpha_min
    }

    fn clear(&mut self) {
        self.bodies.clear();
        self.forces.clear();
        self.alpha = 0.0;
        self.alpha_target = 0.0;
    }
}

/// Clamp a coordinate into `[radius, extent - radius]`. A viewport narrower
/// than one node collapses to its midline.
#[inline]
pub fn clamp_axis(value: f32, radius: f32, extent: f32) -> f32 {
    let (low, high) = (radius, extent - radius);
    if low > high {
        return extent * 0.5;
    }
    value.clamp(low, high)
}
