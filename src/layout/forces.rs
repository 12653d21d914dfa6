//! Forces.
//!
//! Every force adjusts body velocities (the center force shifts positions)
//! from the current state and alpha. All pairwise passes are naive O(n²);
//! subsets are bounded by the node limit.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::config::LinkDistance;
use super::simulation::{Bodies, TickContext};

/// A force applied once per tick.
pub trait Force {
    fn apply(&mut self, bodies: &mut Bodies, context: &TickContext);
}

impl<F> Force for F
where
    F: FnMut(&mut Bodies, &TickContext),
{
    fn apply(&mut self, bodies: &mut Bodies, context: &TickContext) {
        self(bodies, context)
    }
}

/// Tiny deterministic offset for coincident points, so a direction exists.
#[inline]
fn jiggle(a: usize, b: usize) -> f32 {
    let phase = (a as f32) * 0.618_034 + (b as f32) * 0.414_214;
    (phase.fract() - 0.5) * 1e-6
}

// =============================================================================
// Link
// =============================================================================

/// Spring between linked bodies toward a per-link rest length.
pub struct LinkForce {
    links: Vec<(usize, usize)>,
    distances: Vec<f32>,
    strengths: Vec<f32>,
    biases: Vec<f32>,
}

impl LinkForce {
    /// Build from slot pairs. Self-loops and out-of-range slots are dropped.
    pub fn new(
        links: &[(usize, usize)],
        body_count: usize,
        distance: LinkDistance,
        strength: Option<f32>,
        seed: u64,
    ) -> Self {
        let links: Vec<(usize, usize)> = links
            .iter()
            .copied()
            .filter(|&(source, target)| {
                source != target && source < body_count && target < body_count
            })
            .collect();

        let mut count = vec![0usize; body_count];
        for &(source, target) in &links {
            count[source] += 1;
            count[target] += 1;
        }

        let mut rng = SmallRng::seed_from_u64(seed);
        let distances = links
            .iter()
            .map(|_| match distance {
                LinkDistance::Fixed { distance } => distance,
                LinkDistance::Range { min, max } if max > min => rng.gen_range(min..=max),
                LinkDistance::Range { min, .. } => min,
            })
            .collect();

        let strengths = links
            .iter()
            .map(|&(source, target)| {
                strength.unwrap_or_else(|| 1.0 / count[source].min(count[target]) as f32)
            })
            .collect();

        let biases = links
            .iter()
            .map(|&(source, target)| {
                count[source] as f32 / (count[source] + count[target]) as f32
            })
            .collect();

        Self {
            links,
            distances,
            strengths,
            biases,
        }
    }

    /// Rest lengths, one per retained link.
    pub fn distances(&self) -> &[f32] {
        &self.distances
    }
}

impl Force for LinkForce {
    fn apply(&mut self, bodies: &mut Bodies, context: &TickContext) {
        for (i, &(source, target)) in self.links.iter().enumerate() {
            let mut dx = bodies.x[target] + bodies.vx[target] - bodies.x[source] - bodies.vx[source];
            let mut dy = bodies.y[target] + bodies.vy[target] - bodies.y[source] - bodies.vy[source];
            if dx == 0.0 {
                dx = jiggle(source, target);
            }
            if dy == 0.0 {
                dy = jiggle(target, source);
            }
            let length = (dx * dx + dy * dy).sqrt();
            let scale = (length - self.distances[i]) / length * context.alpha * self.strengths[i];
            dx *= scale;
            dy *= scale;

            let bias = self.biases[i];
            bodies.vx[target] -= dx * bias;
            bodies.vy[target] -= dy * bias;
            bodies.vx[source] += dx * (1.0 - bias);
            bodies.vy[source] += dy * (1.0 - bias);
        }
    }
}

// =============================================================================
// Many-body
// =============================================================================

/// Pairwise charge; negative strength repels, falling off with distance.
pub struct ManyBodyForce {
    strength: f32,
    distance_min_sq: f32,
}

impl ManyBodyForce {
    pub fn new(strength: f32) -> Self {
        Self {
            strength,
            distance_min_sq: 1.0,
        }
    }
}

impl Force for ManyBodyForce {
    fn apply(&mut self, bodies: &mut Bodies, context: &TickContext) {
        let count = bodies.len();
        for i in 0..count {
            for j in (i + 1)..count {
                let mut dx = bodies.x[j] - bodies.x[i];
                let mut dy = bodies.y[j] - bodies.y[i];
                if dx == 0.0 {
                    dx = jiggle(i, j);
                }
                if dy == 0.0 {
                    dy = jiggle(j, i);
                }
                let mut distance_sq = dx * dx + dy * dy;
                if distance_sq < self.distance_min_sq {
                    distance_sq = (self.distance_min_sq * distance_sq).sqrt();
                }
                let weight = self.strength * context.alpha / distance_sq;
                bodies.vx[i] += dx * weight;
                bodies.vy[i] += dy * weight;
                bodies.vx[j] -= dx * weight;
                bodies.vy[j] -= dy * weight;
            }
        }
    }
}

// =============================================================================
// Centering
// =============================================================================

/// Shifts the whole system so its mean position sits at the viewport center.
pub struct CenterForce {
    strength: f32,
}

impl CenterForce {
    pub fn new(strength: f32) -> Self {
        Self { strength }
    }
}

impl Force for CenterForce {
    fn apply(&mut self, bodies: &mut Bodies, context: &TickContext) {
        let count = bodies.len();
        if count == 0 {
            return;
        }
        let (cx, cy) = context.center();
        let mean_x = bodies.x.iter().sum::<f32>() / count as f32;
        let mean_y = bodies.y.iter().sum::<f32>() / count as f32;
        let shift_x = (mean_x - cx) * self.strength;
        let shift_y = (mean_y - cy) * self.strength;
        for i in 0..count {
            bodies.x[i] -= shift_x;
            bodies.y[i] -= shift_y;
        }
    }
}

/// Which axis an [`AxisForce`] pulls along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Weak independent pull toward the viewport center on one axis.
pub struct AxisForce {
    axis: Axis,
    strength: f32,
}

impl AxisForce {
    pub fn new(axis: Axis, strength: f32) -> Self {
        Self { axis, strength }
    }
}

impl Force for AxisForce {
    fn apply(&mut self, bodies: &mut Bodies, context: &TickContext) {
        let (cx, cy) = context.center();
        let k = self.strength * context.alpha;
        match self.axis {
            Axis::X => {
                for i in 0..bodies.len() {
                    bodies.vx[i] += (cx - bodies.x[i]) * k;
                }
            }
            Axis::Y => {
                for i in 0..bodies.len() {
                    bodies.vy[i] += (cy - bodies.y[i]) * k;
                }
            }
        }
    }
}

// =============================================================================
// Collision
// =============================================================================

/// Pushes apart bodies whose predicted positions are closer than two radii.
pub struct CollideForce {
    radius: f32,
    strength: f32,
}

impl CollideForce {
    pub fn new(radius: f32, strength: f32) -> Self {
        Self {
            radius,
            strength: strength.clamp(0.0, 1.0),
        }
    }
}

impl Force for CollideForce {
    fn apply(&mut self, bodies: &mut Bodies, _context: &TickContext) {
        let count = bodies.len();
        let min_distance = self.radius * 2.0;
        let min_distance_sq = min_distance * min_distance;
        for i in 0..count {
            for j in (i + 1)..count {
                let mut dx = bodies.x[i] + bodies.vx[i] - bodies.x[j] - bodies.vx[j];
                let mut dy = bodies.y[i] + bodies.vy[i] - bodies.y[j] - bodies.vy[j];
                let distance_sq = dx * dx + dy * dy;
                if distance_sq >= min_distance_sq {
                    continue;
                }
                if dx == 0.0 {
                    dx = jiggle(i, j);
                }
                if dy == 0.0 {
                    dy = jiggle(j, i);
                }
                let distance = (dx * dx + dy * dy).sqrt();
                let scale = (min_distance - distance) / distance * self.strength * 0.5;
                dx *= scale;
                dy *= scale;
                bodies.vx[i] += dx;
                bodies.vy[i] += dy;
                bodies.vx[j] -= dx;
                bodies.vy[j] -= dy;
            }
        }
    }
}

// =============================================================================
// Jitter
// =============================================================================

/// Small random velocity perturbation that keeps the layout from freezing
/// into a perfectly deterministic rest.
pub struct JitterForce {
    strength: f32,
    rng: SmallRng,
}

impl JitterForce {
    pub fn new(strength: f32, seed: u64) -> Self {
        Self {
            strength,
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Force for JitterForce {
    fn apply(&mut self, bodies: &mut Bodies, _context: &TickContext) {
        if self.strength <= 0.0 {
            return;
        }
        for i in 0..bodies.len() {
            bodies.vx[i] += self.rng.gen_range(-0.5_f32..0.5) * self.strength;
            bodies.vy[i] += self.rng.gen_range(-0.5_f32..0.5) * self.strength;
        }
    }
}
