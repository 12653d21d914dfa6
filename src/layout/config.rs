//! Layout configuration.

use serde::{Deserialize, Serialize};

/// Rest length policy for link springs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LinkDistance {
    /// Every link has the same rest length.
    Fixed { distance: f32 },
    /// Each link draws a rest length uniformly from `[min, max]` at start.
    Range { min: f32, max: f32 },
}

impl Default for LinkDistance {
    fn default() -> Self {
        LinkDistance::Range {
            min: 80.0,
            max: 150.0,
        }
    }
}

/// Configuration for the force layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Radius used for the hard boundary clamp and hit testing (default: 20.0).
    pub node_radius: f32,
    /// Many-body strength; negative repels (default: -200.0).
    pub charge: f32,
    /// Link rest length policy (default: random in 80..150).
    pub link_distance: LinkDistance,
    /// Link stiffness. `None` uses `1 / min(degree(source), degree(target))`
    /// within the subset (default: None).
    pub link_strength: Option<f32>,
    /// Collision radius per node (default: 40.0).
    pub collide_radius: f32,
    /// Collision correction strength in `[0, 1]` (default: 0.7).
    pub collide_strength: f32,
    /// Mean-position centering strength (default: 1.0).
    pub center_strength: f32,
    /// Per-axis pull toward the viewport center (default: 0.05).
    pub axis_strength: f32,
    /// Per-tick random velocity perturbation; `None` disables (default: 0.3).
    pub jitter: Option<f32>,
    /// Fraction of velocity lost per tick (default: 0.4).
    pub velocity_decay: f32,
    /// Alpha below which the simulation counts as settled (default: 0.001).
    pub alpha_min: f32,
    /// Per-tick alpha decay toward the target (default: ~0.0228, 300 ticks).
    pub alpha_decay: f32,
    /// Alpha target held while a node is dragged (default: 0.3).
    pub drag_alpha_target: f32,
    /// Alpha floor applied when a dragged node is released (default: 0.3).
    pub release_alpha: f32,
    /// Alpha applied when the viewport is resized (default: 0.3).
    pub resize_alpha: f32,
    /// Idle time after settling before re-agitation; `None` disables
    /// (default: 15000.0).
    pub agitation_interval_ms: Option<f64>,
    /// Alpha raised to on re-agitation (default: 0.3).
    pub agitation_alpha: f32,
    /// Maximum velocity nudge per axis on re-agitation (default: 2.0).
    pub agitation_velocity: f32,
    /// Base seed for link distances, jitter and agitation (default: 0x5eed).
    pub seed: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let alpha_min = 0.001_f32;
        Self {
            node_radius: 20.0,
            charge: -200.0,
            link_distance: LinkDistance::default(),
            link_strength: None,
            collide_radius: 40.0,
            collide_strength: 0.7,
            center_strength: 1.0,
            axis_strength: 0.05,
            jitter: Some(0.3),
            velocity_decay: 0.4,
            alpha_min,
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            drag_alpha_target: 0.3,
            release_alpha: 0.3,
            resize_alpha: 0.3,
            agitation_interval_ms: Some(15_000.0),
            agitation_alpha: 0.3,
            agitation_velocity: 2.0,
            seed: 0x5eed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_decay_reaches_alpha_min_in_300_ticks() {
        let config = LayoutConfig::default();
        let mut alpha = 1.0_f32;
        for _ in 0..300 {
            alpha += (0.0 - alpha) * config.alpha_decay;
        }
        assert!((alpha - config.alpha_min).abs() < 1e-4, "alpha={alpha}");
    }

    #[test]
    fn test_partial_config_from_json() {
        let config: LayoutConfig =
            serde_json::from_str(r#"{"charge": -150, "jitter": null, "linkDistance": {"kind": "fixed", "distance": 90}}"#)
                .unwrap();
        assert_eq!(config.charge, -150.0);
        assert_eq!(config.jitter, None);
        assert_eq!(config.link_distance, LinkDistance::Fixed { distance: 90.0 });
        assert_eq!(config.node_radius, 20.0);
    }
}
