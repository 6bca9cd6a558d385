use crate::math::Vec2;

/// Tunable parameters of the physics world.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde-types", serde(default))]
pub struct PhysicsParams {
    /// Length of one step in seconds.
    pub fixed_delta: f64,
    /// Upper limit for time waiting in the accumulator,
    /// so a long frame doesn't cause a burst of catch-up steps.
    pub max_accumulated: f64,
    /// Acceleration applied to dynamic bodies, in units per second squared.
    /// Positive y points down.
    #[cfg_attr(feature = "serde-types", serde(with = "crate::math::serde_vec2"))]
    pub gravity: Vec2,
    /// Maximum distance of a vertex from an edge for the two to be in contact.
    pub contact_tolerance: f64,
    /// Maximum number of times a single body is resolved per step.
    pub max_resolution_visits: usize,
    /// Velocity change below which a resolved body doesn't wake its neighbors up again.
    pub velocity_epsilon: f64,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        PhysicsParams {
            fixed_delta: 1.0 / 60.0,
            max_accumulated: 1.0 / 8.0,
            gravity: Vec2::new(0.0, 981.0),
            contact_tolerance: 0.5,
            max_resolution_visits: 64,
            velocity_epsilon: 1e-6,
        }
    }
}
