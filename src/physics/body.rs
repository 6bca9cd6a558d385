use crate::math::Vec2;

/// How a body takes part in the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
pub enum BodyType {
    /// Affected by gravity, forces and collision impulses.
    Dynamic,
    /// Moves with its own velocity but nothing changes that velocity.
    Kinematic,
    /// Never moves on its own.
    Static,
}

impl Default for BodyType {
    fn default() -> Self {
        BodyType::Dynamic
    }
}

/// Something that moves and bounces off things.
///
/// A body has no shape of its own.
/// It uses the collider attached to the same entity,
/// which is created automatically if it doesn't exist.
///
/// Velocity is in world units per step.
/// Forces accumulate until the next step and are then cleared.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde-types", serde(default))]
pub struct Rigidbody {
    pub mass: f64,
    #[cfg_attr(feature = "serde-types", serde(with = "crate::math::serde_vec2"))]
    pub velocity: Vec2,
    #[cfg_attr(feature = "serde-types", serde(with = "crate::math::serde_vec2"))]
    pub forces: Vec2,
    /// Coefficient of restitution. 0 stops dead, 1 bounces back at full speed.
    pub bounciness: f64,
    /// Amount of horizontal velocity removed per step while touching something.
    pub friction: f64,
    /// Amount of velocity removed per step on both axes while touching nothing.
    pub air_friction: f64,
    pub gravity_scale: f64,
    pub body_type: BodyType,
    pub max_velocity: f64,
}

impl Default for Rigidbody {
    fn default() -> Self {
        Rigidbody {
            mass: 1.0,
            velocity: Vec2::zero(),
            forces: Vec2::zero(),
            bounciness: 0.0,
            friction: 0.0,
            air_friction: 0.0,
            gravity_scale: 1.0,
            body_type: BodyType::Dynamic,
            max_velocity: 100.0,
        }
    }
}

impl Rigidbody {
    /// A dynamic body with the given mass.
    pub fn new_dynamic(mass: f64) -> Self {
        Self {
            mass,
            ..Default::default()
        }
    }

    /// Kinematic bodies move but are not affected by collisions or gravity.
    pub fn new_kinematic() -> Self {
        Self {
            body_type: BodyType::Kinematic,
            ..Default::default()
        }
    }

    pub fn new_static() -> Self {
        Self {
            body_type: BodyType::Static,
            ..Default::default()
        }
    }

    /// Set the velocity of the body in a builder-like chain.
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_bounciness(mut self, bounciness: f64) -> Self {
        self.bounciness = bounciness;
        self
    }

    pub fn with_friction(mut self, friction: f64, air_friction: f64) -> Self {
        self.friction = friction;
        self.air_friction = air_friction;
        self
    }

    pub fn with_gravity_scale(mut self, gravity_scale: f64) -> Self {
        self.gravity_scale = gravity_scale;
        self
    }

    pub fn with_max_velocity(mut self, max_velocity: f64) -> Self {
        self.max_velocity = max_velocity;
        self
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }

    /// Queue a force to be applied on the next step.
    #[inline]
    pub fn add_force(&mut self, force: Vec2) {
        self.forces += force;
    }

    /// Change velocity immediately by `impulse / mass`.
    #[inline]
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.velocity += impulse / self.mass;
    }

    /// Move velocity toward zero by the friction that applies this step
    /// and clamp it to `max_velocity`.
    pub(crate) fn damp(&mut self, touching: bool) {
        use crate::math::approach_zero;
        if touching {
            self.velocity.x = approach_zero(self.velocity.x, self.friction);
        } else {
            self.velocity.x = approach_zero(self.velocity.x, self.air_friction);
            self.velocity.y = approach_zero(self.velocity.y, self.air_friction);
        }
        let speed = self.velocity.mag();
        if speed > self.max_velocity {
            self.velocity *= self.max_velocity / speed;
        }
    }
}
