//! Acceleration fields applied to dynamic bodies during the gravity pass.
//!
//! [`Physics::step`][crate::Physics::step] uses a constant [`Gravity`]
//! built from the configured parameters. Anything else,
//! e.g. a planet's pull on top of the usual downward gravity,
//! goes through [`Physics::step_with_field`][crate::Physics::step_with_field].

use crate::math::Vec2;

/// A (possibly) position-dependent acceleration field.
///
/// The gravity pass turns it into a force by multiplying with each body's
/// mass and gravity scale.
pub trait ForceField {
    fn value_at(&self, position: Vec2) -> Vec2;

    /// Combine with another field, adding their values.
    fn plus<F: ForceField>(self, other: F) -> Sum<Self, F>
    where
        Self: Sized,
    {
        Sum(self, other)
    }
}

impl<F: ForceField + ?Sized> ForceField for &F {
    #[inline]
    fn value_at(&self, position: Vec2) -> Vec2 {
        (**self).value_at(position)
    }
}

/// No acceleration anywhere. Bodies only move by their own velocity and forces.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoneField;
impl ForceField for NoneField {
    fn value_at(&self, _: Vec2) -> Vec2 {
        Vec2::zero()
    }
}

/// Two fields acting at once.
#[derive(Clone, Copy, Debug)]
pub struct Sum<F1: ForceField, F2: ForceField>(pub F1, pub F2);
impl<F1: ForceField, F2: ForceField> ForceField for Sum<F1, F2> {
    fn value_at(&self, pos: Vec2) -> Vec2 {
        self.0.value_at(pos) + self.1.value_at(pos)
    }
}

/// The same acceleration everywhere, in units per second squared.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gravity(pub Vec2);
impl ForceField for Gravity {
    fn value_at(&self, _pos: Vec2) -> Vec2 {
        self.0
    }
}

/// Pull toward a point that weakens with squared distance.
///
/// A negative `strength` pushes away instead.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointGravity {
    pub position: Vec2,
    /// Acceleration at distance zero.
    pub strength: f64,
    /// Multiplier on the squared distance in the divisor.
    pub falloff: f64,
}

impl PointGravity {
    pub fn new(position: Vec2, strength: f64) -> Self {
        PointGravity {
            position,
            strength,
            falloff: 1.0,
        }
    }

    pub fn with_falloff(mut self, falloff: f64) -> Self {
        self.falloff = falloff;
        self
    }
}

impl ForceField for PointGravity {
    fn value_at(&self, pos: Vec2) -> Vec2 {
        let to_source = self.position - pos;
        let dist_sq = to_source.mag_sq();
        // no direction to pull in at the source itself
        if dist_sq == 0.0 {
            return Vec2::zero();
        }
        let accel = self.strength / (dist_sq * self.falloff + 1.0);
        to_source.normalized() * accel
    }
}
