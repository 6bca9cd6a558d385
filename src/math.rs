//! Types, aliases and helper operations for doing math with `ultraviolet`.
use std::f64::consts::PI;
pub use ultraviolet as uv;

pub type Vec2 = uv::DVec2;

/// Number of decimal places kept when rotating polygon vertices.
pub const VERTEX_PRECISION: i32 = 4;

/// Distances this close to a whole unit are treated as that whole unit.
const WHOLE_UNIT_EPSILON: f64 = 1e-6;

/// An angle in either degrees or radians.
/// Default conversion from f64 is in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
pub enum Angle {
    Rad(f64),
    Deg(f64),
}
impl Angle {
    /// Get the angle as degrees.
    #[inline]
    pub fn deg(&self) -> f64 {
        match self {
            Angle::Rad(rad) => rad * 180.0 / PI,
            Angle::Deg(deg) => *deg,
        }
    }

    /// Get the angle as radians.
    #[inline]
    pub fn rad(&self) -> f64 {
        match self {
            Angle::Rad(rad) => *rad,
            Angle::Deg(deg) => deg * PI / 180.0,
        }
    }

    /// Get the angle as degrees wrapped into the range `[0, 360)`.
    #[inline]
    pub fn normalized_deg(&self) -> f64 {
        let deg = self.deg().rem_euclid(360.0);
        // rem_euclid can round up to exactly 360 for tiny negative inputs
        if deg >= 360.0 {
            0.0
        } else {
            deg
        }
    }
}
impl Default for Angle {
    fn default() -> Self {
        Angle::Deg(0.0)
    }
}
impl From<f64> for Angle {
    #[inline]
    fn from(deg: f64) -> Self {
        Angle::Deg(deg)
    }
}

/// A wrapper type to indicate a vector should always be normalized.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Unit<T>(T);

impl Unit<Vec2> {
    pub fn new_normalize(v: Vec2) -> Self {
        Unit(v.normalized())
    }

    pub const fn new_unchecked(v: Vec2) -> Self {
        Unit(v)
    }

    /// Normalize a vector, or return None if it's too short to have a direction.
    pub fn try_new(v: Vec2, min_len: f64) -> Option<Self> {
        let mag = v.mag();
        if mag <= min_len {
            None
        } else {
            Some(Unit(v / mag))
        }
    }

    pub fn unit_x() -> Self {
        Unit(Vec2::unit_x())
    }

    pub fn unit_y() -> Self {
        Unit(Vec2::unit_y())
    }

    #[inline]
    pub fn into_inner(self) -> Vec2 {
        self.0
    }
}

impl<T> std::ops::Deref for Unit<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> std::ops::Neg for Unit<T>
where
    T: std::ops::Neg,
{
    type Output = Unit<<T as std::ops::Neg>::Output>;

    fn neg(self) -> Self::Output {
        Unit(-self.0)
    }
}

/// Position and rotation of an object that owns colliders and bodies.
///
/// Rotation is stored in degrees because that's what polygons are rotated with.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde-types", serde(default))]
pub struct Transform {
    #[cfg_attr(feature = "serde-types", serde(with = "serde_vec2"))]
    pub position: Vec2,
    pub rotation: f64,
}

impl Transform {
    #[inline]
    pub fn new(position: Vec2, rotation: Angle) -> Self {
        Transform {
            position,
            rotation: rotation.deg(),
        }
    }

    #[inline]
    pub fn with_position(mut self, pos: impl Into<[f64; 2]>) -> Self {
        let pos = pos.into();
        self.position = Vec2::new(pos[0], pos[1]);
        self
    }

    #[inline]
    pub fn with_rotation(mut self, angle: Angle) -> Self {
        self.rotation = angle.deg();
        self
    }

    #[inline]
    pub fn angle(&self) -> Angle {
        Angle::Deg(self.rotation)
    }
}
impl From<[f64; 2]> for Transform {
    fn from(pos: [f64; 2]) -> Self {
        Transform::default().with_position(pos)
    }
}
impl From<Vec2> for Transform {
    fn from(pos: Vec2) -> Self {
        Transform {
            position: pos,
            rotation: 0.0,
        }
    }
}

/// (De)serialize a `Vec2` as an `[x, y]` pair.
/// Use with `#[serde(with = "crate::math::serde_vec2")]`.
#[cfg(feature = "serde-types")]
pub mod serde_vec2 {
    use super::Vec2;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(v: &Vec2, serializer: S) -> Result<S::Ok, S::Error> {
        [v.x, v.y].serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec2, D::Error> {
        let [x, y] = <[f64; 2]>::deserialize(deserializer)?;
        Ok(Vec2::new(x, y))
    }
}

// Vec2 utils

#[inline]
pub fn left_normal(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}
#[inline]
pub fn right_normal(v: Vec2) -> Vec2 {
    Vec2::new(v.y, -v.x)
}
#[inline]
pub fn unit_left_normal(u: Unit<Vec2>) -> Unit<Vec2> {
    Unit::new_unchecked(left_normal(*u))
}

/// Rotate a vector counterclockwise (in a y-up frame) around the origin.
#[inline]
pub fn rotate(v: Vec2, angle: Angle) -> Vec2 {
    let (sin, cos) = angle.rad().sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Round both components to [`VERTEX_PRECISION`] decimal places.
#[inline]
pub fn round_vertex(v: Vec2) -> Vec2 {
    let scale = 10f64.powi(VERTEX_PRECISION);
    Vec2::new((v.x * scale).round() / scale, (v.y * scale).round() / scale)
}

/// Drop the fractional part of both components, rounding toward zero.
#[inline]
pub fn trunc(v: Vec2) -> Vec2 {
    Vec2::new(v.x.trunc(), v.y.trunc())
}

/// Round both components away from zero to whole units.
///
/// Shapes sit on whole-unit offsets, so a displacement meant to separate
/// two of them has to be whole too or its fraction gets lost.
/// Floating point noise under [`WHOLE_UNIT_EPSILON`] is dropped first.
#[inline]
pub fn ceil_whole(v: Vec2) -> Vec2 {
    fn ceil_away(x: f64) -> f64 {
        let mag = x.abs() - WHOLE_UNIT_EPSILON;
        if mag <= 0.0 {
            0.0
        } else {
            mag.ceil().copysign(x)
        }
    }
    Vec2::new(ceil_away(v.x), ceil_away(v.y))
}

/// Translate a position by a whole-unit displacement so that
/// its truncated value moves by exactly that displacement.
///
/// Plain addition doesn't guarantee this when a component crosses zero,
/// e.g. `trunc(-0.5 + 1.0)` is 0 and not 1.
/// The fractional part is kept whenever it doesn't change the truncation.
pub fn translate_truncated(pos: Vec2, by: Vec2) -> Vec2 {
    fn shift(p: f64, d: f64) -> f64 {
        let whole = p.trunc() + d;
        let frac = p - p.trunc();
        if whole != 0.0 && frac != 0.0 && whole.signum() != frac.signum() {
            whole
        } else {
            whole + frac
        }
    }
    Vec2::new(shift(pos.x, by.x), shift(pos.y, by.y))
}

/// Move a scalar toward zero by `amount` without crossing it.
#[inline]
pub fn approach_zero(value: f64, amount: f64) -> f64 {
    if value > 0.0 {
        (value - amount).max(0.0)
    } else {
        (value + amount).min(0.0)
    }
}
