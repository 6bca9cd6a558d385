use crate::math::{self as m, Unit, Vec2};

/// Edges shorter than this have no usable direction.
pub(crate) const DEGENERATE_EDGE_LEN: f64 = 1e-9;

/// A straight line between two points, used as the edge of a [`Polygon`][super::Polygon].
///
/// Equality is undirected: a segment equals its own reversal.
#[derive(Clone, Copy, Debug)]
pub struct LineSegment {
    pub start: Vec2,
    pub end: Vec2,
}

impl LineSegment {
    #[inline]
    pub fn new(start: Vec2, end: Vec2) -> Self {
        LineSegment { start, end }
    }

    /// Vector from `start` to `end`.
    #[inline]
    pub fn direction(&self) -> Vec2 {
        self.end - self.start
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.direction().mag()
    }

    /// The direction rotated a quarter turn, not normalized.
    #[inline]
    pub fn perpendicular(&self) -> Vec2 {
        m::left_normal(self.direction())
    }

    /// Unit normal on the left side of the direction,
    /// or None if the segment has zero length.
    pub fn normal(&self) -> Option<Unit<Vec2>> {
        Unit::try_new(self.perpendicular(), DEGENERATE_EDGE_LEN)
    }

    #[inline]
    pub fn midpoint(&self) -> Vec2 {
        (self.start + self.end) * 0.5
    }

    #[inline]
    pub fn reversed(&self) -> Self {
        LineSegment {
            start: self.end,
            end: self.start,
        }
    }

    /// Parameter `t` of the point's projection onto the infinite line through the segment,
    /// where 0 is `start` and 1 is `end`. Zero-length segments always give 0.
    pub fn project_param(&self, point: Vec2) -> f64 {
        let dir = self.direction();
        let len_sq = dir.mag_sq();
        if len_sq <= DEGENERATE_EDGE_LEN * DEGENERATE_EDGE_LEN {
            return 0.0;
        }
        (point - self.start).dot(dir) / len_sq
    }

    /// The point on the segment closest to the given point.
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        let t = self.project_param(point).clamp(0.0, 1.0);
        self.start + self.direction() * t
    }

    #[inline]
    pub fn distance_to_point(&self, point: Vec2) -> f64 {
        (point - self.closest_point(point)).mag()
    }

    /// Check whether a point lies on the segment,
    /// allowing it to be up to `tolerance` away from the line.
    pub fn touches_point(&self, point: Vec2, tolerance: f64) -> bool {
        let t = self.project_param(point);
        if !(0.0..=1.0).contains(&t) {
            return false;
        }
        let on_line = self.start + self.direction() * t;
        (point - on_line).mag_sq() <= tolerance * tolerance
    }

    /// Translate both endpoints.
    #[inline]
    pub fn offset(&self, by: Vec2) -> Self {
        LineSegment {
            start: self.start + by,
            end: self.end + by,
        }
    }
}

impl PartialEq for LineSegment {
    fn eq(&self, other: &Self) -> bool {
        (self.start == other.start && self.end == other.end)
            || (self.start == other.end && self.end == other.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    const EPSILON: f64 = 1e-10;

    #[test]
    fn undirected_equality() {
        let a = LineSegment::new(Vec2::new(0.0, 0.0), Vec2::new(3.0, 4.0));
        assert_eq!(a, a.reversed());
        assert_ne!(a, LineSegment::new(Vec2::new(0.0, 0.0), Vec2::new(3.0, 5.0)));
        assert!((a.length() - 5.0).abs() < EPSILON);
    }

    #[test]
    fn closest_point_is_clamped() {
        let seg = LineSegment::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
        assert_eq!(seg.closest_point(Vec2::new(5.0, 3.0)), Vec2::new(5.0, 0.0));
        assert_eq!(seg.closest_point(Vec2::new(-4.0, 3.0)), Vec2::new(0.0, 0.0));
        assert_eq!(seg.closest_point(Vec2::new(14.0, -3.0)), Vec2::new(10.0, 0.0));
        assert!((seg.distance_to_point(Vec2::new(13.0, 4.0)) - 5.0).abs() < EPSILON);
    }

    #[test]
    fn touching_points() {
        let seg = LineSegment::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
        assert!(seg.touches_point(Vec2::new(10.0, 0.0), 0.1));
        assert!(seg.touches_point(Vec2::new(4.0, 0.05), 0.1));
        assert!(!seg.touches_point(Vec2::new(4.0, 0.5), 0.1));
        // within distance of the endpoint but outside the parameter range
        assert!(!seg.touches_point(Vec2::new(10.05, 0.0), 0.1));
    }

    #[test]
    fn zero_length_segment() {
        let p = Vec2::new(2.0, 2.0);
        let seg = LineSegment::new(p, p);
        assert!(seg.normal().is_none());
        assert_eq!(seg.closest_point(Vec2::new(5.0, 5.0)), p);
    }
}
