use crate::math::{Unit, Vec2};

/// The interval a shape covers when projected onto an axis.
#[derive(Clone, Copy, Debug)]
pub struct Projection {
    pub min: f64,
    pub max: f64,
    pub axis: Unit<Vec2>,
}

impl Projection {
    /// Project a set of points onto an axis.
    /// Returns None if there are no points.
    pub fn of_points(points: impl IntoIterator<Item = Vec2>, axis: Unit<Vec2>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?.dot(*axis);
        let (min, max) = points.fold((first, first), |(min, max), p| {
            let d = p.dot(*axis);
            (min.min(d), max.max(d))
        });
        Some(Projection { min, max, axis })
    }

    /// Intervals that merely touch count as intersecting.
    #[inline]
    pub fn intersects(&self, other: &Projection) -> bool {
        !(self.max < other.min || other.max < self.min)
    }

    /// Length of the shared part of the two intervals. Negative if they don't intersect.
    #[inline]
    pub fn overlap(&self, other: &Projection) -> f64 {
        self.max.min(other.max) - self.min.max(other.min)
    }

    /// Whether one interval lies completely inside the other.
    #[inline]
    pub fn contains(&self, other: &Projection) -> bool {
        (self.min <= other.min && other.max <= self.max)
            || (other.min <= self.min && self.max <= other.max)
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.max - self.min
    }
}
