use super::{Aabb, Polygon};
use crate::{
    math::{Transform, Vec2},
    physics::{
        event::{CollisionListener, EventKind},
        ColliderKey, PhysicsError,
    },
};

use std::sync::Arc;

/// Selects how a collider checks for and responds to overlaps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
pub enum ColliderMode {
    /// Solid. Checks against `Physical` and `Static` colliders
    /// and pushes out of what it overlaps.
    Physical,
    /// Sensor. Checks against every collider, never pushes anything.
    Trigger,
    /// Never moved by collisions. Checks against `Physical` colliders only.
    Static,
}

impl Default for ColliderMode {
    fn default() -> Self {
        ColliderMode::Physical
    }
}

impl ColliderMode {
    /// Whether a collider in this mode runs an overlap test against one in `other` mode.
    #[inline]
    pub fn detects(self, other: ColliderMode) -> bool {
        use ColliderMode::*;
        match (self, other) {
            (Physical, Physical | Static) => true,
            (Static, Physical) => true,
            (Trigger, _) => true,
            _ => false,
        }
    }
}

/// A convex shape that detects overlaps with other colliders every step.
///
/// The shape follows the transform of the entity the collider is attached to.
/// Overlap results are rebuilt from scratch on every step.
pub struct Collider {
    pub shape: Polygon,
    pub mode: ColliderMode,
    // found by this collider's own check policy, in registry order
    pub(crate) intersections: Vec<ColliderKey>,
    // everything overlapping under either side's policy, used for notifications
    pub(crate) overlaps: Vec<ColliderKey>,
    pub(crate) bounding: Aabb,
    pub(crate) intersects: bool,
    listeners: [Vec<Arc<dyn CollisionListener>>; EventKind::COUNT],
}

impl Collider {
    pub fn new(shape: Polygon, mode: ColliderMode) -> Self {
        let bounding = shape.aabb();
        Collider {
            shape,
            mode,
            intersections: Vec::new(),
            overlaps: Vec::new(),
            bounding,
            intersects: false,
            listeners: Default::default(),
        }
    }

    /// Shorthand for a `Physical` axis-aligned rectangle.
    #[inline]
    pub fn new_rect(width: f64, height: f64) -> Self {
        Self::new(Polygon::rect(width, height), ColliderMode::Physical)
    }

    /// Set the mode in a builder-like chain.
    #[inline]
    pub fn with_mode(mut self, mode: ColliderMode) -> Self {
        self.mode = mode;
        self
    }

    /// Colliders found overlapping by this collider's own check on the latest step.
    #[inline]
    pub fn intersections(&self) -> &[ColliderKey] {
        &self.intersections
    }

    /// Colliders overlapping this one on the latest step,
    /// including triggers and other colliders whose check found this one.
    #[inline]
    pub fn overlaps(&self) -> &[ColliderKey] {
        &self.overlaps
    }

    /// Whether the latest check found anything.
    #[inline]
    pub fn intersects(&self) -> bool {
        self.intersects
    }

    /// World-space bounding box of the shape as of the latest shape update.
    #[inline]
    pub fn bounding(&self) -> Aabb {
        self.bounding
    }

    //
    // listeners
    //

    /// Register a listener for one kind of event.
    /// The same listener can't be registered twice for the same kind.
    pub fn subscribe(
        &mut self,
        kind: EventKind,
        listener: Arc<dyn CollisionListener>,
    ) -> Result<(), PhysicsError> {
        let list = &mut self.listeners[kind.index()];
        if list.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            return Err(PhysicsError::DuplicateListener(kind));
        }
        list.push(listener);
        Ok(())
    }

    /// Remove a previously registered listener.
    /// Returns whether it was found.
    pub fn unsubscribe(&mut self, kind: EventKind, listener: &Arc<dyn CollisionListener>) -> bool {
        let list = &mut self.listeners[kind.index()];
        let len_before = list.len();
        list.retain(|l| !Arc::ptr_eq(l, listener));
        list.len() != len_before
    }

    #[inline]
    pub fn listeners(&self, kind: EventKind) -> &[Arc<dyn CollisionListener>] {
        &self.listeners[kind.index()]
    }

    #[inline]
    pub(crate) fn has_listeners(&self) -> bool {
        self.listeners.iter().any(|l| !l.is_empty())
    }

    pub(crate) fn clear_listeners(&mut self) {
        for list in &mut self.listeners {
            list.clear();
        }
    }

    //
    // step helpers
    //

    /// Move the shape to the owner's transform and refresh the bounding box.
    pub(crate) fn sync_shape(&mut self, tr: &Transform) {
        self.shape.set_position(tr.position);
        self.shape.set_rotation(tr.angle());
        self.bounding = self.shape.aabb();
    }

    /// Broad phase and narrow phase in one: a bounding box reject, then SAT.
    #[inline]
    pub(crate) fn overlaps_with(&self, other: &Collider) -> bool {
        self.bounding.intersects(&other.bounding) && self.shape.intersects_with(&other.shape)
    }
}

impl std::fmt::Debug for Collider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collider")
            .field("shape", &self.shape)
            .field("mode", &self.mode)
            .field("intersections", &self.intersections)
            .field("intersects", &self.intersects)
            .finish_non_exhaustive()
    }
}

/// Turn an MTV found by `self_pos`'s collider into the displacement that
/// separates the pair when added to the pushed side.
///
/// The result points from `other_pos` toward `self_pos`
/// and only has its larger component left, so corners don't glide diagonally.
/// Add it to `self` to push self away, or subtract it from `other`.
pub fn push_out_vector(mtv: Vec2, self_pos: Vec2, other_pos: Vec2) -> Vec2 {
    let away = self_pos - other_pos;
    let m = if mtv.dot(away) < 0.0 { -mtv } else { mtv };
    if m.x.abs() >= m.y.abs() {
        Vec2::new(m.x, 0.0)
    } else {
        Vec2::new(0.0, m.y)
    }
}
