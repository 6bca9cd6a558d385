//! Convex polygon geometry, colliders and the passes that keep them up to date.

mod aabb;
pub use aabb::Aabb;

mod projection;
pub use projection::Projection;

mod segment;
pub use segment::LineSegment;

mod polygon;
pub use polygon::{Contact, ContactSide, Polygon};

mod collider;
pub use collider::{push_out_vector, Collider, ColliderMode};

pub(crate) mod scheduler;
