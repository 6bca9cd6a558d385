//! Real-time 2D collision detection and rigid body response for convex polygons.
//!
//! The entry point is [`Physics`][physics::Physics], which owns every entity, collider
//! and rigid body and advances them with a fixed timestep.

// profiling spans that compile to nothing unless the `tracy` feature is enabled
#[cfg(feature = "tracy")]
macro_rules! tracy_span {
    ($name:literal, $fn_name:literal) => {
        tracy_client::span!($name)
    };
}
#[cfg(not(feature = "tracy"))]
macro_rules! tracy_span {
    ($name:literal, $fn_name:literal) => {
        ()
    };
}

pub mod math;
pub use math::{uv, Angle, Transform, Unit, Vec2};

pub mod physics;
pub use physics::{
    body::{BodyType, Rigidbody},
    collision::{
        self, Aabb, Collider, ColliderMode, Contact, ContactSide, LineSegment, Polygon, Projection,
    },
    entity_set::{BodyKey, ColliderKey, Entity, EntityKey, EntitySet},
    event::{CollisionEvent, CollisionListener, Command, CommandQueue, EventKind},
    forcefield::{self, ForceField},
    FixedTimestep, Physics, PhysicsError, PhysicsParams,
};
