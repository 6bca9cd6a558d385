use super::{Aabb, LineSegment, Projection};
use crate::{
    math::{self as m, Angle, Unit, Vec2},
    physics::PhysicsError,
};

/// A convex polygon with a translation and a rotation.
///
/// The vertices given on creation are kept as-is and the current vertices are
/// always recomputed from them, so rotations don't accumulate error.
/// World-space queries use the position truncated to whole units.
#[derive(Clone, Debug)]
pub struct Polygon {
    original_vertices: Vec<Vec2>,
    vertices: Vec<Vec2>,
    edges: Vec<LineSegment>,
    position: Vec2,
    // degrees in [0, 360)
    rotation: f64,
}

/// Which of the two polygons in a contact query the contact edge belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactSide {
    /// The edge is on the polygon the query was called on
    /// and the contact point is a vertex of the other polygon.
    Own,
    /// The edge is on the other polygon
    /// and the contact point is a vertex of the polygon the query was called on.
    Other,
}

/// A vertex touching an edge of another polygon.
/// These are recomputed whenever they're needed and never stored.
#[derive(Clone, Copy, Debug)]
pub struct Contact {
    pub point: Vec2,
    pub edge: LineSegment,
    /// Outward normal of the edge with respect to the polygon the edge belongs to.
    pub normal: Unit<Vec2>,
    pub side: ContactSide,
}

impl Polygon {
    /// Create a polygon from vertices in its local frame.
    /// The vertices must describe a convex shape, in either winding order.
    pub fn new(vertices: Vec<Vec2>) -> Result<Self, PhysicsError> {
        if vertices.len() < 3 {
            return Err(PhysicsError::TooFewVertices(vertices.len()));
        }
        let mut poly = Polygon {
            original_vertices: vertices.clone(),
            vertices,
            edges: Vec::new(),
            position: Vec2::zero(),
            rotation: 0.0,
        };
        poly.recompute();
        Ok(poly)
    }

    /// An axis-aligned rectangle centered on the local origin.
    pub fn rect(width: f64, height: f64) -> Self {
        let hw = width / 2.0;
        let hh = height / 2.0;
        let mut poly = Polygon {
            original_vertices: vec![
                Vec2::new(-hw, -hh),
                Vec2::new(hw, -hh),
                Vec2::new(hw, hh),
                Vec2::new(-hw, hh),
            ],
            vertices: Vec::new(),
            edges: Vec::new(),
            position: Vec2::zero(),
            rotation: 0.0,
        };
        poly.recompute();
        poly
    }

    /// A rectangle with both sides set to the same length.
    pub fn square(side_length: f64) -> Self {
        Polygon::rect(side_length, side_length)
    }

    /// A regular polygon with `sides` corners at distance `radius` from the local origin.
    pub fn regular(sides: usize, radius: f64) -> Result<Self, PhysicsError> {
        let step = std::f64::consts::TAU / sides as f64;
        let vertices = (0..sides)
            .map(|i| m::round_vertex(m::rotate(Vec2::new(radius, 0.0), Angle::Rad(step * i as f64))))
            .collect();
        Polygon::new(vertices)
    }

    /// Builder-style translation.
    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    /// Builder-style rotation.
    pub fn with_rotation(mut self, angle: Angle) -> Self {
        self.set_rotation(angle);
        self
    }

    //
    // transform
    //

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    #[inline]
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Current rotation in degrees, in the range `[0, 360)`.
    #[inline]
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Set the absolute rotation. Vertices and edges are recomputed if it changed.
    pub fn set_rotation(&mut self, angle: Angle) {
        let deg = angle.normalized_deg();
        if deg != self.rotation {
            self.rotation = deg;
            self.recompute();
        }
    }

    /// Rotate relative to the current rotation.
    pub fn rotate_by(&mut self, angle: Angle) {
        self.set_rotation(Angle::Deg(self.rotation + angle.deg()));
    }

    fn recompute(&mut self) {
        let angle = Angle::Deg(self.rotation);
        self.vertices.clear();
        self.vertices.extend(
            (self.original_vertices.iter()).map(|v| m::round_vertex(m::rotate(*v, angle))),
        );
        let count = self.vertices.len();
        self.edges.clear();
        self.edges.extend(
            (0..count).map(|i| LineSegment::new(self.vertices[i], self.vertices[(i + 1) % count])),
        );
    }

    //
    // local and world geometry
    //

    /// Vertices in the local frame, rotated but not translated.
    #[inline]
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    /// Edges in the local frame, rotated but not translated.
    #[inline]
    pub fn edges(&self) -> &[LineSegment] {
        &self.edges
    }

    /// The translation applied to get world coordinates: the position with
    /// its fractional part dropped.
    #[inline]
    pub fn world_offset(&self) -> Vec2 {
        m::trunc(self.position)
    }

    pub fn world_vertices(&self) -> impl Iterator<Item = Vec2> + Clone + '_ {
        let offset = self.world_offset();
        self.vertices.iter().map(move |v| *v + offset)
    }

    pub fn world_edges(&self) -> impl Iterator<Item = LineSegment> + Clone + '_ {
        let offset = self.world_offset();
        self.edges.iter().map(move |e| e.offset(offset))
    }

    /// Average of the world vertices. Always inside the polygon because it's convex.
    pub fn world_center(&self) -> Vec2 {
        self.world_offset() + local_center(&self.vertices)
    }

    /// Outward unit normal of an edge, or None for a zero-length edge.
    pub fn outward_normal(&self, edge_idx: usize) -> Option<Unit<Vec2>> {
        let edge = self.edges.get(edge_idx)?;
        let normal = edge.normal()?;
        let center = local_center(&self.vertices);
        if normal.dot(edge.midpoint() - center) < 0.0 {
            Some(-normal)
        } else {
            Some(normal)
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_points(self.world_vertices())
    }

    //
    // separating axis queries
    //

    /// Candidate separating axes: one unit normal per non-degenerate edge.
    pub fn axes(&self) -> Vec<Unit<Vec2>> {
        self.edges.iter().filter_map(LineSegment::normal).collect()
    }

    /// Project the world vertices onto an axis.
    pub fn project_on(&self, axis: Unit<Vec2>) -> Projection {
        let offset = self.world_offset().dot(*axis);
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in &self.vertices {
            let d = v.dot(*axis) + offset;
            min = min.min(d);
            max = max.max(d);
        }
        Projection { min, max, axis }
    }

    fn all_axes<'a>(&'a self, other: &'a Polygon) -> impl Iterator<Item = Unit<Vec2>> + 'a {
        let own = self.edges.iter().filter_map(LineSegment::normal);
        let others = other.edges.iter().filter_map(LineSegment::normal);
        own.chain(others)
    }

    /// Separating axis test. Polygons that only touch count as intersecting.
    pub fn intersects_with(&self, other: &Polygon) -> bool {
        self.all_axes(other)
            .all(|axis| self.project_on(axis).intersects(&other.project_on(axis)))
    }

    /// Minimum translation vector: the shortest displacement along one of the
    /// candidate axes that would move `other` out of `self`.
    ///
    /// Points away from `self` toward `other` as judged by their positions.
    /// Zero if the polygons don't overlap or only touch.
    ///
    /// Components are rounded away from zero to whole units,
    /// since world vertices only move in whole units.
    /// Adding the result to `other`'s position therefore always separates the pair,
    /// rotated or not, at the cost of leaving up to one unit of gap.
    pub fn mtv(&self, other: &Polygon) -> Vec2 {
        let mut min_overlap = f64::INFINITY;
        let mut min_axis: Option<Unit<Vec2>> = None;
        for axis in self.all_axes(other) {
            let p1 = self.project_on(axis);
            let p2 = other.project_on(axis);
            if !p1.intersects(&p2) {
                return Vec2::zero();
            }
            let mut overlap = p1.overlap(&p2);
            if p1.contains(&p2) {
                // getting out of a containing interval means going past its nearer end
                overlap += (p1.min - p2.min).abs().min((p1.max - p2.max).abs());
            }
            if overlap < min_overlap {
                min_overlap = overlap;
                min_axis = Some(axis);
            }
        }

        let Some(axis) = min_axis else {
            return Vec2::zero();
        };
        if min_overlap <= 0.0 {
            return Vec2::zero();
        }
        let mtv = m::ceil_whole(*axis * min_overlap);
        if (other.position - self.position).dot(mtv) < 0.0 {
            -mtv
        } else {
            mtv
        }
    }

    /// Check whether a world-space point is inside or on the boundary of the polygon.
    pub fn contains_point(&self, point: Vec2) -> bool {
        let offset = self.world_offset();
        (0..self.edges.len()).all(|i| match self.outward_normal(i) {
            Some(n) => (point - (self.edges[i].start + offset)).dot(*n) <= 0.0,
            None => true,
        })
    }

    /// Find vertices of either polygon lying on edges of the other.
    ///
    /// Each distinct edge is reported at most once
    /// (with the first vertex found on it as the contact point),
    /// so two aligned faces touching each other give a single contact.
    pub fn contacts_with(&self, other: &Polygon, tolerance: f64) -> Vec<Contact> {
        let mut contacts: Vec<Contact> = Vec::new();
        let mut push_unique = |contact: Contact| {
            if !contacts.iter().any(|c| c.edge == contact.edge) {
                contacts.push(contact);
            }
        };

        for (edge_owner, vert_owner, side) in [
            (other, self, ContactSide::Other),
            (self, other, ContactSide::Own),
        ] {
            for (edge_idx, edge) in edge_owner.world_edges().enumerate() {
                let Some(normal) = edge_owner.outward_normal(edge_idx) else {
                    continue;
                };
                if let Some(point) = vert_owner
                    .world_vertices()
                    .find(|v| edge.touches_point(*v, tolerance))
                {
                    push_unique(Contact {
                        point,
                        edge,
                        normal,
                        side,
                    });
                }
            }
        }

        contacts
    }
}

fn local_center(vertices: &[Vec2]) -> Vec2 {
    vertices.iter().fold(Vec2::zero(), |acc, v| acc + *v) / vertices.len() as f64
}
