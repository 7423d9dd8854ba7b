// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tagged collider model.
//!
//! One composite value type covers every supported shape, so colliders can
//! live inline in components without boxing or dynamic dispatch. Queries
//! project the shape they need via [`Collider::as_box`] /
//! [`Collider::as_sphere`] / [`Collider::as_capsule`] and pattern-match the
//! rest.
//!
//! Invariants (enforced by [`Collider::is_valid`], assumed by the queries):
//! - box half-extents are positive on all three axes
//! - capsule half-height ≥ radius, radius > 0
//! - sphere radius > 0
//! - rotation is a unit quaternion

use rewind_core::{ChecksumState, Fp, Quat, StateChecksum, Vec3};

use crate::ray::Line;

/// Shape-specific collider data.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ColliderShape {
    /// No shape assigned yet. Queries on uninitialized colliders log an
    /// error and report no collision.
    #[default]
    Uninitialized,
    /// Oriented box.
    Box {
        /// Positive half-extent per local axis.
        half_size: Vec3,
    },
    /// Sphere.
    Sphere {
        /// Sphere radius.
        radius: Fp,
    },
    /// Capsule, vertical in local space.
    Capsule {
        /// Radius of the rounded ends.
        radius: Fp,
        /// Half of the total height including the rounded ends; ≥ radius.
        half_height: Fp,
    },
}

/// Composite collider: a shape plus its world-space center and rotation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Collider {
    /// World-space center.
    pub center: Vec3,
    /// World-space rotation.
    pub rotation: Quat,
    /// The shape payload.
    pub shape: ColliderShape,
}

/// Box projection of a [`Collider`]: center, rotation, half extents.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OrientedBox {
    /// World-space center.
    pub center: Vec3,
    /// World-space rotation.
    pub rotation: Quat,
    /// Positive half-extent per local axis.
    pub half_size: Vec3,
}

/// Sphere projection of a [`Collider`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SphereShape {
    /// World-space center.
    pub center: Vec3,
    /// Sphere radius.
    pub radius: Fp,
}

/// Capsule projection of a [`Collider`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CapsuleShape {
    /// World-space center.
    pub center: Vec3,
    /// World-space rotation.
    pub rotation: Quat,
    /// Radius of the rounded ends.
    pub radius: Fp,
    /// Half of the total height including the rounded ends.
    pub half_height: Fp,
}

impl Collider {
    /// Builds an axis-aligned box collider.
    #[must_use]
    pub fn new_box(center: Vec3, half_size: Vec3) -> Self {
        Self::new_box_rotated(center, Quat::identity(), half_size)
    }

    /// Builds an oriented box collider.
    #[must_use]
    pub fn new_box_rotated(center: Vec3, rotation: Quat, half_size: Vec3) -> Self {
        Self { center, rotation, shape: ColliderShape::Box { half_size } }
    }

    /// Builds a sphere collider.
    #[must_use]
    pub fn new_sphere(center: Vec3, radius: Fp) -> Self {
        Self { center, rotation: Quat::identity(), shape: ColliderShape::Sphere { radius } }
    }

    /// Builds an upright capsule collider.
    #[must_use]
    pub fn new_capsule(center: Vec3, radius: Fp, half_height: Fp) -> Self {
        Self::new_capsule_rotated(center, Quat::identity(), radius, half_height)
    }

    /// Builds an oriented capsule collider.
    #[must_use]
    pub fn new_capsule_rotated(center: Vec3, rotation: Quat, radius: Fp, half_height: Fp) -> Self {
        Self { center, rotation, shape: ColliderShape::Capsule { radius, half_height } }
    }

    /// Builds a capsule from the centers of its two end spheres.
    ///
    /// `point_a` is the base sphere center, `point_b` the tip sphere center.
    #[must_use]
    pub fn new_capsule_from_points(point_a: Vec3, point_b: Vec3, radius: Fp) -> Self {
        let center = Vec3::midpoint(point_a, point_b);
        let medial_half_length = Vec3::distance(point_a, point_b) / Fp::from_num(2);
        let rotation = if medial_half_length == Fp::ZERO {
            Quat::identity()
        } else {
            Quat::rotation_between(Vec3::UP, Vec3::direction(point_a, point_b))
        };
        Self::new_capsule_rotated(center, rotation, radius, medial_half_length + radius)
    }

    /// True when a shape has been assigned.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.shape != ColliderShape::Uninitialized
    }

    /// True for box colliders.
    #[must_use]
    pub fn is_box(&self) -> bool {
        matches!(self.shape, ColliderShape::Box { .. })
    }

    /// True for sphere colliders.
    #[must_use]
    pub fn is_sphere(&self) -> bool {
        matches!(self.shape, ColliderShape::Sphere { .. })
    }

    /// True for capsule colliders.
    #[must_use]
    pub fn is_capsule(&self) -> bool {
        matches!(self.shape, ColliderShape::Capsule { .. })
    }

    /// Checks the shape invariants listed in the module docs.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match self.shape {
            ColliderShape::Uninitialized => false,
            ColliderShape::Box { half_size } => {
                half_size.x > Fp::ZERO && half_size.y > Fp::ZERO && half_size.z > Fp::ZERO
            }
            ColliderShape::Sphere { radius } => radius > Fp::ZERO,
            ColliderShape::Capsule { radius, half_height } => {
                radius > Fp::ZERO && half_height >= radius
            }
        }
    }

    /// Returns the box projection, if this is a box.
    #[must_use]
    pub fn as_box(&self) -> Option<OrientedBox> {
        match self.shape {
            ColliderShape::Box { half_size } => {
                Some(OrientedBox { center: self.center, rotation: self.rotation, half_size })
            }
            _ => None,
        }
    }

    /// Returns the sphere projection, if this is a sphere.
    #[must_use]
    pub fn as_sphere(&self) -> Option<SphereShape> {
        match self.shape {
            ColliderShape::Sphere { radius } => Some(SphereShape { center: self.center, radius }),
            _ => None,
        }
    }

    /// Returns the capsule projection, if this is a capsule.
    #[must_use]
    pub fn as_capsule(&self) -> Option<CapsuleShape> {
        match self.shape {
            ColliderShape::Capsule { radius, half_height } => Some(CapsuleShape {
                center: self.center,
                rotation: self.rotation,
                radius,
                half_height,
            }),
            _ => None,
        }
    }

    /// Copies this collider re-centered at `new_center` (hitbox definitions
    /// are authored origin-centered and re-centered before queries).
    #[must_use]
    pub fn copy_with_center(&self, new_center: Vec3) -> Self {
        Self { center: new_center, ..*self }
    }

    /// Transforms a world-space point into this collider's local space.
    #[must_use]
    pub fn to_local_point(&self, point: Vec3) -> Vec3 {
        self.to_local_direction(point - self.center)
    }

    /// Transforms a world-space direction (origin-centered value) into local
    /// space.
    #[must_use]
    pub fn to_local_direction(&self, direction: Vec3) -> Vec3 {
        self.rotation.inverted() * direction
    }

    /// Transforms a local-space point into world space.
    #[must_use]
    pub fn to_world_point(&self, point: Vec3) -> Vec3 {
        self.to_world_direction(point) + self.center
    }

    /// Transforms a local-space direction (origin-centered value) into world
    /// space.
    #[must_use]
    pub fn to_world_direction(&self, direction: Vec3) -> Vec3 {
        self.rotation * direction
    }

    /// Shape name for diagnostics.
    #[must_use]
    pub fn shape_name(&self) -> &'static str {
        match self.shape {
            ColliderShape::Uninitialized => "Uninitialized",
            ColliderShape::Box { .. } => "Box",
            ColliderShape::Sphere { .. } => "Sphere",
            ColliderShape::Capsule { .. } => "Capsule",
        }
    }
}

impl ChecksumState for Collider {
    fn accumulate(&self, sum: &mut StateChecksum) {
        self.center.accumulate(sum);
        self.rotation.accumulate(sum);
        match self.shape {
            ColliderShape::Uninitialized => sum.write_bytes(&[0]),
            ColliderShape::Box { half_size } => {
                sum.write_bytes(&[1]);
                half_size.accumulate(sum);
            }
            ColliderShape::Sphere { radius } => {
                sum.write_bytes(&[2]);
                sum.write_fp(radius);
            }
            ColliderShape::Capsule { radius, half_height } => {
                sum.write_bytes(&[3]);
                sum.write_fp(radius);
                sum.write_fp(half_height);
            }
        }
    }
}

/// Up to three touched box faces, returned by
/// [`OrientedBox::faces_touched_local`].
#[derive(Debug, Copy, Clone, Default)]
pub struct TouchedFaces {
    faces: [Vec3; 3],
    len: usize,
}

impl TouchedFaces {
    fn push(&mut self, face: Vec3) {
        if self.len < 3 {
            self.faces[self.len] = face;
            self.len += 1;
        }
    }

    /// The touched face normals.
    #[must_use]
    pub fn as_slice(&self) -> &[Vec3] {
        &self.faces[..self.len]
    }

    /// True when any face in `self` also appears in `other`.
    #[must_use]
    pub fn shares_face_with(&self, other: &Self) -> bool {
        self.as_slice().iter().any(|f| other.as_slice().contains(f))
    }
}

impl OrientedBox {
    /// Transforms a world-space point into box-local space.
    #[must_use]
    pub fn to_local_point(&self, point: Vec3) -> Vec3 {
        self.rotation.inverted() * (point - self.center)
    }

    /// Transforms a world-space direction into box-local space.
    #[must_use]
    pub fn to_local_direction(&self, direction: Vec3) -> Vec3 {
        self.rotation.inverted() * direction
    }

    /// Transforms a box-local point into world space.
    #[must_use]
    pub fn to_world_point(&self, point: Vec3) -> Vec3 {
        self.rotation * point + self.center
    }

    /// Transforms a box-local direction into world space.
    #[must_use]
    pub fn to_world_direction(&self, direction: Vec3) -> Vec3 {
        self.rotation * direction
    }

    /// The same box with each half-extent grown by `amount`.
    #[must_use]
    pub fn expanded(&self, amount: Fp) -> Self {
        Self { half_size: self.half_size + Vec3::splat(amount), ..*self }
    }

    /// The eight corners in world space.
    #[must_use]
    pub fn vertices_world(&self) -> [Vec3; 8] {
        let h = self.half_size;
        let corners_local = [
            Vec3::new(-h.x, -h.y, -h.z),
            Vec3::new(h.x, h.y, h.z),
            Vec3::new(-h.x, h.y, -h.z),
            Vec3::new(h.x, -h.y, -h.z),
            Vec3::new(h.x, h.y, -h.z),
            Vec3::new(-h.x, -h.y, h.z),
            Vec3::new(-h.x, h.y, h.z),
            Vec3::new(h.x, -h.y, h.z),
        ];
        corners_local.map(|c| self.center + self.rotation * c)
    }

    /// The three face normals in world space (parallel pairs omitted).
    #[must_use]
    pub fn normals_world(&self) -> [Vec3; 3] {
        [
            self.to_world_direction(Vec3::FORWARD),
            self.to_world_direction(Vec3::RIGHT),
            self.to_world_direction(Vec3::UP),
        ]
    }

    /// Point containment, counting the surface as inside. `point` is in
    /// box-local space.
    #[must_use]
    pub fn contains_local_including_surface(&self, point: Vec3) -> bool {
        let h = self.half_size;
        !(point.x < -h.x
            || point.x > h.x
            || point.y < -h.y
            || point.y > h.y
            || point.z < -h.z
            || point.z > h.z)
    }

    /// Point containment, excluding the surface. `point` is in box-local
    /// space.
    #[must_use]
    pub fn contains_local_excluding_surface(&self, point: Vec3) -> bool {
        if !self.contains_local_including_surface(point) {
            return false;
        }
        let h = self.half_size;
        // Any coordinate sitting on a (±) max extent means the point is on a
        // face, edge, or vertex.
        if point.x == -h.x || point.x == h.x {
            return false;
        }
        if point.y == -h.y || point.y == h.y {
            return false;
        }
        if point.z == -h.z || point.z == h.z {
            return false;
        }
        true
    }

    /// Which faces a surface point touches: one for a face, two for an edge,
    /// three for a vertex.
    ///
    /// `point` must already be known to be on the surface of or inside the
    /// box. The raycast layer compares entry/exit face sets to reject
    /// segments that merely slide along one face.
    #[must_use]
    pub fn faces_touched_local(&self, point: Vec3) -> TouchedFaces {
        let near = Fp::frac(1, 1000);
        let h = self.half_size;
        let mut result = TouchedFaces::default();

        if point.x.is_near(h.x, near) {
            result.push(Vec3::FORWARD);
        } else if point.x.is_near(-h.x, near) {
            result.push(Vec3::BACKWARD);
        }

        if point.y.is_near(h.y, near) {
            result.push(Vec3::RIGHT);
        } else if point.y.is_near(-h.y, near) {
            result.push(Vec3::LEFT);
        }

        if point.z.is_near(h.z, near) {
            result.push(Vec3::UP);
        } else if point.z.is_near(-h.z, near) {
            result.push(Vec3::DOWN);
        }

        result
    }

    /// The AABB corner selected by the low three bits of `n` (bit set picks
    /// the max extent on that axis), in box-local space.
    #[must_use]
    pub fn corner_local(&self, n: u32) -> Vec3 {
        let h = self.half_size;
        Vec3::new(
            if n & 1 != 0 { h.x } else { -h.x },
            if n & 2 != 0 { h.y } else { -h.y },
            if n & 4 != 0 { h.z } else { -h.z },
        )
    }
}

impl CapsuleShape {
    /// Half-length of the medial segment (half-height minus the end radius).
    #[must_use]
    pub fn medial_half_length(&self) -> Fp {
        self.half_height - self.radius
    }

    /// The medial segment extremes in world space: the two hemisphere
    /// centers, base first.
    #[must_use]
    pub fn medial_line_world(&self) -> Line {
        let offset = self.medial_half_length();
        let up = self.rotation * Vec3::UP;
        Line::new(self.center - up * offset, self.center + up * offset)
    }
}
