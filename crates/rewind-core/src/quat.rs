// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Unit quaternion over the fixed-point scalar.
//!
//! Stored as scalar part `w` plus vector part `v`. Construction from
//! axis+angle assumes a unit axis; no runtime unit-length assertion is
//! performed anywhere (matching the rest of the kernel's
//! garbage-in/deterministic-garbage-out policy).

use core::fmt;
use core::ops::Mul;

use crate::fixed::Fp;
use crate::trig;
use crate::vec3::Vec3;

/// Unit quaternion `(w, v)` with fixed-point components.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Quat {
    /// Scalar part.
    pub w: Fp,
    /// Vector part.
    pub v: Vec3,
}

impl Quat {
    /// Creates a quaternion from its scalar and vector parts.
    #[must_use]
    pub const fn new(w: Fp, v: Vec3) -> Self {
        Self { w, v }
    }

    /// The identity rotation.
    #[must_use]
    pub const fn identity() -> Self {
        Self::new(Fp::ONE, Vec3::ZERO)
    }

    /// Builds a rotation of `angle_radians` around the unit axis `axis`.
    #[must_use]
    pub fn from_radians(axis: Vec3, angle_radians: Fp) -> Self {
        let (sin_half, cos_half) = trig::sin_cos(angle_radians / Fp::from_num(2));
        Self::new(cos_half, axis * sin_half)
    }

    /// Builds a rotation of `angle_degrees` around the unit axis `axis`.
    #[must_use]
    pub fn from_degrees(axis: Vec3, angle_degrees: Fp) -> Self {
        Self::from_radians(axis, trig::degrees_to_radians(angle_degrees))
    }

    /// Returns the inverse rotation.
    ///
    /// Assumes a unit quaternion, so the inverse is the conjugate `(w, −v)`.
    #[must_use]
    pub fn inverted(self) -> Self {
        Self::new(self.w, -self.v)
    }

    /// Renormalizes to unit length; a degenerate (near-zero) quaternion
    /// collapses to the identity.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len_sq =
            self.w * self.w + self.v.x * self.v.x + self.v.y * self.v.y + self.v.z * self.v.z;
        let len = trig::sqrt(len_sq);
        if len == Fp::ZERO {
            return Self::identity();
        }
        Self::new(self.w / len, self.v / len)
    }

    /// Builds the shortest rotation carrying unit vector `from` onto unit
    /// vector `to`.
    ///
    /// Uses the half-vector construction `(1 + from·to, from×to)` followed by
    /// a renormalize, which avoids any arc-cosine. Antiparallel inputs turn
    /// 180° about an arbitrary perpendicular axis.
    #[must_use]
    pub fn rotation_between(from: Vec3, to: Vec3) -> Self {
        let w = Fp::ONE + from.dot(to);
        if w <= Fp::frac(1, 1000) {
            // Antiparallel: half turn about any perpendicular.
            return Self::new(Fp::ZERO, from.any_perpendicular());
        }
        Self::new(w, from.cross(to)).normalized()
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::identity()
    }
}

/// Hamilton product; composes two rotations (`self` applied after `rhs`).
impl Mul for Quat {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.w - self.v.dot(rhs.v),
            self.v * rhs.w + rhs.v * self.w + self.v.cross(rhs.v),
        )
    }
}

/// Rotates a vector by this quaternion.
///
/// The sandwich product `q·p·q⁻¹` expanded to the cheaper identity
/// `p + 2w(v×p) + 2(v×(v×p))`.
impl Mul<Vec3> for Quat {
    type Output = Vec3;

    fn mul(self, input: Vec3) -> Vec3 {
        let v_cross_input = self.v.cross(input);
        input
            + v_cross_input * (Fp::from_num(2) * self.w)
            + self.v.cross(v_cross_input) * Fp::from_num(2)
    }
}

impl fmt::Display for Quat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.w, self.v)
    }
}
