// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Deterministic 3D vector over the Q48.16 scalar.
//!
//! Axis conventions: +X forward, +Y right, +Z up.

use core::fmt;
use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use crate::fixed::Fp;
use crate::trig;

/// 3D vector with fixed-point components.
///
/// Value type; may represent a point or a direction depending on calling
/// context.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Vec3 {
    /// Forward (+X) component.
    pub x: Fp,
    /// Right (+Y) component.
    pub y: Fp,
    /// Up (+Z) component.
    pub z: Fp,
}

impl Vec3 {
    /// The zero vector.
    pub const ZERO: Self = Self::splat(Fp::ZERO);

    /// Unit +X.
    pub const FORWARD: Self = Self::new(Fp::ONE, Fp::ZERO, Fp::ZERO);

    /// Unit −X.
    pub const BACKWARD: Self = Self::new(Fp::from_num(-1), Fp::ZERO, Fp::ZERO);

    /// Unit +Y.
    pub const RIGHT: Self = Self::new(Fp::ZERO, Fp::ONE, Fp::ZERO);

    /// Unit −Y.
    pub const LEFT: Self = Self::new(Fp::ZERO, Fp::from_num(-1), Fp::ZERO);

    /// Unit +Z.
    pub const UP: Self = Self::new(Fp::ZERO, Fp::ZERO, Fp::ONE);

    /// Unit −Z.
    pub const DOWN: Self = Self::new(Fp::ZERO, Fp::ZERO, Fp::from_num(-1));

    /// Creates a vector from components.
    #[must_use]
    pub const fn new(x: Fp, y: Fp, z: Fp) -> Self {
        Self { x, y, z }
    }

    /// Creates a vector with all components equal to `value`.
    #[must_use]
    pub const fn splat(value: Fp) -> Self {
        Self { x: value, y: value, z: value }
    }

    /// Returns the component for `axis` (0 = x, 1 = y, 2 = z).
    ///
    /// Out-of-range axes yield zero; the slab loops only ever pass 0..3.
    #[must_use]
    pub fn axis(self, axis: usize) -> Fp {
        match axis {
            0 => self.x,
            1 => self.y,
            2 => self.z,
            _ => Fp::ZERO,
        }
    }

    /// Dot product.
    #[must_use]
    pub fn dot(self, other: Self) -> Fp {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product.
    #[must_use]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Squared magnitude.
    #[must_use]
    pub fn length_squared(self) -> Fp {
        self.dot(self)
    }

    /// Magnitude, via the deterministic square root.
    #[must_use]
    pub fn length(self) -> Fp {
        trig::sqrt(self.length_squared())
    }

    /// Returns the normalized vector; zero-length inputs stay the zero
    /// vector so downstream callers can detect degenerate directions
    /// deterministically.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len == Fp::ZERO {
            return Self::ZERO;
        }
        self / len
    }

    /// Returns the vector scaled by −1.
    #[must_use]
    pub fn flipped(self) -> Self {
        -self
    }

    /// True when every component is exactly zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }

    /// Component-wise near-equality within `±positive_error_range`.
    #[must_use]
    pub fn is_near(self, other: Self, positive_error_range: Fp) -> bool {
        self.x.is_near(other.x, positive_error_range)
            && self.y.is_near(other.y, positive_error_range)
            && self.z.is_near(other.z, positive_error_range)
    }

    /// True when this vector has a component opposite to `other`.
    #[must_use]
    pub fn is_opposite_direction_to(self, other: Self) -> bool {
        self.dot(other) < Fp::ZERO
    }

    /// Squared distance between two points.
    #[must_use]
    pub fn distance_squared(from: Self, to: Self) -> Fp {
        (to - from).length_squared()
    }

    /// Distance between two points.
    #[must_use]
    pub fn distance(from: Self, to: Self) -> Fp {
        (to - from).length()
    }

    /// Unnormalized direction from `from` to `to`.
    #[must_use]
    pub fn direction_unnormalized(from: Self, to: Self) -> Self {
        to - from
    }

    /// Normalized direction from `from` to `to`.
    #[must_use]
    pub fn direction(from: Self, to: Self) -> Self {
        Self::direction_unnormalized(from, to).normalized()
    }

    /// Midpoint between two points.
    #[must_use]
    pub fn midpoint(a: Self, b: Self) -> Self {
        (a + b) / Fp::from_num(2)
    }

    /// Returns some unit vector perpendicular to `self`.
    ///
    /// Probes with the up axis first and falls back to forward when the
    /// input is (anti)parallel to up. The zero vector yields zero.
    #[must_use]
    pub fn any_perpendicular(self) -> Self {
        let probe = self.cross(Self::UP);
        if probe.is_near(Self::ZERO, Fp::frac(1, 100)) {
            self.cross(Self::FORWARD).normalized()
        } else {
            probe.normalized()
        }
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Vec3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Vec3 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul<Fp> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: Fp) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Mul<Vec3> for Fp {
    type Output = Vec3;

    fn mul(self, rhs: Vec3) -> Vec3 {
        rhs * self
    }
}

impl Div<Fp> for Vec3 {
    type Output = Self;

    fn div(self, rhs: Fp) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x: {} | y: {} | z: {}", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: i64, y: i64, z: i64) -> Vec3 {
        Vec3::new(Fp::from_num(x), Fp::from_num(y), Fp::from_num(z))
    }

    #[test]
    fn dot_and_cross_follow_handedness() {
        assert_eq!(Vec3::FORWARD.dot(Vec3::RIGHT), Fp::ZERO);
        assert_eq!(Vec3::FORWARD.cross(Vec3::RIGHT), Vec3::UP);
        assert_eq!(Vec3::RIGHT.cross(Vec3::UP), Vec3::FORWARD);
        assert_eq!(Vec3::UP.cross(Vec3::FORWARD), Vec3::RIGHT);
    }

    #[test]
    fn length_of_pythagorean_triple() {
        assert_eq!(v(3, 4, 0).length(), Fp::from_num(5));
        assert_eq!(v(0, 0, 0).length(), Fp::ZERO);
    }

    #[test]
    fn normalize_zero_stays_zero() {
        assert_eq!(Vec3::ZERO.normalized(), Vec3::ZERO);
        assert_eq!(v(10, 0, 0).normalized(), Vec3::FORWARD);
    }

    #[test]
    fn direction_and_midpoint() {
        assert_eq!(Vec3::direction(v(0, 0, 0), v(5, 0, 0)), Vec3::FORWARD);
        assert_eq!(Vec3::midpoint(v(0, 0, 0), v(4, 2, 6)), v(2, 1, 3));
        assert_eq!(Vec3::distance(v(1, 0, 0), v(4, 4, 0)), Fp::from_num(5));
    }

    #[test]
    fn perpendicular_probe_is_perpendicular() {
        let cases = [v(1, 0, 0), v(0, 1, 0), v(0, 0, 1), v(1, 2, 3)];
        for case in cases {
            let perp = case.any_perpendicular();
            assert!(!perp.is_zero());
            assert!(case.dot(perp).is_near(Fp::ZERO, Fp::frac(1, 100)));
        }
    }

    #[test]
    fn opposite_direction_uses_dot_sign() {
        assert!(v(1, 0, 0).is_opposite_direction_to(v(-1, 0, 1)));
        assert!(!v(1, 0, 0).is_opposite_direction_to(v(0, 1, 0)));
    }
}
