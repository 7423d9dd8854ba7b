// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Penetration query results.

use rewind_core::{Fp, Vec3};

/// Result of a penetration-aware overlap query.
///
/// When colliding, `penetration_direction` is the minimum-translation-vector
/// direction pointing from collider A *into* collider B (the direction A
/// must be pushed against to separate), and `penetration_magnitude` is the
/// non-negative depth along it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ImpactResult {
    /// Whether the pair overlaps at all.
    pub is_colliding: bool,
    /// Minimum-translation direction from A toward B. Zero when not colliding.
    pub penetration_direction: Vec3,
    /// Depth along the penetration direction. Never negative.
    pub penetration_magnitude: Fp,
}

impl ImpactResult {
    /// Builds a colliding result.
    #[must_use]
    pub fn new(penetration_direction: Vec3, penetration_magnitude: Fp) -> Self {
        Self { is_colliding: true, penetration_direction, penetration_magnitude }
    }

    /// The no-collision sentinel.
    #[must_use]
    pub fn no_collision() -> Self {
        Self {
            is_colliding: false,
            penetration_direction: Vec3::ZERO,
            penetration_magnitude: Fp::ZERO,
        }
    }

    /// Copies this result with the penetration direction negated, i.e. the
    /// same impact seen from the other collider's perspective.
    #[must_use]
    pub fn flipped(self) -> Self {
        Self { penetration_direction: -self.penetration_direction, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_negates_direction_only() {
        let impact = ImpactResult::new(Vec3::FORWARD, Fp::HALF);
        let flipped = impact.flipped();
        assert!(flipped.is_colliding);
        assert_eq!(flipped.penetration_direction, Vec3::BACKWARD);
        assert_eq!(flipped.penetration_magnitude, Fp::HALF);
    }

    #[test]
    fn sentinel_is_zeroed() {
        let none = ImpactResult::no_collision();
        assert!(!none.is_colliding);
        assert_eq!(none.penetration_direction, Vec3::ZERO);
        assert_eq!(none.penetration_magnitude, Fp::ZERO);
    }
}
