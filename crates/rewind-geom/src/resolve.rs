// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Position/velocity correction from penetration info.

use rewind_core::{Fp, Vec3};

use crate::impact::ImpactResult;

/// Extra clearance added to every positional correction so the next tick's
/// near-touch arithmetic cannot immediately re-trigger the same contact.
pub const PENETRATION_CLEARING_MARGIN: Fp = Fp::frac(1, 4);

/// Mass ratio at which the heavier of two dynamic bodies is treated as
/// immovable and the lighter absorbs the full correction.
pub const IMMOVABLE_MASS_RATIO: Fp = Fp::from_num(10);

/// Post-resolution position and velocity for one collider.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Corrected collider center.
    pub position: Vec3,
    /// Corrected velocity.
    pub velocity: Vec3,
}

/// Resolves a collision for the moving collider that caused it, removing
/// all velocity along the penetration direction.
#[must_use]
pub fn resolve_collision(impact: &ImpactResult, center: Vec3, velocity: Vec3) -> Resolution {
    resolve_collision_scaled(
        impact.penetration_direction,
        impact.penetration_magnitude,
        Fp::ONE,
        center,
        velocity,
    )
}

/// Resolves a collision with an explicit velocity-reduction fraction.
///
/// The collider center moves one penetration (plus clearing margin) against
/// the penetration direction. If the velocity has a component pushing into
/// the contact (`v·d > 0`), that component is reduced by
/// `velocity_reduction` ∈ `[0, 1]`; otherwise velocity is unchanged.
#[must_use]
pub fn resolve_collision_scaled(
    penetration_direction: Vec3,
    penetration_magnitude: Fp,
    velocity_reduction: Fp,
    center: Vec3,
    velocity: Vec3,
) -> Resolution {
    let push = penetration_direction * (penetration_magnitude + PENETRATION_CLEARING_MARGIN);
    // Subtracting the penetration gets rid of it.
    let position = center - push;

    let into_contact = velocity.dot(penetration_direction);
    let velocity = if into_contact > Fp::ZERO {
        // Parallel component causes the collision; perpendicular is
        // vector − parallel, so remove only the offending share.
        let parallel = penetration_direction * into_contact;
        velocity - parallel * velocity_reduction
    } else {
        velocity
    };

    Resolution { position, velocity }
}

/// How a dynamic/dynamic contact splits between the two bodies.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PairShares {
    /// Penetration share and velocity reduction applied to the first body.
    pub first: (Fp, Fp),
    /// Penetration share and velocity reduction applied to the second body.
    pub second: (Fp, Fp),
}

/// Splits a contact of `magnitude` between two dynamic bodies by mass.
///
/// Equal masses split the push in half with half velocity reduction each
/// (full removal feels awful when running into a stationary body of the
/// same weight). Past [`IMMOVABLE_MASS_RATIO`] the lighter body absorbs
/// everything. In between, the penetration distributes by total-mass share:
/// the lighter body takes the larger share, and each body's velocity
/// reduction equals its share.
#[must_use]
pub fn split_between_masses(magnitude: Fp, first_mass: Fp, second_mass: Fp) -> PairShares {
    if first_mass == second_mass {
        let half = magnitude / Fp::from_num(2);
        return PairShares { first: (half, Fp::HALF), second: (half, Fp::HALF) };
    }

    let (heavier, lighter) = if first_mass > second_mass {
        (first_mass, second_mass)
    } else {
        (second_mass, first_mass)
    };

    let (heavier_share, lighter_share) = if heavier / lighter >= IMMOVABLE_MASS_RATIO {
        ((Fp::ZERO, Fp::ZERO), (magnitude, Fp::ONE))
    } else {
        let total = heavier + lighter;
        let heavier_ratio = heavier / total;
        let lighter_ratio = Fp::ONE - heavier_ratio;
        let heavier_magnitude = magnitude * (Fp::ONE - heavier_ratio);
        (
            (heavier_magnitude, heavier_ratio),
            (magnitude - heavier_magnitude, lighter_ratio),
        )
    };

    if first_mass > second_mass {
        PairShares { first: heavier_share, second: lighter_share }
    } else {
        PairShares { first: lighter_share, second: heavier_share }
    }
}
