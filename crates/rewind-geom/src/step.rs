// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-tick integration and bounded collision-resolution loop.
//!
//! The scene registry lives outside this crate; each tick it projects its
//! entities into [`DynamicBody`] / [`StaticBody`] slices, runs
//! [`step_bodies`], and writes the results back. Slice order is the
//! iteration order, so determinism across peers reduces to the registry
//! handing over slices in a stable order.

use rewind_core::{ChecksumState, Fp, Logger, StateChecksum, Vec3, SECONDS_PER_FRAME};

use crate::collider::Collider;
use crate::complex;
use crate::resolve;

/// Maximum collision-resolution passes per entity per tick. Resolving one
/// contact can create another, so each pass retests everything; hitting the
/// cap is logged but not fatal.
pub const MAX_COLLISION_PASSES: u8 = 5;

/// Moving entity projection read and written by the per-tick loop.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DynamicBody {
    /// World position (kept in sync with `collider.center`).
    pub position: Vec3,
    /// Velocity in units per second.
    pub velocity: Vec3,
    /// Mass, used to arbitrate dynamic/dynamic contacts.
    pub mass: Fp,
    /// The entity's collision volume.
    pub collider: Collider,
    /// Hitstop marker: integration is suppressed while present.
    pub hitstop: bool,
}

impl DynamicBody {
    /// Builds a body from its collider, deriving the position from the
    /// collider center.
    #[must_use]
    pub fn new(collider: Collider, velocity: Vec3, mass: Fp) -> Self {
        Self { position: collider.center, velocity, mass, collider, hitstop: false }
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.collider.center = position;
    }
}

impl ChecksumState for DynamicBody {
    fn accumulate(&self, sum: &mut StateChecksum) {
        self.position.accumulate(sum);
        self.velocity.accumulate(sum);
        sum.write_fp(self.mass);
        self.collider.accumulate(sum);
        sum.write_bool(self.hitstop);
    }
}

/// Immovable scenery projection.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StaticBody {
    /// The entity's collision volume.
    pub collider: Collider,
}

/// Advances every dynamic body by one tick: integrate velocity, then run up
/// to [`MAX_COLLISION_PASSES`] resolution passes against all statics and
/// all *other* dynamics.
pub fn step_bodies(log: &dyn Logger, dynamics: &mut [DynamicBody], statics: &[StaticBody]) {
    for index in 0..dynamics.len() {
        integrate(&mut dynamics[index]);

        let mut passes: u8 = 0;
        while passes < MAX_COLLISION_PASSES {
            let any_contact = resolve_one_pass(log, dynamics, index, statics);
            if !any_contact {
                break;
            }
            passes += 1;
        }
        if passes >= MAX_COLLISION_PASSES {
            log.warn("Hit max collision resolution passes for a body this tick");
        }
    }
}

fn integrate(body: &mut DynamicBody) {
    if body.hitstop {
        return;
    }
    let next = body.position + body.velocity * SECONDS_PER_FRAME;
    body.set_position(next);
}

fn resolve_one_pass(
    log: &dyn Logger,
    dynamics: &mut [DynamicBody],
    index: usize,
    statics: &[StaticBody],
) -> bool {
    let mut any_contact = false;

    for wall in statics {
        let impact = complex::collide(log, &dynamics[index].collider, &wall.collider);
        if !impact.is_colliding {
            continue;
        }
        any_contact = true;
        let body = &mut dynamics[index];
        let result = resolve::resolve_collision(&impact, body.position, body.velocity);
        body.set_position(result.position);
        body.velocity = result.velocity;
    }

    for other in 0..dynamics.len() {
        if other == index {
            continue;
        }
        let impact = complex::collide(log, &dynamics[index].collider, &dynamics[other].collider);
        if !impact.is_colliding {
            continue;
        }
        any_contact = true;

        let shares =
            resolve::split_between_masses(impact.penetration_magnitude, dynamics[index].mass, dynamics[other].mass);

        // A zero share means this side is treated as immovable; skipping it
        // also keeps the clearing margin from nudging an untouched body.
        let (own_magnitude, own_reduction) = shares.first;
        if own_magnitude > Fp::ZERO {
            let body = &mut dynamics[index];
            let own = resolve::resolve_collision_scaled(
                impact.penetration_direction,
                own_magnitude,
                own_reduction,
                body.position,
                body.velocity,
            );
            body.set_position(own.position);
            body.velocity = own.velocity;
        }

        let (other_magnitude, other_reduction) = shares.second;
        if other_magnitude > Fp::ZERO {
            let body = &mut dynamics[other];
            let theirs = resolve::resolve_collision_scaled(
                impact.penetration_direction.flipped(),
                other_magnitude,
                other_reduction,
                body.position,
                body.velocity,
            );
            body.set_position(theirs.position);
            body.velocity = theirs.velocity;
        }
    }

    any_contact
}
