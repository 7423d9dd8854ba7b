// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! rewind-geom: collider model and deterministic collision engine.
//!
//! Shapes are a small closed set (box, sphere, capsule) modeled as tagged
//! variants rather than a class hierarchy; all queries are pure functions in
//! fixed point. Invalid inputs never panic: the query logs a diagnostic
//! through the injected logger and surfaces the no-collision sentinel.
#![forbid(unsafe_code)]

/// Tagged collider model and shape projections.
pub mod collider;

/// Penetration query results.
pub mod impact;

/// Ray and finite line segment primitives.
pub mod ray;

/// Closest-point and axis-projection helpers shared by the query layers.
pub mod helpers;

/// Boolean overlap tests and ray/line queries.
pub mod simple;

/// Overlap tests returning penetration direction and magnitude.
pub mod complex;

/// Position/velocity correction from penetration info.
pub mod resolve;

/// Per-tick integration and bounded collision-resolution loop.
pub mod step;

pub use collider::{CapsuleShape, Collider, ColliderShape, OrientedBox, SphereShape};
pub use impact::ImpactResult;
pub use ray::{Line, Ray};
pub use simple::RayHit;
pub use step::{step_bodies, DynamicBody, StaticBody};
