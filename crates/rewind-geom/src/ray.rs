// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Ray and finite line segment primitives.

use rewind_core::{Fp, Vec3};

/// A point in space with a unit direction extending forever.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Ray {
    /// Starting point.
    pub origin: Vec3,
    /// Unit direction. Normalization is enforced at construction.
    pub direction: Vec3,
}

impl Ray {
    /// Creates a ray, normalizing `direction`.
    ///
    /// A zero direction stays zero; queries treat such rays as stationary.
    #[must_use]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction: direction.normalized() }
    }

    /// Creates a ray starting at `from`, pointed at `to`.
    #[must_use]
    pub fn from_points(from: Vec3, to: Vec3) -> Self {
        Self::new(from, to - from)
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self { origin: Vec3::ZERO, direction: Vec3::UP }
    }
}

/// A directional finite segment between two points.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Line {
    /// Segment start.
    pub start: Vec3,
    /// Segment end.
    pub end: Vec3,
}

impl Line {
    /// Creates a segment from `start` to `end`.
    #[must_use]
    pub const fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    /// Segment length.
    #[must_use]
    pub fn length(&self) -> Fp {
        (self.end - self.start).length()
    }

    /// Squared segment length.
    #[must_use]
    pub fn length_squared(&self) -> Fp {
        (self.end - self.start).length_squared()
    }

    /// Normalized direction from start to end.
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        Vec3::direction(self.start, self.end)
    }

    /// The same segment traversed end to start.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self::new(self.end, self.start)
    }
}
