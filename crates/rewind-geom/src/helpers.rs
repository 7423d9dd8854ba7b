// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Closest-point and axis-projection helpers shared by the query layers.

use rewind_core::{Fp, Vec3};

use crate::ray::Line;

/// Closest points between two segments plus their squared distance.
#[derive(Debug, Copy, Clone)]
pub struct SegmentClosestPoints {
    /// Parameter of the closest point along segment A, in `[0, 1]`.
    pub s: Fp,
    /// Parameter of the closest point along segment B, in `[0, 1]`.
    pub t: Fp,
    /// Closest point on segment A.
    pub on_a: Vec3,
    /// Closest point on segment B.
    pub on_b: Vec3,
    /// Squared distance between the two closest points.
    pub distance_squared: Fp,
}

/// Computes the closest points between segments `a` and `b`.
///
/// Degenerate (zero-length) segments collapse to their start points.
#[must_use]
pub fn closest_points_between_segments(a: &Line, b: &Line) -> SegmentClosestPoints {
    let d1 = a.end - a.start;
    let d2 = b.end - b.start;
    let r = a.start - b.start;
    let len_sq_a = d1.dot(d1);
    let len_sq_b = d2.dot(d2);
    let proj_b = d2.dot(r);

    let mut s;
    let mut t;
    if len_sq_a == Fp::ZERO && len_sq_b == Fp::ZERO {
        s = Fp::ZERO;
        t = Fp::ZERO;
    } else if len_sq_a == Fp::ZERO {
        s = Fp::ZERO;
        t = (proj_b / len_sq_b).clamp(Fp::ZERO, Fp::ONE);
    } else {
        let proj_a = d1.dot(r);
        if len_sq_b == Fp::ZERO {
            t = Fp::ZERO;
            s = (-proj_a / len_sq_a).clamp(Fp::ZERO, Fp::ONE);
        } else {
            let cross_proj = d1.dot(d2);
            let denom = len_sq_a * len_sq_b - cross_proj * cross_proj;
            s = if denom == Fp::ZERO {
                // Parallel segments: any s works, pick the start.
                Fp::ZERO
            } else {
                ((cross_proj * proj_b - proj_a * len_sq_b) / denom).clamp(Fp::ZERO, Fp::ONE)
            };
            t = (cross_proj * s + proj_b) / len_sq_b;
            if t < Fp::ZERO {
                t = Fp::ZERO;
                s = (-proj_a / len_sq_a).clamp(Fp::ZERO, Fp::ONE);
            } else if t > Fp::ONE {
                t = Fp::ONE;
                s = ((cross_proj - proj_a) / len_sq_a).clamp(Fp::ZERO, Fp::ONE);
            }
        }
    }

    let on_a = a.start + d1 * s;
    let on_b = b.start + d2 * t;
    SegmentClosestPoints { s, t, on_a, on_b, distance_squared: (on_a - on_b).length_squared() }
}

/// Closest point on segment `segment` to `point`, with its parameter.
#[must_use]
pub fn closest_point_on_segment(segment: &Line, point: Vec3) -> (Fp, Vec3) {
    let d = segment.end - segment.start;
    let len_sq = d.dot(d);
    if len_sq == Fp::ZERO {
        return (Fp::ZERO, segment.start);
    }
    let t = ((point - segment.start).dot(d) / len_sq).clamp(Fp::ZERO, Fp::ONE);
    (t, segment.start + d * t)
}

/// Squared distance between `point` and segment `segment`.
#[must_use]
pub fn squared_distance_point_segment(segment: &Line, point: Vec3) -> Fp {
    let (_, closest) = closest_point_on_segment(segment, point);
    (point - closest).length_squared()
}

/// Overlap length of two vertex sets projected onto `axis`.
///
/// A positive result means the projections intersect along this axis; zero
/// or negative means the axis separates the sets.
#[must_use]
pub fn intersection_distance_along_axis(
    a_vertices: &[Vec3],
    b_vertices: &[Vec3],
    axis: Vec3,
) -> Fp {
    let (a_min, a_max) = projection_interval(a_vertices, axis);
    let (b_min, b_max) = projection_interval(b_vertices, axis);
    a_max.min(b_max) - a_min.max(b_min)
}

fn projection_interval(vertices: &[Vec3], axis: Vec3) -> (Fp, Fp) {
    let mut min = Fp::MAX;
    let mut max = Fp::MIN;
    for v in vertices {
        let projected = v.dot(axis);
        min = min.min(projected);
        max = max.max(projected);
    }
    (min, max)
}
