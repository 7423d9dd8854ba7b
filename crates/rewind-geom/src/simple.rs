// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Boolean overlap tests and ray/line queries.
//!
//! Every public query validates its collider shapes; a mismatched or
//! uninitialized collider logs an error through the injected logger and
//! reports no collision rather than panicking.
//!
//! Conventions:
//! - Raycast `t` is a *distance* along the unit ray direction.
//! - Linetest `t` is a *fraction* of the segment in `[0, 1]`.

use rewind_core::{Fp, Logger, Vec3};

use crate::collider::{Collider, OrientedBox};
use crate::helpers;
use crate::ray::{Line, Ray};

/// A ray or line intersection: parameter plus the hit point.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RayHit {
    /// Distance (raycast) or segment fraction (linetest) of the hit.
    pub t: Fp,
    /// Location of the hit.
    pub point: Vec3,
}

/// Boolean overlap test between any two colliders.
pub fn is_colliding(log: &dyn Logger, a: &Collider, b: &Collider) -> bool {
    if !a.is_initialized() {
        log.error("Collider A was not initialized");
        return false;
    }
    if !b.is_initialized() {
        log.error("Collider B was not initialized");
        return false;
    }

    if a.is_box() {
        if b.is_box() {
            return box_and_box(log, a, b);
        }
        if b.is_capsule() {
            return box_and_capsule(log, a, b);
        }
        if b.is_sphere() {
            return box_and_sphere(log, a, b);
        }
    }
    if a.is_capsule() {
        if b.is_box() {
            return box_and_capsule(log, b, a);
        }
        if b.is_capsule() {
            return capsule_and_capsule(log, a, b);
        }
        if b.is_sphere() {
            return capsule_and_sphere(log, a, b);
        }
    }
    if a.is_sphere() {
        if b.is_box() {
            return box_and_sphere(log, b, a);
        }
        if b.is_capsule() {
            return capsule_and_sphere(log, b, a);
        }
        if b.is_sphere() {
            return sphere_and_sphere(log, a, b);
        }
    }

    log.error(&format!(
        "No overlap test for collider types: {}, {}",
        a.shape_name(),
        b.shape_name()
    ));
    false
}

/// SAT overlap test between two oriented boxes.
///
/// Tests the 15 candidate axes (3 + 3 face normals, 9 cross products); a
/// zero cross product (parallel normals) is skipped, not treated as a
/// separator.
pub fn box_and_box(log: &dyn Logger, box_a: &Collider, box_b: &Collider) -> bool {
    let (Some(a), Some(b)) = (box_a.as_box(), box_b.as_box()) else {
        log_shape_mismatch(log, "box/box", box_a, box_b);
        return false;
    };
    sat_smallest_overlap(&a, &b).is_some()
}

/// Overlap test between two capsules: squared distance between medial
/// segments against the summed radii.
pub fn capsule_and_capsule(log: &dyn Logger, capsule_a: &Collider, capsule_b: &Collider) -> bool {
    let (Some(a), Some(b)) = (capsule_a.as_capsule(), capsule_b.as_capsule()) else {
        log_shape_mismatch(log, "capsule/capsule", capsule_a, capsule_b);
        return false;
    };
    let closest = helpers::closest_points_between_segments(
        &a.medial_line_world(),
        &b.medial_line_world(),
    );
    let combined_radius = a.radius + b.radius;
    closest.distance_squared < combined_radius * combined_radius
}

/// Overlap test between two spheres.
pub fn sphere_and_sphere(log: &dyn Logger, sphere_a: &Collider, sphere_b: &Collider) -> bool {
    let (Some(a), Some(b)) = (sphere_a.as_sphere(), sphere_b.as_sphere()) else {
        log_shape_mismatch(log, "sphere/sphere", sphere_a, sphere_b);
        return false;
    };
    let center_distance = Vec3::distance(a.center, b.center);
    (a.radius + b.radius) - center_distance > Fp::ZERO
}

/// Overlap test between a box and a sphere via the clamped closest point in
/// box-local space. A sphere center inside the box counts as colliding.
pub fn box_and_sphere(log: &dyn Logger, boxed: &Collider, sphere: &Collider) -> bool {
    let (Some(b), Some(s)) = (boxed.as_box(), sphere.as_sphere()) else {
        log_shape_mismatch(log, "box/sphere", boxed, sphere);
        return false;
    };

    let local_center = b.to_local_point(s.center);
    let closest = clamp_to_extents(local_center, b.half_size);
    let offset = local_center - closest;
    let distance = offset.length();
    if distance == Fp::ZERO {
        // Sphere center inside the box.
        return true;
    }
    s.radius - distance > Fp::ZERO
}

/// Overlap test between a box and a capsule.
///
/// Expands the box by the capsule radius and linetests the capsule medial
/// segment against it, classifying corner/edge/face regions against the
/// original extents.
pub fn box_and_capsule(log: &dyn Logger, boxed: &Collider, capsule: &Collider) -> bool {
    let (Some(b), Some(c)) = (boxed.as_box(), capsule.as_capsule()) else {
        log_shape_mismatch(log, "box/capsule", boxed, capsule);
        return false;
    };

    let medial_world = c.medial_line_world();
    let medial_local =
        Line::new(b.to_local_point(medial_world.start), b.to_local_point(medial_world.end));
    let expanded = b.expanded(c.radius);
    box_capsule_intersection(&b, &expanded, &medial_local, c.radius).is_some()
}

/// Overlap test between a capsule and a sphere.
pub fn capsule_and_sphere(log: &dyn Logger, capsule: &Collider, sphere: &Collider) -> bool {
    let (Some(c), Some(s)) = (capsule.as_capsule(), sphere.as_sphere()) else {
        log_shape_mismatch(log, "capsule/sphere", capsule, sphere);
        return false;
    };
    let distance_squared =
        helpers::squared_distance_point_segment(&c.medial_line_world(), s.center);
    let combined_radius = s.radius + c.radius;
    distance_squared < combined_radius * combined_radius
}

/// Raycast against a sphere. `t` is the distance along the ray; a ray
/// starting inside reports the exit hit.
pub fn raycast_sphere(log: &dyn Logger, ray: &Ray, sphere: &Collider) -> Option<RayHit> {
    let Some(s) = sphere.as_sphere() else {
        log.error(&format!("Raycast target was not a sphere but a {}", sphere.shape_name()));
        return None;
    };

    let origin_to_center = s.center - ray.origin;
    let center_distance_squared = origin_to_center.length_squared();
    let radius_squared = s.radius * s.radius;

    // Project the origin→center vector onto the (unit) ray direction, then
    // build the right triangle whose legs are that projection and the
    // center's lateral offset from the ray.
    let along = origin_to_center.dot(ray.direction);
    let lateral_squared = center_distance_squared - along * along;
    if radius_squared - lateral_squared < Fp::ZERO {
        return None;
    }
    let half_chord = rewind_core::trig::sqrt(radius_squared - lateral_squared);

    if center_distance_squared < radius_squared {
        // Origin inside the sphere: first surface hit is on the way out.
        let t = along + half_chord;
        return Some(RayHit { t, point: ray.origin + ray.direction * t });
    }
    let t = along - half_chord;
    if t >= Fp::ZERO {
        Some(RayHit { t, point: ray.origin + ray.direction * t })
    } else {
        // Sphere entirely behind the ray.
        None
    }
}

/// Raycast against an oriented box. `t` is the distance along the ray; a
/// ray starting inside reports the exit hit.
pub fn raycast_box(log: &dyn Logger, ray: &Ray, boxed: &Collider) -> Option<RayHit> {
    let Some(b) = boxed.as_box() else {
        log.error(&format!("Raycast target was not a box but a {}", boxed.shape_name()));
        return None;
    };

    let local_ray =
        Ray { origin: b.to_local_point(ray.origin), direction: b.to_local_direction(ray.direction) };
    let local_hit = raycast_local_aabb(&b, &local_ray)?;
    Some(RayHit { t: local_hit.t, point: b.to_world_point(local_hit.point) })
}

/// Linetest against an oriented box. The returned `t` is a distance along
/// the segment (the segment direction is unit length).
pub fn linetest_box(log: &dyn Logger, line: &Line, boxed: &Collider) -> Option<RayHit> {
    let ray = Ray::new(line.start, line.end - line.start);
    let hit = raycast_box(log, &ray, boxed)?;
    if hit.t >= Fp::ZERO && hit.t * hit.t <= line.length_squared() {
        Some(hit)
    } else {
        None
    }
}

/// Linetest against a capsule. The returned `t` is a fraction in `[0, 1]`.
pub fn linetest_capsule(log: &dyn Logger, line: &Line, capsule: &Collider) -> Option<RayHit> {
    let Some(c) = capsule.as_capsule() else {
        log.error(&format!("Linetest target was not a capsule but a {}", capsule.shape_name()));
        return None;
    };
    linetest_capsule_medial(line, &c.medial_line_world(), c.radius)
}

/// Linetest against a capsule given its medial segment and radius directly.
///
/// Comparing a line to a capsule is comparing two capsules with one radius
/// zero: if the line gets within `radius` of the medial segment there is an
/// intersection; the exact surface hit comes from a sphere raycast at the
/// closest medial point.
#[must_use]
pub fn linetest_capsule_medial(line: &Line, medial: &Line, radius: Fp) -> Option<RayHit> {
    let closest = helpers::closest_points_between_segments(line, medial);
    if closest.distance_squared > radius * radius {
        return None;
    }

    let line_length = line.length();
    if line_length == Fp::ZERO {
        // Degenerate test line that is within reach: report its start.
        return Some(RayHit { t: Fp::ZERO, point: line.start });
    }

    if closest.distance_squared.is_near(Fp::ZERO, Fp::frac(1, 100)) {
        // The test line crosses the medial segment itself, so the closest
        // medial point acts as a sphere center the line passes through; back
        // the hit up along the line by one radius.
        let t = closest.s - radius / line_length;
        if t < Fp::ZERO {
            // Line starts inside the capsule.
            return Some(RayHit { t: Fp::ZERO, point: line.start });
        }
        let reverse_direction = (line.start - line.end) / line_length;
        return Some(RayHit { t, point: closest.on_a + reverse_direction * radius });
    }

    // The line intersects some sphere centered on the medial segment; that
    // center is exactly the closest medial point, so raycast it for the
    // precise surface hit.
    let direction = (line.end - line.start) / line_length;
    let test_ray = Ray { origin: line.start, direction };
    let sphere = Collider::new_sphere(closest.on_b, radius);
    let Some(hit) = raycast_sphere(&rewind_core::NullLogger, &test_ray, &sphere) else {
        // Unreachable given the distance check, kept total for determinism.
        return Some(RayHit { t: Fp::ZERO, point: line.start });
    };
    // Raycast `t` is a distance; convert to a segment fraction.
    let t = hit.t / line_length;
    if t < Fp::ZERO || t > Fp::ONE {
        // Line sits inside the capsule without touching its surface.
        return Some(RayHit { t: Fp::ZERO, point: line.start });
    }
    Some(RayHit { t, point: hit.point })
}

/// Raycast against an AABB in box-local space (the local-space form of the
/// OBB raycast). Three-slab algorithm with two refinements:
///
/// - the exit time must clear a small positive epsilon, so a ray that only
///   grazes the surface at its origin does not count
/// - a segment lying entirely on one face is rejected by intersecting the
///   entry/exit touched-face sets
///
/// A ray starting strictly inside reports the exit hit.
#[must_use]
pub fn raycast_local_aabb(boxed: &OrientedBox, relative_ray: &Ray) -> Option<RayHit> {
    let near_zero = Fp::frac(1, 10_000);
    let box_min = -boxed.half_size;
    let box_max = boxed.half_size;

    let mut earliest = Fp::MIN;
    let mut latest = Fp::MAX;

    for axis in 0..3 {
        let direction = relative_ray.direction.axis(axis);
        let origin = relative_ray.origin.axis(axis);
        if direction.is_near(Fp::ZERO, near_zero) {
            // Not moving on this axis: no hit unless already inside the slab.
            if origin < box_min.axis(axis) || origin > box_max.axis(axis) {
                return None;
            }
        } else {
            let inverse = Fp::ONE / direction;
            let mut near_plane = (box_min.axis(axis) - origin) * inverse;
            let mut far_plane = (box_max.axis(axis) - origin) * inverse;
            if near_plane > far_plane {
                core::mem::swap(&mut near_plane, &mut far_plane);
            }
            earliest = earliest.max(near_plane);
            latest = latest.min(far_plane);
            if earliest > latest {
                return None;
            }
        }
    }

    // Exit at or behind the origin means the box is behind the ray (and a
    // ray merely starting on the surface is not an intersection).
    if latest <= Fp::frac(1, 1000) {
        return None;
    }

    let starts_inside = boxed.contains_local_excluding_surface(relative_ray.origin);
    if !starts_inside {
        // The intersection segment may only slide along the surface. If the
        // entry and exit points share a touched face, nothing entered the box.
        let entry = relative_ray.origin + relative_ray.direction * earliest;
        let exit = relative_ray.origin + relative_ray.direction * latest;
        let entry_faces = boxed.faces_touched_local(entry);
        let exit_faces = boxed.faces_touched_local(exit);
        if entry_faces.shares_face_with(&exit_faces) {
            return None;
        }
    }

    let t = if starts_inside { latest } else { earliest };
    Some(RayHit { t, point: relative_ray.origin + relative_ray.direction * t })
}

/// Shared box/capsule kernel in box-local space.
///
/// Linetests the capsule medial segment against the radius-expanded box and
/// classifies the hit against the *original* extents: a corner region
/// re-tests against the three edge capsules meeting at that vertex, an edge
/// region against the single edge capsule, and a face region accepts the
/// expanded-box hit. Returns the intersection as a fraction of the medial
/// segment.
#[must_use]
pub(crate) fn box_capsule_intersection(
    boxed: &OrientedBox,
    expanded: &OrientedBox,
    medial_local: &Line,
    radius: Fp,
) -> Option<RayHit> {
    let medial_length = medial_local.length();
    let test_ray = Ray::from_points(medial_local.start, medial_local.end);
    let hit = raycast_local_aabb(expanded, &test_ray)?;

    // Raycast time is distance; normalize to a fraction of the medial line.
    let mut t = if medial_length == Fp::ZERO { Fp::MAX } else { hit.t / medial_length };
    let mut point = hit.point;
    if t >= Fp::ONE {
        if expanded.contains_local_excluding_surface(medial_local.start) {
            // The medial segment sits inside the expanded box without
            // reaching its surface; the raycast alone cannot see this.
            t = Fp::ONE;
            point = medial_local.end;
        } else {
            // The box surface is beyond the end of the segment.
            return None;
        }
    }

    // Which original-extent faces the hit point lies outside of. The two
    // masks can never share a bit.
    let box_min = -boxed.half_size;
    let box_max = boxed.half_size;
    let mut below_min = 0_u32;
    let mut above_max = 0_u32;
    if point.x < box_min.x {
        below_min |= 1;
    }
    if point.x > box_max.x {
        above_max |= 1;
    }
    if point.y < box_min.y {
        below_min |= 2;
    }
    if point.y > box_max.y {
        above_max |= 2;
    }
    if point.z < box_min.z {
        below_min |= 4;
    }
    if point.z > box_max.z {
        above_max |= 4;
    }
    let mask = below_min + above_max;

    if mask == 7 {
        // Vertex region: intersect against the three edge capsules meeting
        // at the corner and keep the earliest hit.
        let corner = boxed.corner_local(above_max);
        let mut best: Option<RayHit> = None;
        for bit in [1_u32, 2, 4] {
            let edge = Line::new(corner, boxed.corner_local(above_max ^ bit));
            if let Some(edge_hit) = linetest_capsule_medial(medial_local, &edge, radius) {
                if best.map_or(true, |b| edge_hit.t < b.t) {
                    best = Some(edge_hit);
                }
            }
        }
        return best;
    }

    if (mask & mask.wrapping_sub(1)) == 0 {
        // Single bit (or the inside-the-box degenerate): face region; the
        // expanded-box hit is already correct.
        return Some(RayHit { t, point });
    }

    // Edge region: intersect against the capsule along that edge.
    let edge = Line::new(boxed.corner_local(below_min ^ 7), boxed.corner_local(above_max));
    linetest_capsule_medial(medial_local, &edge, radius)
}

fn clamp_to_extents(point: Vec3, half_size: Vec3) -> Vec3 {
    Vec3::new(
        point.x.clamp(-half_size.x, half_size.x),
        point.y.clamp(-half_size.y, half_size.y),
        point.z.clamp(-half_size.z, half_size.z),
    )
}

fn log_shape_mismatch(log: &dyn Logger, query: &str, a: &Collider, b: &Collider) {
    log.error(&format!(
        "{query} query got mismatched collider types: {}, {}",
        a.shape_name(),
        b.shape_name()
    ));
}

/// Smallest SAT overlap between two boxes, shared with the penetration
/// layer: `None` when a separating axis exists, otherwise the minimum
/// overlap and its (unit) axis.
pub(crate) fn sat_smallest_overlap(a: &OrientedBox, b: &OrientedBox) -> Option<(Vec3, Fp)> {
    let a_normals = a.normals_world();
    let b_normals = b.normals_world();
    let a_vertices = a.vertices_world();
    let b_vertices = b.vertices_world();

    let mut smallest: Option<(Vec3, Fp)> = None;

    let test_axis = |axis: Vec3, smallest: &mut Option<(Vec3, Fp)>| -> bool {
        // A zero axis comes from parallel normals; skip it rather than treat
        // it as a separator.
        if axis == Vec3::ZERO {
            return true;
        }
        let overlap = helpers::intersection_distance_along_axis(&a_vertices, &b_vertices, axis);
        if overlap <= Fp::ZERO {
            return false;
        }
        if smallest.map_or(true, |(_, best)| overlap < best) {
            *smallest = Some((axis, overlap));
        }
        true
    };

    for normal in a_normals.iter().chain(b_normals.iter()) {
        if !test_axis(*normal, &mut smallest) {
            return None;
        }
    }
    for a_normal in &a_normals {
        for b_normal in &b_normals {
            // Cross-product axes must be normalized for the overlap length
            // to be a real distance.
            let axis = a_normal.cross(*b_normal).normalized();
            if !test_axis(axis, &mut smallest) {
                return None;
            }
        }
    }

    smallest
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use rewind_core::{NullLogger, Quat, RecordingLogger};

    fn fp(n: i64) -> Fp {
        Fp::from_num(n)
    }

    fn v(x: i64, y: i64, z: i64) -> Vec3 {
        Vec3::new(fp(x), fp(y), fp(z))
    }

    fn unit_box_at(x: i64, y: i64, z: i64) -> Collider {
        Collider::new_box(v(x, y, z), Vec3::splat(Fp::ONE))
    }

    #[test]
    fn uninitialized_collider_logs_and_reports_no_collision() {
        let log = RecordingLogger::new();
        assert!(!is_colliding(&log, &Collider::default(), &unit_box_at(0, 0, 0)));
        assert_eq!(log.count_at(rewind_core::LogLevel::Error), 1);
    }

    #[test]
    fn overlapping_boxes_collide_and_separated_do_not() {
        let log = NullLogger;
        assert!(is_colliding(&log, &unit_box_at(0, 0, 0), &unit_box_at(1, 0, 0)));
        assert!(!is_colliding(&log, &unit_box_at(0, 0, 0), &unit_box_at(5, 0, 0)));
    }

    #[test]
    fn rotated_boxes_use_cross_product_axes() {
        let log = NullLogger;
        let a = unit_box_at(0, 0, 0);
        // 45° about up: corners reach sqrt(2) along x.
        let rotated = Collider::new_box_rotated(
            v(2, 0, 0),
            Quat::from_degrees(Vec3::UP, fp(45)),
            Vec3::splat(Fp::ONE),
        );
        assert!(is_colliding(&log, &a, &rotated));
        let far = Collider::new_box_rotated(
            v(3, 0, 0),
            Quat::from_degrees(Vec3::UP, fp(45)),
            Vec3::splat(Fp::ONE),
        );
        assert!(!is_colliding(&log, &a, &far));
    }

    #[test]
    fn spheres_collide_on_center_distance() {
        let log = NullLogger;
        let a = Collider::new_sphere(v(0, 0, 0), Fp::ONE);
        let near = Collider::new_sphere(v(1, 0, 0), Fp::ONE);
        let touching = Collider::new_sphere(v(2, 0, 0), Fp::ONE);
        assert!(is_colliding(&log, &a, &near));
        // Exactly touching surfaces do not count as colliding.
        assert!(!is_colliding(&log, &a, &touching));
    }

    #[test]
    fn capsules_collide_by_medial_distance() {
        let log = NullLogger;
        let a = Collider::new_capsule(v(0, 0, 0), Fp::ONE, fp(2));
        let b = Collider::new_capsule(v(1, 0, 0), Fp::ONE, fp(2));
        let c = Collider::new_capsule(v(3, 0, 0), Fp::ONE, fp(2));
        assert!(is_colliding(&log, &a, &b));
        assert!(!is_colliding(&log, &a, &c));
    }

    #[test]
    fn sphere_center_inside_box_collides() {
        let log = NullLogger;
        let boxed = unit_box_at(0, 0, 0);
        let inside = Collider::new_sphere(v(0, 0, 0), Fp::frac(1, 10));
        assert!(is_colliding(&log, &boxed, &inside));
        let outside_near = Collider::new_sphere(Vec3::new(fp(1), Fp::ZERO, Fp::ZERO), Fp::HALF);
        assert!(is_colliding(&log, &boxed, &outside_near));
        let outside_far = Collider::new_sphere(v(3, 0, 0), Fp::ONE);
        assert!(!is_colliding(&log, &boxed, &outside_far));
    }

    #[test]
    fn box_capsule_face_edge_and_corner_regions() {
        let log = NullLogger;
        let boxed = unit_box_at(0, 0, 0);

        // Face region: capsule dipping into the top face.
        let above = Collider::new_capsule(Vec3::new(Fp::ZERO, Fp::ZERO, Fp::frac(5, 2)), Fp::ONE, fp(2));
        assert!(is_colliding(&log, &boxed, &above));
        let far_above = Collider::new_capsule(v(0, 0, 5), Fp::ONE, fp(2));
        assert!(!is_colliding(&log, &boxed, &far_above));

        // Horizontal capsule reaching over an edge.
        let edge = Collider::new_capsule_from_points(
            Vec3::new(fp(2), Fp::ZERO, Fp::frac(3, 2)),
            Vec3::new(fp(-2), Fp::ZERO, Fp::frac(3, 2)),
            Fp::frac(3, 5),
        );
        assert!(is_colliding(&log, &boxed, &edge));
    }

    #[test]
    fn raycast_into_box_reports_entry_face() {
        let log = NullLogger;
        let boxed = unit_box_at(0, 0, 0);
        let ray = Ray::new(v(-5, 0, 0), Vec3::FORWARD);
        let hit = raycast_box(&log, &ray, &boxed).expect("ray must hit");
        assert_eq!(hit.t, fp(4));
        assert_eq!(hit.point, v(-1, 0, 0));
    }

    #[test]
    fn raycast_from_inside_reports_exit() {
        let log = NullLogger;
        let boxed = unit_box_at(0, 0, 0);
        let ray = Ray::new(v(0, 0, 0), Vec3::FORWARD);
        let hit = raycast_box(&log, &ray, &boxed).expect("ray must exit");
        assert_eq!(hit.t, Fp::ONE);
        assert_eq!(hit.point, v(1, 0, 0));
    }

    #[test]
    fn raycast_behind_box_misses() {
        let log = NullLogger;
        let boxed = unit_box_at(0, 0, 0);
        let ray = Ray::new(v(-5, 0, 0), Vec3::BACKWARD);
        assert!(raycast_box(&log, &ray, &boxed).is_none());
    }

    #[test]
    fn surface_sliding_ray_misses() {
        let log = NullLogger;
        let boxed = unit_box_at(0, 0, 0);
        // Travels along the top face without entering.
        let ray = Ray::new(Vec3::new(fp(-5), Fp::ZERO, Fp::ONE), Vec3::FORWARD);
        assert!(raycast_box(&log, &ray, &boxed).is_none());
    }

    #[test]
    fn raycast_sphere_hits_front_surface() {
        let log = NullLogger;
        let sphere = Collider::new_sphere(v(0, 0, 0), Fp::ONE);
        let ray = Ray::new(v(-5, 0, 0), Vec3::FORWARD);
        let hit = raycast_sphere(&log, &ray, &sphere).expect("must hit");
        assert_eq!(hit.t, fp(4));
        assert_eq!(hit.point, v(-1, 0, 0));
        // Inside start exits forward.
        let inside = Ray::new(v(0, 0, 0), Vec3::FORWARD);
        let exit = raycast_sphere(&log, &inside, &sphere).expect("must exit");
        assert_eq!(exit.t, Fp::ONE);
    }

    #[test]
    fn linetest_box_respects_segment_length() {
        let log = NullLogger;
        let boxed = unit_box_at(0, 0, 0);
        let reaching = Line::new(v(-5, 0, 0), v(0, 0, 0));
        assert!(linetest_box(&log, &reaching, &boxed).is_some());
        let short = Line::new(v(-5, 0, 0), v(-3, 0, 0));
        assert!(linetest_box(&log, &short, &boxed).is_none());
    }

    #[test]
    fn linetest_capsule_through_medial_line_backs_up_by_radius() {
        let log = NullLogger;
        let capsule = Collider::new_capsule(v(0, 0, 0), Fp::ONE, fp(2));
        // Straight through the capsule center, perpendicular to its axis.
        let line = Line::new(v(-5, 0, 0), v(5, 0, 0));
        let hit = linetest_capsule(&log, &line, &capsule).expect("must hit");
        // Entry surface at x = -1 → fraction (5 - 1) / 10.
        assert!(hit.t.is_near(Fp::frac(4, 10), Fp::frac(1, 100)));
        assert!(hit.point.is_near(v(-1, 0, 0), Fp::frac(2, 100)));
    }

    #[test]
    fn linetest_capsule_offset_hits_round_surface() {
        let log = NullLogger;
        let capsule = Collider::new_capsule(v(0, 0, 0), Fp::ONE, fp(2));
        let line = Line::new(Vec3::new(fp(-5), Fp::HALF, Fp::ZERO), v(5, 0, 0));
        assert!(linetest_capsule(&log, &line, &capsule).is_some());
        let miss = Line::new(v(-5, 3, 0), v(5, 3, 0));
        assert!(linetest_capsule(&log, &miss, &capsule).is_none());
    }

    #[test]
    fn line_starting_inside_capsule_reports_start() {
        let log = NullLogger;
        let capsule = Collider::new_capsule(v(0, 0, 0), fp(2), fp(3));
        let line = Line::new(v(0, 0, 0), v(5, 0, 0));
        let hit = linetest_capsule(&log, &line, &capsule).expect("inside counts");
        assert_eq!(hit.t, Fp::ZERO);
        assert_eq!(hit.point, v(0, 0, 0));
    }
}
