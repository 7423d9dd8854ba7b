// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Overlap tests returning penetration direction and magnitude.
//!
//! Every query returns an [`ImpactResult`] whose direction points from
//! collider A into collider B (the direction A must be pushed against to
//! separate). Dispatch flips results for the reciprocal pair orders so the
//! convention holds regardless of argument order.

use rewind_core::{trig, Fp, Logger, Vec3};

use crate::collider::{CapsuleShape, Collider, OrientedBox};
use crate::helpers;
use crate::impact::ImpactResult;
use crate::ray::{Line, Ray};
use crate::simple;

/// Penetration-aware overlap test between any two colliders.
pub fn collide(log: &dyn Logger, a: &Collider, b: &Collider) -> ImpactResult {
    if !a.is_initialized() {
        log.error("Collider A was not initialized");
        return ImpactResult::no_collision();
    }
    if !b.is_initialized() {
        log.error("Collider B was not initialized");
        return ImpactResult::no_collision();
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
            // Reciprocal order: flip the direction back to A's perspective.
            return box_and_capsule(log, b, a).flipped();
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
            return box_and_sphere(log, b, a).flipped();
        }
        if b.is_capsule() {
            return capsule_and_sphere(log, b, a).flipped();
        }
        if b.is_sphere() {
            return sphere_and_sphere(log, a, b);
        }
    }

    log.error(&format!(
        "No penetration test for collider types: {}, {}",
        a.shape_name(),
        b.shape_name()
    ));
    ImpactResult::no_collision()
}

/// SAT penetration test between two boxes: track the axis with the smallest
/// overlap and orient it from A toward B.
pub fn box_and_box(log: &dyn Logger, box_a: &Collider, box_b: &Collider) -> ImpactResult {
    let (Some(a), Some(b)) = (box_a.as_box(), box_b.as_box()) else {
        log.error("box/box penetration query got mismatched collider types");
        return ImpactResult::no_collision();
    };

    let Some((mut axis, depth)) = simple::sat_smallest_overlap(&a, &b) else {
        return ImpactResult::no_collision();
    };

    // Orient the axis so it points from A into B.
    let a_to_b = Vec3::direction(a.center, b.center);
    if axis.dot(a_to_b) < Fp::ZERO {
        axis = axis.flipped();
    }

    ImpactResult::new(axis, depth)
}

/// Penetration test between two spheres.
pub fn sphere_and_sphere(log: &dyn Logger, sphere_a: &Collider, sphere_b: &Collider) -> ImpactResult {
    let (Some(a), Some(b)) = (sphere_a.as_sphere(), sphere_b.as_sphere()) else {
        log.error("sphere/sphere penetration query got mismatched collider types");
        return ImpactResult::no_collision();
    };

    let center_difference = b.center - a.center;
    let center_distance = center_difference.length();
    let depth = (a.radius + b.radius) - center_distance;
    if depth > Fp::ZERO {
        ImpactResult::new(center_difference.normalized(), depth)
    } else {
        ImpactResult::no_collision()
    }
}

/// Penetration test between a box and a sphere.
///
/// Ordinary case pushes along the closest-point offset; a sphere center
/// inside the box instead pushes out through the cheapest of the six faces,
/// plus the sphere radius.
pub fn box_and_sphere(log: &dyn Logger, boxed: &Collider, sphere: &Collider) -> ImpactResult {
    let (Some(b), Some(s)) = (boxed.as_box(), sphere.as_sphere()) else {
        log.error("box/sphere penetration query got mismatched collider types");
        return ImpactResult::no_collision();
    };

    let local_center = b.to_local_point(s.center);
    let closest = Vec3::new(
        local_center.x.clamp(-b.half_size.x, b.half_size.x),
        local_center.y.clamp(-b.half_size.y, b.half_size.y),
        local_center.z.clamp(-b.half_size.z, b.half_size.z),
    );
    let offset = local_center - closest;
    let distance = offset.length();

    if distance == Fp::ZERO {
        // Sphere center inside the box: push the center out to the nearest
        // face, then keep pushing until the surface clears.
        let (direction_world, distance_to_face) =
            smallest_push_to_outside_box(&b, local_center, None);
        return ImpactResult::new(direction_world, distance_to_face + s.radius);
    }

    let depth = s.radius - distance;
    if depth > Fp::ZERO {
        // The offset is in box-local space; the push direction must be world.
        ImpactResult::new(b.to_world_direction(offset.normalized()), depth)
    } else {
        ImpactResult::no_collision()
    }
}

/// Penetration test between a capsule and a sphere.
pub fn capsule_and_sphere(log: &dyn Logger, capsule: &Collider, sphere: &Collider) -> ImpactResult {
    let (Some(c), Some(s)) = (capsule.as_capsule(), sphere.as_sphere()) else {
        log.error("capsule/sphere penetration query got mismatched collider types");
        return ImpactResult::no_collision();
    };

    let medial = c.medial_line_world();
    let (_, closest_on_medial) = helpers::closest_point_on_segment(&medial, s.center);
    let distance_squared = Vec3::distance_squared(closest_on_medial, s.center);
    let combined_radius = s.radius + c.radius;
    if distance_squared >= combined_radius * combined_radius {
        return ImpactResult::no_collision();
    }

    let direction = if s.center.is_near(closest_on_medial, Fp::frac(1, 100)) {
        // Sphere center sits on the medial line; any perpendicular push
        // separates the pair.
        medial.direction().any_perpendicular()
    } else {
        Vec3::direction(closest_on_medial, s.center)
    };
    let depth = (trig::sqrt(distance_squared) - combined_radius).abs();
    ImpactResult::new(direction, depth)
}

/// Penetration test between two capsules.
pub fn capsule_and_capsule(
    log: &dyn Logger,
    capsule_a: &Collider,
    capsule_b: &Collider,
) -> ImpactResult {
    let (Some(a), Some(b)) = (capsule_a.as_capsule(), capsule_b.as_capsule()) else {
        log.error("capsule/capsule penetration query got mismatched collider types");
        return ImpactResult::no_collision();
    };

    let a_medial = a.medial_line_world();
    let b_medial = b.medial_line_world();
    let closest = helpers::closest_points_between_segments(&a_medial, &b_medial);
    let combined_radius = a.radius + b.radius;
    if closest.distance_squared >= combined_radius * combined_radius {
        return ImpactResult::no_collision();
    }

    let direction = if closest.on_a.is_near(closest.on_b, Fp::frac(1, 100)) {
        // The medial lines overlap: push perpendicular to both, or to any
        // perpendicular when they are parallel.
        let a_dir = a_medial.direction();
        let b_dir = b_medial.direction();
        let perpendicular = a_dir.cross(b_dir);
        if perpendicular.is_near(Vec3::ZERO, Fp::frac(1, 100)) {
            a_dir.any_perpendicular()
        } else {
            perpendicular.normalized()
        }
    } else {
        Vec3::direction(closest.on_a, closest.on_b)
    };
    let depth = (trig::sqrt(closest.distance_squared) - combined_radius).abs();
    ImpactResult::new(direction, depth)
}

/// Penetration test between a box and a capsule.
///
/// Reuses the boolean-layer expanded-box kernel for the intersection, then
/// derives the push from which medial endpoints sit inside the expanded box
/// (four sub-cases: both, start only, end only, neither).
pub fn box_and_capsule(log: &dyn Logger, boxed: &Collider, capsule: &Collider) -> ImpactResult {
    let (Some(b), Some(c)) = (boxed.as_box(), capsule.as_capsule()) else {
        log.error("box/capsule penetration query got mismatched collider types");
        return ImpactResult::no_collision();
    };

    let medial_world = c.medial_line_world();
    let medial_local =
        Line::new(b.to_local_point(medial_world.start), b.to_local_point(medial_world.end));
    let expanded = b.expanded(c.radius);

    let Some(hit) = simple::box_capsule_intersection(&b, &expanded, &medial_local, c.radius) else {
        return ImpactResult::no_collision();
    };

    box_capsule_penetration(&b, &c, &expanded, &medial_local, &hit.point)
}

fn box_capsule_penetration(
    boxed: &OrientedBox,
    capsule: &CapsuleShape,
    expanded: &OrientedBox,
    medial_local: &Line,
    initial_intersection: &Vec3,
) -> ImpactResult {
    // Endpoint containment is checked against the expanded box so a medial
    // line hovering just outside the original box but overlapping through
    // the capsule's width is still handled by the endpoint cases.
    let start_inside = expanded.contains_local_excluding_surface(medial_local.start);
    let end_inside = expanded.contains_local_excluding_surface(medial_local.end);
    let line_direction = medial_local.direction();

    if start_inside && end_inside {
        // Two escape options: slide the start endpoint forward out of the
        // box, or the end endpoint backward. Take the cheaper.
        let (from_start_dir, from_start_depth) =
            smallest_push_to_outside_box(expanded, medial_local.start, Some(line_direction));
        let (from_end_dir, from_end_depth) =
            smallest_push_to_outside_box(expanded, medial_local.end, Some(line_direction.flipped()));
        if from_end_depth < from_start_depth {
            return ImpactResult::new(from_end_dir, from_end_depth);
        }
        return ImpactResult::new(from_start_dir, from_start_depth);
    }
    if start_inside {
        let (direction, depth) =
            smallest_push_to_outside_box(expanded, medial_local.start, Some(line_direction));
        return ImpactResult::new(direction, depth);
    }
    if end_inside {
        let (direction, depth) =
            smallest_push_to_outside_box(expanded, medial_local.end, Some(line_direction.flipped()));
        return ImpactResult::new(direction, depth);
    }

    // Neither endpoint inside: the medial line punches through the box. The
    // whole intersection segment has to leave, so work from its midpoint and
    // push perpendicular to the line.
    let exit_intersection = simple::box_capsule_intersection(
        boxed,
        expanded,
        &medial_local.reversed(),
        capsule.radius,
    )
    .map_or(*initial_intersection, |hit| hit.point);
    let middle = Vec3::midpoint(*initial_intersection, exit_intersection);

    best_push_for_line_middle(boxed, expanded, middle, line_direction)
}

/// Push info for the midpoint of a through-going medial line:
/// nearest-face direction projected perpendicular to the line
/// (`lineDir × faceNormal × lineDir`), magnitude from a raycast against the
/// original box.
fn best_push_for_line_middle(
    boxed: &OrientedBox,
    expanded: &OrientedBox,
    middle: Vec3,
    line_direction: Vec3,
) -> ImpactResult {
    let (face_direction_world, face_distance) =
        smallest_push_to_outside_box(expanded, middle, None);
    let face_normal_local = expanded.to_local_direction(face_direction_world);

    // Perpendicular-to-line direction closest to the face normal. The other
    // association order would point the opposite way.
    let push_local = line_direction.cross(face_normal_local).cross(line_direction).normalized();
    let push_world = boxed.to_world_direction(push_local);

    let ray = Ray { origin: middle, direction: push_local };
    let magnitude = simple::raycast_local_aabb(boxed, &ray).map_or(face_distance, |hit| hit.t);

    ImpactResult::new(push_world, magnitude)
}

/// Cheapest push that moves `local_point` out of `boxed` through one of the
/// six faces, optionally filtering out faces whose outward normal opposes
/// `align_filter`. Returns the world-space direction and the distance.
///
/// Edges never beat faces here: the diagonal to an edge is always at least
/// as long as the straight push to one of its faces.
fn smallest_push_to_outside_box(
    boxed: &OrientedBox,
    local_point: Vec3,
    align_filter: Option<Vec3>,
) -> (Vec3, Fp) {
    let mut smallest_distance = Fp::MAX;
    let mut best_direction = Vec3::ZERO;

    for axis in [Vec3::FORWARD, Vec3::RIGHT, Vec3::UP] {
        let point_extent = axis.dot(local_point);
        let face_extent = axis.dot(boxed.half_size);

        if align_filter.map_or(true, |filter| filter.dot(axis) >= Fp::ZERO) {
            let distance = (face_extent - point_extent).abs();
            if distance < smallest_distance {
                smallest_distance = distance;
                best_direction = axis;
            }
        }

        let negative_axis = axis.flipped();
        if align_filter.map_or(true, |filter| filter.dot(negative_axis) >= Fp::ZERO) {
            let distance = (negative_axis.dot(boxed.half_size) - point_extent).abs();
            if distance < smallest_distance {
                smallest_distance = distance;
                best_direction = negative_axis;
            }
        }
    }

    (boxed.to_world_direction(best_direction), smallest_distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rewind_core::{NullLogger, Quat};

    fn fp(n: i64) -> Fp {
        Fp::from_num(n)
    }

    fn v(x: i64, y: i64, z: i64) -> Vec3 {
        Vec3::new(fp(x), fp(y), fp(z))
    }

    const LOG: NullLogger = NullLogger;

    #[test]
    fn sphere_sphere_overlap_matches_reference_scenario() {
        // A at origin r=1, B at (1.5, 0, 0) r=1 → direction +x, depth 0.5.
        let a = Collider::new_sphere(v(0, 0, 0), Fp::ONE);
        let b = Collider::new_sphere(Vec3::new(Fp::frac(3, 2), Fp::ZERO, Fp::ZERO), Fp::ONE);
        let impact = collide(&LOG, &a, &b);
        assert!(impact.is_colliding);
        assert_eq!(impact.penetration_direction, Vec3::FORWARD);
        assert_eq!(impact.penetration_magnitude, Fp::HALF);
    }

    #[test]
    fn box_box_minimum_translation_axis() {
        let a = Collider::new_box(v(0, 0, 0), Vec3::splat(Fp::ONE));
        let b = Collider::new_box(Vec3::new(Fp::frac(3, 2), Fp::ZERO, Fp::ZERO), Vec3::splat(Fp::ONE));
        let impact = collide(&LOG, &a, &b);
        assert!(impact.is_colliding);
        assert_eq!(impact.penetration_direction, Vec3::FORWARD);
        assert_eq!(impact.penetration_magnitude, Fp::HALF);
    }

    #[test]
    fn collision_symmetry_for_shape_pairs() {
        let tolerance = Fp::frac(1, 50);
        let shapes = [
            Collider::new_sphere(v(0, 0, 0), fp(2)),
            Collider::new_box(v(1, 0, 0), Vec3::splat(Fp::ONE)),
            Collider::new_capsule(v(0, 1, 0), Fp::ONE, fp(2)),
        ];
        for a in &shapes {
            for b in &shapes {
                if core::ptr::eq(a, b) {
                    continue;
                }
                let forward = collide(&LOG, a, b);
                let backward = collide(&LOG, b, a);
                assert_eq!(forward.is_colliding, backward.is_colliding);
                if forward.is_colliding {
                    assert!(forward
                        .penetration_direction
                        .is_near(-backward.penetration_direction, tolerance));
                    assert!(forward
                        .penetration_magnitude
                        .is_near(backward.penetration_magnitude, tolerance));
                }
            }
        }
    }

    #[test]
    fn sphere_inside_box_pushes_through_nearest_face() {
        let boxed = Collider::new_box(v(0, 0, 0), Vec3::splat(fp(2)));
        // Near the +x face.
        let sphere = Collider::new_sphere(Vec3::new(Fp::frac(3, 2), Fp::ZERO, Fp::ZERO), Fp::HALF);
        let impact = collide(&LOG, &boxed, &sphere);
        assert!(impact.is_colliding);
        // Direction from the box's perspective: the box pushes into the
        // sphere along −x... the push axis must be ±x with depth face
        // distance (0.5) + radius (0.5).
        assert_eq!(impact.penetration_direction.y, Fp::ZERO);
        assert_eq!(impact.penetration_direction.z, Fp::ZERO);
        assert_eq!(impact.penetration_magnitude, Fp::ONE);
    }

    #[test]
    fn capsule_sphere_on_medial_line_picks_perpendicular_push() {
        let capsule = Collider::new_capsule(v(0, 0, 0), Fp::ONE, fp(3));
        let sphere = Collider::new_sphere(v(0, 0, 1), Fp::HALF);
        let impact = collide(&LOG, &capsule, &sphere);
        assert!(impact.is_colliding);
        // Push must be perpendicular to the capsule axis (z).
        assert_eq!(impact.penetration_direction.z, Fp::ZERO);
        assert!(!impact.penetration_direction.is_zero());
    }

    #[test]
    fn parallel_overlapping_capsules_pick_some_perpendicular() {
        let a = Collider::new_capsule(v(0, 0, 0), Fp::ONE, fp(3));
        let b = Collider::new_capsule(v(0, 0, 0), Fp::ONE, fp(3));
        let impact = collide(&LOG, &a, &b);
        assert!(impact.is_colliding);
        assert!(!impact.penetration_direction.is_zero());
        assert!(impact
            .penetration_direction
            .dot(Vec3::UP)
            .is_near(Fp::ZERO, Fp::frac(1, 50)));
        // Fully coincident: depth is the combined radii.
        assert!(impact.penetration_magnitude.is_near(fp(2), Fp::frac(1, 20)));
    }

    #[test]
    fn separated_capsules_report_nothing() {
        let a = Collider::new_capsule(v(0, 0, 0), Fp::ONE, fp(2));
        let b = Collider::new_capsule(v(5, 0, 0), Fp::ONE, fp(2));
        assert!(!collide(&LOG, &a, &b).is_colliding);
    }

    #[test]
    fn box_capsule_side_overlap_pushes_sideways() {
        let boxed = Collider::new_box(v(0, 0, 0), Vec3::splat(Fp::ONE));
        // Upright capsule overlapping the +x face: medial endpoints are
        // inside the expanded box.
        let capsule =
            Collider::new_capsule(Vec3::new(Fp::frac(3, 2), Fp::ZERO, Fp::ZERO), Fp::ONE, Fp::frac(3, 2));
        let impact = collide(&LOG, &boxed, &capsule);
        assert!(impact.is_colliding);
        assert!(impact.penetration_magnitude > Fp::ZERO);

        // From the capsule's side, the direction must be the mirror image.
        let reciprocal = collide(&LOG, &capsule, &boxed);
        assert!(reciprocal.is_colliding);
        assert!(reciprocal
            .penetration_direction
            .is_near(-impact.penetration_direction, Fp::frac(1, 50)));
    }

    #[test]
    fn box_capsule_through_going_line_pushes_perpendicular() {
        let boxed = Collider::new_box(v(0, 0, 0), Vec3::splat(Fp::ONE));
        // Long horizontal capsule skewering the box near its top.
        let capsule = Collider::new_capsule_from_points(
            Vec3::new(fp(-10), Fp::ZERO, Fp::HALF),
            Vec3::new(fp(10), Fp::ZERO, Fp::HALF),
            Fp::HALF,
        );
        let impact = collide(&LOG, &boxed, &capsule);
        assert!(impact.is_colliding);
        // Push must be perpendicular to the capsule line (±x is forbidden).
        assert!(impact.penetration_direction.x.is_near(Fp::ZERO, Fp::frac(1, 50)));
        assert!(impact.penetration_magnitude > Fp::ZERO);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn coordinate() -> impl Strategy<Value = i64> {
            -6_i64..=6
        }

        proptest! {
            #[test]
            fn sphere_pair_penetration_is_antisymmetric(
                ax in coordinate(), ay in coordinate(), az in coordinate(),
                bx in coordinate(), by in coordinate(), bz in coordinate(),
                ra in 1_i64..=4, rb in 1_i64..=4,
            ) {
                let a = Collider::new_sphere(v(ax, ay, az), fp(ra));
                let b = Collider::new_sphere(v(bx, by, bz), fp(rb));
                let forward = collide(&LOG, &a, &b);
                let backward = collide(&LOG, &b, &a);
                prop_assert_eq!(forward.is_colliding, backward.is_colliding);
                if forward.is_colliding {
                    prop_assert!(forward
                        .penetration_direction
                        .is_near(-backward.penetration_direction, Fp::frac(1, 50)));
                    prop_assert!(forward
                        .penetration_magnitude
                        .is_near(backward.penetration_magnitude, Fp::frac(1, 50)));
                }
            }

            #[test]
            fn sphere_resolution_separates_the_pair(
                bx in 1_i64..=3, by in coordinate(), bz in coordinate(),
            ) {
                let moving = Collider::new_sphere(v(0, 0, 0), fp(2));
                let wall = Collider::new_sphere(v(bx, by, bz), fp(2));
                let impact = collide(&LOG, &moving, &wall);
                prop_assume!(impact.is_colliding);

                let result =
                    crate::resolve::resolve_collision(&impact, moving.center, Vec3::ZERO);
                let settled = moving.copy_with_center(result.position);
                prop_assert!(!collide(&LOG, &settled, &wall).is_colliding);
            }
        }
    }

    #[test]
    fn rotated_box_sphere_agrees_with_axis_aligned_equivalent() {
        // A box rotated 90° about up is geometrically the same box.
        let plain = Collider::new_box(v(0, 0, 0), Vec3::splat(Fp::ONE));
        let rotated = Collider::new_box_rotated(
            v(0, 0, 0),
            Quat::from_degrees(Vec3::UP, fp(90)),
            Vec3::splat(Fp::ONE),
        );
        let sphere = Collider::new_sphere(Vec3::new(Fp::frac(3, 2), Fp::ZERO, Fp::ZERO), Fp::ONE);
        let a = collide(&LOG, &plain, &sphere);
        let b = collide(&LOG, &rotated, &sphere);
        assert!(a.is_colliding && b.is_colliding);
        assert!(a.penetration_direction.is_near(b.penetration_direction, Fp::frac(1, 50)));
        assert!(a.penetration_magnitude.is_near(b.penetration_magnitude, Fp::frac(1, 50)));
    }
}
