//! Math utilities for surface casting and transform manipulation.

use bevy::math::Ray3d;
use bevy::prelude::*;

/// Threshold for parallel plane/ray detection.
const PLANE_EPSILON: f32 = 1e-5;

/// Determinant below which a ray counts as parallel to a triangle.
const TRIANGLE_EPSILON: f32 = 1e-12;

/// Minimum squared horizontal distance for a facing direction to be usable.
const FACING_EPSILON_SQ: f32 = 1e-3;

/// Intersect a ray with a plane. Returns the distance along the ray and the
/// intersection point, if any.
pub fn ray_plane_intersection(
    ray: &Ray3d,
    plane_origin: Vec3,
    plane_normal: Vec3,
) -> Option<(f32, Vec3)> {
    let denom = plane_normal.dot(*ray.direction);
    if denom.abs() < PLANE_EPSILON {
        return None;
    }
    let t = (plane_origin - ray.origin).dot(plane_normal) / denom;
    if t < 0.0 {
        None
    } else {
        Some((t, ray.origin + *ray.direction * t))
    }
}

/// Intersect a ray with an axis-aligned box (slab test). Returns the ray
/// parameter of the entry point, or 0 when the origin is inside.
///
/// `direction` need not be normalized; the result is in units of it.
pub fn ray_box_intersection(origin: Vec3, direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let inv = direction.recip();
    let t1 = (min - origin) * inv;
    let t2 = (max - origin) * inv;
    let near = t1.min(t2).max_element().max(0.0);
    let far = t1.max(t2).min_element();
    (far >= near).then_some(near)
}

/// Intersect a ray with a triangle (Möller–Trumbore). Returns the ray
/// parameter of the hit, in units of `direction`.
pub fn ray_triangle_intersection(origin: Vec3, direction: Vec3, [a, b, c]: [Vec3; 3]) -> Option<f32> {
    let e1 = b - a;
    let e2 = c - a;
    let p = direction.cross(e2);
    let det = e1.dot(p);
    if det.abs() < TRIANGLE_EPSILON {
        return None;
    }
    let inv = det.recip();
    let s = origin - a;
    let u = s.dot(p) * inv;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = direction.dot(q) * inv;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(q) * inv;
    (t >= 0.0).then_some(t)
}

/// Rotation about world Y that makes an object at `from` face `target`.
///
/// The vertical component of the direction is dropped so the result never
/// pitches or rolls. Returns `None` when the target is (nearly) straight
/// above or below.
pub fn yaw_facing(from: Vec3, target: Vec3) -> Option<Quat> {
    let mut dir = target - from;
    dir.y = 0.0;
    if dir.length_squared() <= FACING_EPSILON_SQ {
        return None;
    }
    Some(Transform::IDENTITY.looking_to(dir, Vec3::Y).rotation)
}

/// Clamp every axis of `scale` into `[min, max]` independently.
///
/// Never panics; with `min > max` every axis ends up at `max`.
pub fn clamp_scale(scale: Vec3, min: f32, max: f32) -> Vec3 {
    scale.max(Vec3::splat(min)).min(Vec3::splat(max))
}

/// Hermite smoothstep of `t` clamped to [0, 1].
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_hits_plane_in_front() {
        let ray = Ray3d::new(Vec3::new(0.0, 2.0, 0.0), Dir3::NEG_Y);
        let (t, point) = ray_plane_intersection(&ray, Vec3::ZERO, Vec3::Y).unwrap();
        assert!((t - 2.0).abs() < 1e-6);
        assert!(point.abs_diff_eq(Vec3::ZERO, 1e-6));
    }

    #[test]
    fn ray_misses_parallel_and_behind_planes() {
        let ray = Ray3d::new(Vec3::new(0.0, 2.0, 0.0), Dir3::X);
        assert!(ray_plane_intersection(&ray, Vec3::ZERO, Vec3::Y).is_none());

        let ray = Ray3d::new(Vec3::new(0.0, 2.0, 0.0), Dir3::Y);
        assert!(ray_plane_intersection(&ray, Vec3::ZERO, Vec3::Y).is_none());
    }

    #[test]
    fn ray_enters_box_at_nearest_face() {
        let t = ray_box_intersection(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z, Vec3::splat(-0.5), Vec3::splat(0.5));
        assert_eq!(t, Some(4.5));
        // Inside counts as an immediate hit.
        assert_eq!(ray_box_intersection(Vec3::ZERO, Vec3::X, Vec3::splat(-1.0), Vec3::ONE), Some(0.0));
        // Behind and beside both miss.
        assert!(ray_box_intersection(Vec3::new(0.0, 0.0, 5.0), Vec3::Z, Vec3::splat(-0.5), Vec3::splat(0.5)).is_none());
        assert!(ray_box_intersection(Vec3::new(2.0, 0.0, 5.0), Vec3::NEG_Z, Vec3::splat(-0.5), Vec3::splat(0.5)).is_none());
    }

    #[test]
    fn ray_hits_triangle_inside_only() {
        let tri = [Vec3::ZERO, Vec3::X, Vec3::Y];
        let t = ray_triangle_intersection(Vec3::new(0.25, 0.25, 2.0), Vec3::new(0.0, 0.0, -2.0), tri);
        assert!((t.unwrap() - 1.0).abs() < 1e-6);
        assert!(ray_triangle_intersection(Vec3::new(0.75, 0.75, 2.0), Vec3::NEG_Z, tri).is_none());
        assert!(ray_triangle_intersection(Vec3::new(0.25, 0.25, 2.0), Vec3::X, tri).is_none());
    }

    #[test]
    fn yaw_facing_ignores_height_difference() {
        let rotation = yaw_facing(Vec3::ZERO, Vec3::new(0.0, 5.0, 3.0)).unwrap();
        let forward = rotation * Vec3::NEG_Z;
        assert!(forward.abs_diff_eq(Vec3::Z, 1e-5));
        assert!((rotation * Vec3::Y).abs_diff_eq(Vec3::Y, 1e-5));
    }

    #[test]
    fn yaw_facing_rejects_overhead_target() {
        assert!(yaw_facing(Vec3::ZERO, Vec3::new(0.0, 3.0, 0.01)).is_none());
    }

    #[test]
    fn clamp_scale_bounds_each_axis() {
        let clamped = clamp_scale(Vec3::new(0.01, 2.0, 40.0), 0.1, 5.0);
        assert_eq!(clamped, Vec3::new(0.1, 2.0, 5.0));
    }

    #[test]
    fn clamp_scale_with_inverted_limits_does_not_panic() {
        assert_eq!(clamp_scale(Vec3::ONE, 5.0, 0.1), Vec3::splat(0.1));
    }

    #[test]
    fn smoothstep_endpoints() {
        assert_eq!(smoothstep(-1.0), 0.0);
        assert_eq!(smoothstep(0.5), 0.5);
        assert_eq!(smoothstep(2.0), 1.0);
    }
}
