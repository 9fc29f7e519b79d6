//! Surface tracking and screen-point placement queries.
//!
//! A [`SurfaceProvider`] answers "what surface does this ray hit first". The
//! built-in [`TrackedPlanes`] resource holds bounded planes fed by an AR
//! backend (or a simulation) and casts against them.

use std::cmp::Ordering;

use bevy::math::Ray3d;
use bevy::prelude::*;

use crate::math::ray_plane_intersection;
use crate::types::PlacementPose;

/// Normals within this cosine of world up/down count as horizontal.
const HORIZONTAL_COS: f32 = 0.95;

/// Normals whose vertical component is below this count as vertical.
const VERTICAL_SIN: f32 = 0.05;

/// Orientation class of a tracked surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceAlignment {
    /// Floors and table tops.
    HorizontalUp,
    /// Ceilings.
    HorizontalDown,
    /// Walls.
    Vertical,
    /// Anything else.
    NotAxisAligned,
}

impl SurfaceAlignment {
    /// Classifies a surface normal.
    pub fn from_normal(normal: Vec3) -> Self {
        let n = normal.normalize_or_zero();
        if n.y >= HORIZONTAL_COS {
            SurfaceAlignment::HorizontalUp
        } else if n.y <= -HORIZONTAL_COS {
            SurfaceAlignment::HorizontalDown
        } else if n.y.abs() <= VERTICAL_SIN {
            SurfaceAlignment::Vertical
        } else {
            SurfaceAlignment::NotAxisAligned
        }
    }
}

/// A bounded planar surface.
///
/// The plane passes through `center` with normal `rotation * Y`; its polygon
/// is the rectangle spanned by `half_extents` along local X and Z.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedSurface {
    /// Backend-assigned identity.
    pub id: u64,
    /// Centre of the surface polygon.
    pub center: Vec3,
    /// Orientation; local +Y is the surface normal.
    pub rotation: Quat,
    /// Half size of the polygon along local X and Z.
    pub half_extents: Vec2,
}

impl TrackedSurface {
    /// Creates a surface.
    pub fn new(id: u64, center: Vec3, rotation: Quat, half_extents: Vec2) -> Self {
        Self {
            id,
            center,
            rotation,
            half_extents,
        }
    }

    /// A floor-like surface facing world up.
    pub fn horizontal(id: u64, center: Vec3, half_extents: Vec2) -> Self {
        Self::new(id, center, Quat::IDENTITY, half_extents)
    }

    /// Surface normal.
    pub fn normal(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Orientation class of the surface.
    pub fn alignment(&self) -> SurfaceAlignment {
        SurfaceAlignment::from_normal(self.normal())
    }

    /// Whether a point on the plane lies inside the surface polygon.
    pub fn contains(&self, point: Vec3) -> bool {
        let local = self.rotation.inverse() * (point - self.center);
        local.x.abs() <= self.half_extents.x && local.z.abs() <= self.half_extents.y
    }

    /// The four polygon corners in world space.
    pub fn corners(&self) -> [Vec3; 4] {
        let Vec2 { x, y } = self.half_extents;
        [
            Vec3::new(-x, 0.0, -y),
            Vec3::new(x, 0.0, -y),
            Vec3::new(x, 0.0, y),
            Vec3::new(-x, 0.0, y),
        ]
        .map(|c| self.center + self.rotation * c)
    }
}

/// A ray hit on a tracked surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceHit {
    /// Identity of the surface that was hit.
    pub surface: u64,
    /// Surface-aligned pose at the hit point.
    pub pose: PlacementPose,
    /// Distance along the ray.
    pub distance: f32,
}

/// Source of surface-tracking data.
pub trait SurfaceProvider {
    /// Casts `ray` against tracked surfaces, nearest hit first.
    fn cast(&self, ray: Ray3d) -> Vec<SurfaceHit>;

    /// Every currently tracked surface.
    fn surfaces(&self) -> &[TrackedSurface];
}

/// Resolves a ray to the pose of the first surface it hits.
pub fn locate_surface<P: SurfaceProvider + ?Sized>(provider: &P, ray: Ray3d) -> Option<PlacementPose> {
    provider.cast(ray).into_iter().next().map(|hit| hit.pose)
}

/// Converts a screen point into a world ray through the given camera.
pub fn screen_ray(camera: &Camera, camera_transform: &GlobalTransform, point: Vec2) -> Option<Ray3d> {
    camera.viewport_to_world(camera_transform, point).ok()
}

/// Surfaces reported by the tracking backend.
///
/// Backends call [`TrackedPlanes::upsert`] and [`TrackedPlanes::remove`] as
/// planes are detected, refined and lost.
#[derive(Resource, Debug, Clone, Default)]
pub struct TrackedPlanes {
    surfaces: Vec<TrackedSurface>,
}

impl TrackedPlanes {
    /// Inserts a surface or replaces the one with the same id.
    pub fn upsert(&mut self, surface: TrackedSurface) {
        match self.surfaces.iter_mut().find(|s| s.id == surface.id) {
            Some(existing) => *existing = surface,
            None => self.surfaces.push(surface),
        }
    }

    /// Drops a surface. Returns whether it was tracked.
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.surfaces.len();
        self.surfaces.retain(|s| s.id != id);
        self.surfaces.len() != before
    }

    /// Number of tracked surfaces.
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    /// Whether no surface is tracked.
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

impl SurfaceProvider for TrackedPlanes {
    fn cast(&self, ray: Ray3d) -> Vec<SurfaceHit> {
        let mut hits: Vec<SurfaceHit> = self
            .surfaces
            .iter()
            .filter_map(|surface| {
                let (distance, point) = ray_plane_intersection(&ray, surface.center, surface.normal())?;
                surface.contains(point).then(|| SurfaceHit {
                    surface: surface.id,
                    pose: PlacementPose::new(point, surface.rotation),
                    distance,
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));
        hits
    }

    fn surfaces(&self) -> &[TrackedSurface] {
        &self.surfaces
    }
}
