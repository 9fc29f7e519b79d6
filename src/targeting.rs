//! Gaze and tap targeting of placed parts.
//!
//! Rays are tested against the [`PartCollider`]s attached by the sync
//! systems: a root's box decides which object is under the ray, then the
//! parts of that object are tested against their own triangles. Holding the
//! gaze on one part for [`PartTarget::dwell_time`] activates it once.

use bevy::math::Ray3d;
use bevy::prelude::*;

use crate::collider::PartCollider;
use crate::math::{ray_box_intersection, ray_triangle_intersection};

/// Distance along `ray` at which it hits `collider`, placed by `transform`.
///
/// The ray is moved into the collider's local space without renormalizing,
/// so the returned distance is in world units even under scaling. Mesh
/// colliders are tested per triangle after a bounds check; with no
/// triangles the bounds are the hit.
pub fn ray_hits_collider(ray: Ray3d, collider: &PartCollider, transform: &GlobalTransform) -> Option<f32> {
    let to_local = transform.affine().inverse();
    let origin = to_local.transform_point3(ray.origin);
    let direction = to_local.transform_vector3(*ray.direction);

    let bounds = collider.bounds();
    let entry = ray_box_intersection(origin, direction, bounds.min, bounds.max)?;
    match collider {
        PartCollider::Mesh { triangles, .. } if !triangles.is_empty() => triangles
            .iter()
            .filter_map(|tri| ray_triangle_intersection(origin, direction, *tri))
            .reduce(f32::min),
        _ => Some(entry),
    }
}

/// Nearest candidate hit by `ray`, with its distance.
pub fn pick_nearest<'a, K: Copy + 'a>(
    ray: Ray3d,
    candidates: impl IntoIterator<Item = (K, &'a PartCollider, &'a GlobalTransform)>,
) -> Option<(K, f32)> {
    candidates
        .into_iter()
        .filter_map(|(key, collider, transform)| {
            ray_hits_collider(ray, collider, transform).map(|t| (key, t))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// A part under the gaze or a tap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetedPart {
    /// The part entity.
    pub part: Entity,
    /// The placed object's root entity.
    pub root: Entity,
    /// Part name, shown as its label.
    pub name: String,
}

/// Targeting changes, for labels and highlight materials.
#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub enum PartTargetEvent {
    /// The gaze moved onto a part.
    Focused {
        /// The part entity.
        part: Entity,
        /// Part name.
        name: String,
    },
    /// The gaze stayed on a part for the dwell time.
    Activated {
        /// The part entity.
        part: Entity,
        /// Part name.
        name: String,
    },
    /// The gaze left every part.
    Cleared,
    /// A tap landed on a part.
    Selected {
        /// The part entity.
        part: Entity,
        /// Part name.
        name: String,
    },
}

/// Gaze targeting state.
#[derive(Resource, Debug, Clone)]
pub struct PartTarget {
    /// Seconds the gaze must rest on one part before it activates.
    pub dwell_time: f32,
    /// Whether the camera's forward ray targets parts each frame.
    pub gaze_enabled: bool,
    current: Option<TargetedPart>,
    timer: f32,
    activated: bool,
}

impl Default for PartTarget {
    fn default() -> Self {
        Self {
            dwell_time: 2.0,
            gaze_enabled: true,
            current: None,
            timer: 0.0,
            activated: false,
        }
    }
}

impl PartTarget {
    /// The part under the gaze, if any.
    pub fn current(&self) -> Option<&TargetedPart> {
        self.current.as_ref()
    }

    /// Whether the current part has been activated.
    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// Advances the dwell timer with this frame's gaze hit.
    pub fn update(&mut self, hit: Option<TargetedPart>, dt: f32) -> Option<PartTargetEvent> {
        match hit {
            Some(hit) if self.current.as_ref().is_some_and(|c| c.part == hit.part) => {
                self.timer += dt;
                if self.activated || self.timer < self.dwell_time {
                    return None;
                }
                self.activated = true;
                Some(PartTargetEvent::Activated {
                    part: hit.part,
                    name: hit.name,
                })
            }
            Some(hit) => {
                self.timer = 0.0;
                self.activated = false;
                let event = PartTargetEvent::Focused {
                    part: hit.part,
                    name: hit.name.clone(),
                };
                self.current = Some(hit);
                Some(event)
            }
            None => {
                self.timer = 0.0;
                self.activated = false;
                self.current.take().map(|_| PartTargetEvent::Cleared)
            }
        }
    }
}
