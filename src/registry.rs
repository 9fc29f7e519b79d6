//! The bounded registry of placed objects.
//!
//! [`ObjectRegistry`] is the only writer of placed-object state. Controllers
//! and systems go through its operations; the ECS entities that render the
//! objects are mirrored from it every frame.

use std::collections::{HashMap, VecDeque};

use bevy::prelude::*;

use crate::catalog::{spawn_scale, FallbackScales, ModelCatalog, ModelTemplate};
use crate::error::PlacementError;
use crate::math::yaw_facing;
use crate::types::{ModelIndex, PlacedId, PlacementNotification, PlacementPose, PlacementSettings};

/// A placed object.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedEntity {
    /// Identity; changes only when the object is respawned.
    pub id: PlacedId,
    /// Template the object was spawned from.
    pub model_index: ModelIndex,
    /// World transform.
    pub transform: Transform,
    /// Whether the template's alternate parts are shown.
    pub variant_active: bool,
}

/// Result of a successful [`ObjectRegistry::spawn_or_move`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// A new object was created, possibly after evicting the oldest one.
    Spawned {
        /// New object's id.
        id: PlacedId,
        /// Model index whose object was evicted to make room.
        evicted: Option<ModelIndex>,
    },
    /// The object already at that index was relocated.
    Moved {
        /// Relocated object's id.
        id: PlacedId,
    },
}

/// Placed objects keyed by model index, bounded and evicted oldest-first.
#[derive(Resource, Debug, Clone)]
pub struct ObjectRegistry {
    catalog: ModelCatalog,
    fallback_scales: FallbackScales,
    capacity: usize,
    float_height: f32,
    entries: HashMap<ModelIndex, PlacedEntity>,
    order: VecDeque<ModelIndex>,
    selected: ModelIndex,
    next_id: u64,
    first_placement_sent: bool,
    notifications: Vec<PlacementNotification>,
}

impl ObjectRegistry {
    /// Builds a registry over `catalog`.
    ///
    /// Fails when the catalog is empty or the capacity is zero; the plugin
    /// then leaves manipulation disabled.
    pub fn new(
        catalog: ModelCatalog,
        settings: &PlacementSettings,
        fallback_scales: FallbackScales,
    ) -> Result<Self, PlacementError> {
        if catalog.is_empty() {
            return Err(PlacementError::EmptyCatalog);
        }
        if settings.capacity == 0 {
            return Err(PlacementError::ZeroCapacity);
        }
        Ok(Self {
            catalog,
            fallback_scales,
            capacity: settings.capacity,
            float_height: settings.float_height,
            entries: HashMap::new(),
            order: VecDeque::new(),
            selected: 0,
            next_id: 0,
            first_placement_sent: false,
            notifications: Vec::new(),
        })
    }

    /// The catalog the registry spawns from.
    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Template at `index`.
    pub fn template(&self, index: ModelIndex) -> Option<&ModelTemplate> {
        self.catalog.get(index)
    }

    /// Maximum number of placed objects.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Hover distance above placement surfaces.
    pub fn float_height(&self) -> f32 {
        self.float_height
    }

    /// Currently selected model index.
    pub fn selected(&self) -> ModelIndex {
        self.selected
    }

    /// Number of placed objects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is placed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Object placed for `index`.
    pub fn get(&self, index: ModelIndex) -> Option<&PlacedEntity> {
        self.entries.get(&index)
    }

    /// Object placed for the selected index.
    pub fn current(&self) -> Option<&PlacedEntity> {
        self.entries.get(&self.selected)
    }

    /// Placed model indices, oldest first.
    pub fn order(&self) -> Vec<ModelIndex> {
        self.order.iter().copied().collect()
    }

    /// Placed objects, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &PlacedEntity> {
        self.order.iter().filter_map(|index| self.entries.get(index))
    }

    /// Selects the next template, wrapping around. Placed objects are untouched.
    pub fn cycle_model(&mut self) -> ModelIndex {
        self.selected = (self.selected + 1) % self.catalog.len();
        info!(
            "selected model {} ({})",
            self.selected,
            self.catalog.get(self.selected).map_or("?", |t| t.name.as_str())
        );
        self.selected
    }

    /// Places the object for `index` at `pose`.
    ///
    /// An object already at `index` is relocated and keeps its identity.
    /// Otherwise the oldest object is evicted if the registry is full and a
    /// new one is created at the template's spawn scale. In both cases the
    /// object then turns about world Y to face `viewer`, when known.
    pub fn spawn_or_move(
        &mut self,
        index: ModelIndex,
        pose: PlacementPose,
        viewer: Option<Vec3>,
    ) -> Result<Placement, PlacementError> {
        let Some(template) = self.catalog.get(index) else {
            return Err(PlacementError::InvalidModelIndex {
                index,
                len: self.catalog.len(),
            });
        };

        let position = pose.position + pose.up() * self.float_height;

        let placement = if let Some(existing) = self.entries.get_mut(&index) {
            existing.transform.translation = position;
            existing.transform.rotation = pose.rotation;
            debug!("moved object {} at index {index}", existing.id);
            Placement::Moved { id: existing.id }
        } else {
            let scale = spawn_scale(template, index, &self.fallback_scales);
            let evicted = self.make_room();
            let id = self.allocate_id();
            self.entries.insert(
                index,
                PlacedEntity {
                    id,
                    model_index: index,
                    transform: Transform::from_translation(position).with_scale(scale),
                    variant_active: false,
                },
            );
            self.order.push_back(index);
            info!("spawned object {id} at index {index} with scale {scale}");

            if !self.first_placement_sent {
                self.first_placement_sent = true;
                self.notify(PlacementNotification::FirstPlacement);
            }
            Placement::Spawned { id, evicted }
        };

        if let (Some(viewer), Some(entry)) = (viewer, self.entries.get_mut(&index)) {
            if let Some(rotation) = yaw_facing(entry.transform.translation, viewer) {
                entry.transform.rotation = rotation;
            }
        }

        Ok(placement)
    }

    /// [`Self::spawn_or_move`] for the selected index.
    pub fn place_selected(
        &mut self,
        pose: PlacementPose,
        viewer: Option<Vec3>,
    ) -> Result<Placement, PlacementError> {
        self.spawn_or_move(self.selected, pose, viewer)
    }

    /// Removes the object at `index`.
    pub fn delete(&mut self, index: ModelIndex) -> Result<PlacedEntity, PlacementError> {
        let removed = self
            .entries
            .remove(&index)
            .ok_or(PlacementError::NothingToDelete(index))?;
        self.order.retain(|i| *i != index);
        info!(
            "deleted object {} at index {index}, {} remaining",
            removed.id,
            self.entries.len()
        );
        Ok(removed)
    }

    /// Removes the selected index's object.
    pub fn delete_selected(&mut self) -> Result<PlacedEntity, PlacementError> {
        self.delete(self.selected)
    }

    /// Swaps the object at `index` between its main and alternate parts.
    ///
    /// The object is respawned with a new id but keeps its transform and its
    /// place in the eviction order.
    pub fn toggle_variant(&mut self, index: ModelIndex) -> Result<PlacedId, PlacementError> {
        let has_variant = self
            .catalog
            .get(index)
            .is_some_and(|template| template.variant.is_some());
        if !has_variant {
            return Err(PlacementError::NoVariant(index));
        }
        if !self.entries.contains_key(&index) {
            return Err(PlacementError::NotPlaced(index));
        }

        let id = self.allocate_id();
        let entry = self
            .entries
            .get_mut(&index)
            .ok_or(PlacementError::NotPlaced(index))?;
        entry.id = id;
        entry.variant_active = !entry.variant_active;
        info!(
            "switched index {index} to {} parts as object {id}",
            if entry.variant_active { "variant" } else { "main" }
        );
        Ok(id)
    }

    /// Moves the selected object to `pose` exactly, without float offset or facing.
    pub fn set_current_pose(&mut self, pose: PlacementPose) -> Option<PlacedId> {
        let entry = self.entries.get_mut(&self.selected)?;
        entry.transform.translation = pose.position;
        entry.transform.rotation = pose.rotation;
        Some(entry.id)
    }

    /// Replaces the selected object's scale.
    pub fn set_current_scale(&mut self, scale: Vec3) -> Option<PlacedId> {
        let entry = self.entries.get_mut(&self.selected)?;
        entry.transform.scale = scale;
        Some(entry.id)
    }

    /// Applies a world-space rotation to the selected object.
    pub fn rotate_current(&mut self, rotation: Quat) -> Option<PlacedId> {
        let entry = self.entries.get_mut(&self.selected)?;
        entry.transform.rotation = (rotation * entry.transform.rotation).normalize();
        Some(entry.id)
    }

    /// Queues a notification for observers.
    pub fn notify(&mut self, notification: PlacementNotification) {
        debug!("notification {notification}");
        self.notifications.push(notification);
    }

    /// Takes every queued notification, oldest first.
    pub fn drain_notifications(&mut self) -> Vec<PlacementNotification> {
        std::mem::take(&mut self.notifications)
    }

    fn allocate_id(&mut self) -> PlacedId {
        let id = PlacedId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Evicts the oldest object while the registry is full.
    fn make_room(&mut self) -> Option<ModelIndex> {
        let mut evicted = None;
        while self.entries.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if let Some(entry) = self.entries.remove(&oldest) {
                info!("evicted object {} at index {oldest} to make room", entry.id);
                evicted = Some(oldest);
            }
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(n: usize) -> ModelCatalog {
        ModelCatalog::new((0..n).map(|i| ModelTemplate::new(format!("bone {i}"))).collect())
    }

    fn registry(n: usize) -> ObjectRegistry {
        ObjectRegistry::new(catalog(n), &PlacementSettings::default(), FallbackScales::uniform()).unwrap()
    }

    fn floor(x: f32) -> PlacementPose {
        PlacementPose::new(Vec3::new(x, 0.0, 0.0), Quat::IDENTITY)
    }

    fn assert_consistent(registry: &ObjectRegistry) {
        let order = registry.order();
        let mut sorted = order.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), order.len(), "duplicate keys in {order:?}");
        assert_eq!(order.len(), registry.len());
        for index in &order {
            assert!(registry.get(*index).is_some());
        }
        assert!(registry.len() <= registry.capacity());
    }

    #[test]
    fn rejects_empty_catalog_and_zero_capacity() {
        let err = ObjectRegistry::new(ModelCatalog::default(), &PlacementSettings::default(), FallbackScales::uniform())
            .unwrap_err();
        assert!(matches!(err, PlacementError::EmptyCatalog));

        let settings = PlacementSettings {
            capacity: 0,
            ..default()
        };
        let err = ObjectRegistry::new(catalog(1), &settings, FallbackScales::uniform()).unwrap_err();
        assert!(matches!(err, PlacementError::ZeroCapacity));
    }

    #[test]
    fn spawn_then_evict_oldest() {
        let mut registry = registry(3);
        registry.spawn_or_move(0, floor(0.0), None).unwrap();
        registry.spawn_or_move(1, floor(1.0), None).unwrap();
        let placement = registry.spawn_or_move(2, floor(2.0), None).unwrap();

        assert!(matches!(placement, Placement::Spawned { evicted: Some(0), .. }));
        assert!(registry.get(0).is_none());
        assert_eq!(registry.order(), vec![1, 2]);
        assert_consistent(&registry);
    }

    #[test]
    fn bound_and_fifo_hold_over_long_sequences() {
        let mut registry = registry(6);
        let script = [0, 1, 2, 1, 3, 3, 5, 0, 4, 2, 2, 5, 1];
        for (step, index) in script.into_iter().enumerate() {
            registry.spawn_or_move(index, floor(step as f32), None).unwrap();
            if step % 4 == 3 {
                let _ = registry.delete(index);
            }
            assert_consistent(&registry);
        }
    }

    #[test]
    fn respawn_at_occupied_index_moves_same_object() {
        let mut registry = registry(2);
        let Placement::Spawned { id, .. } = registry.spawn_or_move(0, floor(0.0), None).unwrap() else {
            panic!("expected a spawn");
        };
        let placement = registry.spawn_or_move(0, floor(3.0), None).unwrap();

        assert_eq!(placement, Placement::Moved { id });
        assert_eq!(registry.len(), 1);
        let entry = registry.get(0).unwrap();
        assert_eq!(entry.id, id);
        assert!(entry.transform.translation.abs_diff_eq(Vec3::new(3.0, 0.1, 0.0), 1e-6));
    }

    #[test]
    fn spawn_applies_float_height_along_surface_normal() {
        let mut registry = registry(1);
        let wall = PlacementPose::new(Vec3::new(0.0, 1.0, -2.0), Quat::from_rotation_arc(Vec3::Y, Vec3::Z));
        registry.spawn_or_move(0, wall, None).unwrap();
        let translation = registry.get(0).unwrap().transform.translation;
        assert!(translation.abs_diff_eq(Vec3::new(0.0, 1.0, -1.9), 1e-5));
    }

    #[test]
    fn spawn_uses_policy_scale() {
        let catalog = ModelCatalog::new(vec![
            ModelTemplate::new("Femur").with_base_scale(Vec3::splat(2.0)),
            ModelTemplate::new("small patella"),
        ]);
        let mut registry =
            ObjectRegistry::new(catalog, &PlacementSettings::default(), FallbackScales::default()).unwrap();
        registry.spawn_or_move(0, floor(0.0), None).unwrap();
        registry.spawn_or_move(1, floor(1.0), None).unwrap();

        assert_eq!(registry.get(0).unwrap().transform.scale, Vec3::ONE);
        assert_eq!(registry.get(1).unwrap().transform.scale, Vec3::splat(0.5));
    }

    #[test]
    fn first_placement_fires_once() {
        let mut registry = registry(3);
        registry.spawn_or_move(0, floor(0.0), None).unwrap();
        registry.delete(0).unwrap();
        registry.spawn_or_move(0, floor(0.0), None).unwrap();
        registry.spawn_or_move(1, floor(0.0), None).unwrap();
        registry.spawn_or_move(2, floor(0.0), None).unwrap();

        let firsts = registry
            .drain_notifications()
            .into_iter()
            .filter(|n| *n == PlacementNotification::FirstPlacement)
            .count();
        assert_eq!(firsts, 1);
        assert!(registry.drain_notifications().is_empty());
    }

    #[test]
    fn delete_absent_key_is_reported_and_harmless() {
        let mut registry = registry(3);
        registry.spawn_or_move(1, floor(0.0), None).unwrap();

        let err = registry.delete(2).unwrap_err();
        assert!(matches!(err, PlacementError::NothingToDelete(2)));
        assert_eq!(registry.order(), vec![1]);
        assert_consistent(&registry);
    }

    #[test]
    fn delete_removes_key_from_order() {
        let mut registry = registry(3);
        registry.spawn_or_move(0, floor(0.0), None).unwrap();
        registry.spawn_or_move(1, floor(0.0), None).unwrap();
        registry.delete(0).unwrap();
        registry.spawn_or_move(2, floor(0.0), None).unwrap();

        assert_eq!(registry.order(), vec![1, 2]);
        assert_consistent(&registry);
    }

    #[test]
    fn facing_is_yaw_only() {
        let mut registry = registry(1);
        let camera = Vec3::new(2.0, 1.6, 2.0);
        registry.spawn_or_move(0, floor(0.0), Some(camera)).unwrap();

        let rotation = registry.get(0).unwrap().transform.rotation;
        assert!((rotation * Vec3::Y).abs_diff_eq(Vec3::Y, 1e-5));
        let forward = rotation * Vec3::NEG_Z;
        assert!(forward.y.abs() < 1e-5);
        assert!(forward.abs_diff_eq(Vec3::new(1.0, 0.0, 1.0).normalize(), 1e-5));
    }

    #[test]
    fn viewer_overhead_keeps_pose_rotation() {
        let mut registry = registry(1);
        let tilted = Quat::from_rotation_y(1.0);
        let pose = PlacementPose::new(Vec3::ZERO, tilted);
        registry.spawn_or_move(0, pose, None).unwrap();
        registry.spawn_or_move(0, pose, Some(Vec3::new(0.0, 2.0, 0.0))).unwrap();
        assert!(registry.get(0).unwrap().transform.rotation.abs_diff_eq(tilted, 1e-5));
    }

    #[test]
    fn cycle_wraps_and_leaves_objects_alone() {
        let mut registry = registry(3);
        registry.place_selected(floor(0.0), None).unwrap();
        assert_eq!(registry.cycle_model(), 1);
        assert_eq!(registry.cycle_model(), 2);
        assert_eq!(registry.cycle_model(), 0);
        assert_eq!(registry.len(), 1);
        assert!(registry.current().is_some());

        registry.cycle_model();
        assert!(registry.current().is_none());
    }

    #[test]
    fn invalid_index_is_rejected() {
        let mut registry = registry(2);
        let err = registry.spawn_or_move(5, floor(0.0), None).unwrap_err();
        assert!(matches!(err, PlacementError::InvalidModelIndex { index: 5, len: 2 }));
        assert!(registry.is_empty());
    }

    #[test]
    fn toggle_variant_respawns_in_place() {
        let part = crate::catalog::ModelPart::new("head", Handle::default(), Handle::default());
        let catalog = ModelCatalog::new(vec![
            ModelTemplate::new("Femur").with_part(part.clone()).with_variant(vec![part]),
            ModelTemplate::new("Tibia"),
        ]);
        let mut registry =
            ObjectRegistry::new(catalog, &PlacementSettings::default(), FallbackScales::uniform()).unwrap();

        assert!(matches!(registry.toggle_variant(0), Err(PlacementError::NotPlaced(0))));
        registry.spawn_or_move(0, floor(0.0), None).unwrap();
        registry.spawn_or_move(1, floor(1.0), None).unwrap();
        assert!(matches!(registry.toggle_variant(1), Err(PlacementError::NoVariant(1))));

        let before = registry.get(0).unwrap().clone();
        let id = registry.toggle_variant(0).unwrap();
        let after = registry.get(0).unwrap();
        assert_ne!(id, before.id);
        assert!(after.variant_active);
        assert_eq!(after.transform, before.transform);
        assert_eq!(registry.order(), vec![0, 1]);
    }

    #[test]
    fn mutators_touch_only_the_selected_object() {
        let mut registry = registry(2);
        registry.spawn_or_move(1, floor(0.0), None).unwrap();
        assert!(registry.set_current_scale(Vec3::splat(2.0)).is_none());

        registry.cycle_model();
        assert!(registry.set_current_scale(Vec3::splat(2.0)).is_some());
        assert!(registry.rotate_current(Quat::from_rotation_y(0.5)).is_some());
        assert_eq!(registry.get(1).unwrap().transform.scale, Vec3::splat(2.0));
    }
}
