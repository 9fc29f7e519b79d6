//! Mirrors the registry into ECS entities.
//!
//! The registry is the only writer of placement state. These systems
//! reconcile entities against it: one root per registered object, one child
//! per model part, colliders once meshes are known.

use std::collections::HashSet;

use bevy::prelude::*;

use crate::collider::{build_part_collider, root_bounds, BoundingBox, PartCollider, PlacedPart, PlacedRoot};
use crate::registry::ObjectRegistry;
use crate::types::{PlacedObject, PlacementNotification};

/// Spawns, updates and despawns placed object entities to match the registry.
pub fn sync_placed_entities(
    mut commands: Commands,
    registry: Res<ObjectRegistry>,
    mut roots: Query<(Entity, &PlacedObject, &mut Transform), With<PlacedRoot>>,
) {
    if !registry.is_changed() {
        return;
    }

    let mut mirrored = HashSet::new();
    for (entity, object, mut transform) in &mut roots {
        match registry.get(object.model_index) {
            Some(entry) if entry.id == object.id => {
                if *transform != entry.transform {
                    *transform = entry.transform;
                }
                mirrored.insert(object.id);
            }
            _ => {
                debug!("despawning object {}", object.id);
                commands.entity(entity).despawn();
            }
        }
    }

    for entry in registry.iter() {
        if mirrored.contains(&entry.id) {
            continue;
        }
        let Some(template) = registry.template(entry.model_index) else {
            continue;
        };
        debug!("spawning entity for object {} ({})", entry.id, template.name);
        commands
            .spawn((
                Name::new(template.name.clone()),
                PlacedObject {
                    id: entry.id,
                    model_index: entry.model_index,
                },
                PlacedRoot,
                entry.transform,
                Visibility::default(),
            ))
            .with_children(|parent| {
                for part in template.parts_for(entry.variant_active) {
                    parent.spawn((
                        Name::new(part.name.clone()),
                        PlacedPart,
                        Mesh3d(part.mesh.clone()),
                        MeshMaterial3d(part.material.clone()),
                        part.offset,
                    ));
                }
            });
    }
}

/// Gives new parts a collider, then their root the union of the part bounds.
///
/// A part whose mesh is still loading is skipped until it arrives; only a
/// failed load, or an app without mesh assets, falls back to a box. Roots
/// wait until every part has a collider, so the root box lands one frame
/// after the parts'.
pub fn attach_part_colliders(
    mut commands: Commands,
    meshes: Option<Res<Assets<Mesh>>>,
    asset_server: Option<Res<AssetServer>>,
    parts: Query<(Entity, &Name, Option<&Mesh3d>), (With<PlacedPart>, Without<PartCollider>)>,
    roots: Query<(Entity, Option<&Children>), (With<PlacedRoot>, Without<PartCollider>)>,
    part_colliders: Query<(&PartCollider, &Transform), With<PlacedPart>>,
) {
    for (entity, name, mesh) in &parts {
        let mesh = match (mesh, meshes.as_deref()) {
            (Some(handle), Some(meshes)) => match meshes.get(&handle.0) {
                Some(mesh) => Some(mesh),
                None if load_failed(asset_server.as_deref(), &handle.0) => None,
                None => {
                    trace!("part '{name}' waits for its mesh");
                    continue;
                }
            },
            _ => None,
        };
        commands
            .entity(entity)
            .insert(build_part_collider(name.as_str(), mesh));
    }

    for (root, children) in &roots {
        let Some(children) = children else {
            commands
                .entity(root)
                .insert(PartCollider::Bounds(BoundingBox::UNIT));
            continue;
        };
        let colliders: Option<Vec<(&PartCollider, &Transform)>> = children
            .iter()
            .map(|child| part_colliders.get(child).ok())
            .collect();
        let Some(bounds) = colliders.and_then(|parts| root_bounds(parts)) else {
            continue;
        };
        trace!("root {root} bounds {bounds:?}");
        commands.entity(root).insert(PartCollider::Bounds(bounds));
    }
}

fn load_failed(asset_server: Option<&AssetServer>, handle: &Handle<Mesh>) -> bool {
    asset_server.is_some_and(|server| server.load_state(handle.id()).is_failed())
}

/// Publishes queued registry notifications as messages.
pub fn forward_notifications(
    mut registry: ResMut<ObjectRegistry>,
    mut notifications: MessageWriter<PlacementNotification>,
) {
    for notification in registry.bypass_change_detection().drain_notifications() {
        info!("{notification}");
        notifications.write(notification);
    }
}
