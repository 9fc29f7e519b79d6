//! Touch input and manipulation systems.
//!
//! This module turns raw touches into [`GestureIntent`] messages, routes them
//! and UI commands into the [`ObjectRegistry`], targets parts by gaze and
//! tap, and advances the timed helpers (auto placement, tutorial panel,
//! model banner).

use bevy::input::touch::Touches;
use bevy::math::Ray3d;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::auto_spawn::AutoSpawn;
use crate::catalog::{FallbackScales, ModelCatalog};
use crate::collider::{PartCollider, PlacedPart, PlacedRoot};
use crate::controllers::ManipulationControllers;
use crate::gesture::GestureInterpreter;
use crate::registry::ObjectRegistry;
use crate::sequence::ModelBanner;
use crate::surface::{locate_surface, screen_ray, TrackedPlanes};
use crate::targeting::{pick_nearest, ray_hits_collider, PartTarget, PartTargetEvent, TargetedPart};
use crate::tutorial::{Tutorial, TutorialCommand};
use crate::types::{
    ContactPhase, GestureIntent, GestureSettings, ManipulationSettings, PlacedObject,
    PlacementCamera, PlacementCommand, PlacementNotification, PlacementPose, PlacementSettings,
    TouchContact, TouchFrame,
};

/// Builds the registry from the catalog and applies the loaded settings.
///
/// Without a usable catalog, or with unusable manipulation settings, the
/// registry is never inserted, which keeps the manipulation systems off.
pub fn init_registry(
    mut commands: Commands,
    catalog: Option<Res<ModelCatalog>>,
    placement: Res<PlacementSettings>,
    gestures: Res<GestureSettings>,
    manipulation: Res<ManipulationSettings>,
    fallback: Res<FallbackScales>,
    mut banner: ResMut<ModelBanner>,
    mut tutorial: ResMut<Tutorial>,
) {
    commands.insert_resource(AutoSpawn::from_settings(&placement));
    commands.insert_resource(GestureInterpreter::new((*gestures).clone()));

    let Some(catalog) = catalog else {
        error!("no ModelCatalog resource; placement is disabled");
        return;
    };
    if let Err(err) = manipulation.validate() {
        error!("placement is disabled: {err}");
        return;
    }

    match ObjectRegistry::new((*catalog).clone(), &placement, (*fallback).clone()) {
        Ok(registry) => {
            info!(
                "placement ready: {} models, capacity {}",
                registry.catalog().len(),
                registry.capacity()
            );
            if let Some(template) = registry.template(registry.selected()) {
                banner.show(template.name.clone());
            }
            commands.insert_resource(registry);
            tutorial.start();
        }
        Err(err) => error!("placement is disabled: {err}"),
    }
}

/// Snapshots the active touches into [`TouchFrame`], sorted by id.
pub fn collect_touch_contacts(touches: Option<Res<Touches>>, mut frame: ResMut<TouchFrame>) {
    frame.contacts.clear();
    let Some(touches) = touches else {
        return;
    };

    for touch in touches.iter() {
        let phase = if touches.just_pressed(touch.id()) {
            ContactPhase::Began
        } else if touch.delta() != Vec2::ZERO {
            ContactPhase::Moved
        } else {
            ContactPhase::Stationary
        };
        frame
            .contacts
            .push(TouchContact::new(touch.id(), touch.position(), phase));
    }
    // Down and up within one frame: never in `pressed`, so replay the touch-down.
    for touch in touches.iter_just_pressed() {
        if touches.get_pressed(touch.id()).is_none() {
            frame
                .contacts
                .push(TouchContact::new(touch.id(), touch.start_position(), ContactPhase::Began));
        }
    }
    for touch in touches.iter_just_released().chain(touches.iter_just_canceled()) {
        frame
            .contacts
            .push(TouchContact::new(touch.id(), touch.position(), ContactPhase::Ended));
    }

    // Stable, so a replayed touch-down stays ahead of its release.
    frame.contacts.sort_by_key(|c| c.id);
}

/// Classifies the frame's contacts and publishes the resulting intents.
pub fn interpret_gestures(
    time: Res<Time>,
    settings: Res<GestureSettings>,
    frame: Res<TouchFrame>,
    mut interpreter: ResMut<GestureInterpreter>,
    mut intents: MessageWriter<GestureIntent>,
) {
    if settings.is_changed() {
        interpreter.set_settings((*settings).clone());
    }
    if frame.contacts.is_empty() {
        return;
    }
    for intent in interpreter.interpret(&frame, time.elapsed_secs()) {
        intents.write(intent);
    }
}

/// Applies UI button presses.
pub fn handle_commands(
    mut commands: MessageReader<PlacementCommand>,
    mut registry: ResMut<ObjectRegistry>,
    mut controllers: ResMut<ManipulationControllers>,
    mut banner: ResMut<ModelBanner>,
    mut auto_spawn: ResMut<AutoSpawn>,
    target: Res<PartTarget>,
    objects: Query<&PlacedObject, With<PlacedRoot>>,
) {
    for command in commands.read() {
        debug!("command {command:?}");
        match command {
            PlacementCommand::ToggleMoveMode => {
                let enabled = controllers.moving.toggle();
                info!("move mode {}", if enabled { "on" } else { "off" });
            }
            PlacementCommand::ToggleRotateMode => {
                let enabled = controllers.rotate.toggle();
                info!("rotate mode {}", if enabled { "on" } else { "off" });
            }
            PlacementCommand::CycleModel => {
                let index = registry.cycle_model();
                if let Some(template) = registry.template(index) {
                    banner.show(template.name.clone());
                }
            }
            PlacementCommand::DeleteSelected => {
                if let Err(err) = registry.delete_selected() {
                    debug!("delete: {err}");
                }
            }
            PlacementCommand::ToggleVariant => {
                let index = registry.selected();
                match registry.toggle_variant(index) {
                    Ok(id) => info!("switched variant of model {index}, now {id}"),
                    Err(err) => debug!("variant: {err}"),
                }
            }
            PlacementCommand::TriggerAutoSpawn => auto_spawn.trigger(),
            PlacementCommand::DeleteTargeted => {
                let Some(object) = target.current().and_then(|t| objects.get(t.root).ok()) else {
                    debug!("delete targeted: nothing under the gaze");
                    continue;
                };
                if registry
                    .get(object.model_index)
                    .is_none_or(|entry| entry.id != object.id)
                {
                    debug!("delete targeted: object {} is gone", object.id);
                    continue;
                }
                match registry.delete(object.model_index) {
                    Ok(removed) => info!("deleted targeted object {}", removed.id),
                    Err(err) => debug!("delete targeted: {err}"),
                }
            }
        }
    }
}

/// Routes gesture intents to the manipulation controllers.
pub fn dispatch_gestures(
    mut intents: MessageReader<GestureIntent>,
    mut registry: ResMut<ObjectRegistry>,
    mut controllers: ResMut<ManipulationControllers>,
    settings: Res<ManipulationSettings>,
    planes: Res<TrackedPlanes>,
    cameras: Query<(&Camera, &GlobalTransform), With<PlacementCamera>>,
) {
    let camera = cameras.iter().next();
    let viewer = camera.map(|(_, transform)| transform.translation());

    for intent in intents.read() {
        let locate = |point: Vec2| -> Option<PlacementPose> {
            let (camera, transform) = camera?;
            let ray = screen_ray(camera, transform, point)?;
            locate_surface(&*planes, ray)
        };
        controllers.dispatch(*intent, &mut registry, &settings, locate, viewer);
    }
}

type RootColliders<'w, 's> =
    Query<'w, 's, (Entity, &'static PartCollider, &'static GlobalTransform, &'static Children), With<PlacedRoot>>;
type PartColliders<'w, 's> =
    Query<'w, 's, (&'static PartCollider, &'static GlobalTransform, &'static Name), With<PlacedPart>>;

/// Nearest part along `ray`. Only parts of objects whose root box the ray
/// crosses are tested.
fn target_along(ray: Ray3d, roots: &RootColliders, parts: &PartColliders) -> Option<TargetedPart> {
    let candidates = roots
        .iter()
        .filter(|(_, collider, transform, _)| ray_hits_collider(ray, collider, transform).is_some())
        .flat_map(|(root, _, _, children)| {
            children.iter().filter_map(move |part| {
                let (collider, transform, _) = parts.get(part).ok()?;
                Some(((part, root), collider, transform))
            })
        });
    let ((part, root), _) = pick_nearest(ray, candidates)?;
    let (_, _, name) = parts.get(part).ok()?;
    Some(TargetedPart {
        part,
        root,
        name: name.to_string(),
    })
}

/// Follows the camera's forward ray and advances the gaze dwell.
pub fn update_part_target(
    time: Res<Time>,
    mut target: ResMut<PartTarget>,
    cameras: Query<&GlobalTransform, With<PlacementCamera>>,
    roots: RootColliders,
    parts: PartColliders,
    mut events: MessageWriter<PartTargetEvent>,
) {
    if !target.gaze_enabled {
        return;
    }
    let hit = cameras.iter().next().and_then(|camera| {
        let ray = Ray3d::new(camera.translation(), camera.forward());
        target_along(ray, &roots, &parts)
    });
    if let Some(event) = target.update(hit, time.delta_secs()) {
        debug!("gaze {event:?}");
        events.write(event);
    }
}

/// Picks the part under each tap.
pub fn select_tapped_part(
    mut intents: MessageReader<GestureIntent>,
    cameras: Query<(&Camera, &GlobalTransform), With<PlacementCamera>>,
    roots: RootColliders,
    parts: PartColliders,
    mut events: MessageWriter<PartTargetEvent>,
) {
    let camera = cameras.iter().next();
    for intent in intents.read() {
        let GestureIntent::Tap { position } = intent else {
            continue;
        };
        let Some(ray) = camera.and_then(|(camera, transform)| screen_ray(camera, transform, *position))
        else {
            continue;
        };
        if let Some(hit) = target_along(ray, &roots, &parts) {
            info!("selected part '{}'", hit.name);
            events.write(PartTargetEvent::Selected {
                part: hit.part,
                name: hit.name,
            });
        }
    }
}

/// Places the selected model at the screen centre once surfaces show up.
pub fn tick_auto_spawn(
    time: Res<Time>,
    planes: Res<TrackedPlanes>,
    mut auto_spawn: ResMut<AutoSpawn>,
    mut registry: ResMut<ObjectRegistry>,
    cameras: Query<(&Camera, &GlobalTransform), With<PlacementCamera>>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    if planes.is_changed() {
        auto_spawn.on_surfaces_changed(planes.len());
    }
    if !auto_spawn.tick(time.delta_secs()) {
        return;
    }

    let (Some((camera, transform)), Some(window)) = (cameras.iter().next(), windows.iter().next())
    else {
        auto_spawn.finish(false);
        return;
    };
    let centre = window.size() / 2.0;
    let pose = screen_ray(camera, transform, centre).and_then(|ray| locate_surface(&*planes, ray));
    let placed = match pose {
        Some(pose) => registry
            .place_selected(pose, Some(transform.translation()))
            .inspect_err(|err| warn!("auto placement failed: {err}"))
            .is_ok(),
        None => false,
    };
    auto_spawn.finish(placed);
}

/// Feeds surface detection, notifications and panel buttons to the tutorial.
pub fn update_tutorial(
    time: Res<Time>,
    planes: Res<TrackedPlanes>,
    mut tutorial: ResMut<Tutorial>,
    mut notifications: MessageReader<PlacementNotification>,
    mut commands: MessageReader<TutorialCommand>,
) {
    if !planes.is_empty() {
        tutorial.on_surfaces_detected();
    }
    for notification in notifications.read() {
        tutorial.on_notification(*notification);
    }
    for command in commands.read() {
        tutorial.on_command(*command);
    }
    tutorial.tick(time.delta_secs());
}

/// Fades the model name banner.
pub fn tick_banner(time: Res<Time>, mut banner: ResMut<ModelBanner>) {
    banner.tick(time.delta_secs());
}
