//! Surface placement and touch manipulation plugin for Bevy 0.18.x.
//!
//! This crate places models on tracked surfaces and lets the user move,
//! rotate and pinch-scale them with touch gestures. A bounded registry keeps
//! at most a few objects alive, evicting the oldest when full, and publishes
//! notifications that drive an onboarding tutorial.
//!
//! # Quick Start
//!
//! ```ignore
//! use bevy::prelude::*;
//! use bevy_placement_tools::{
//!     ModelCatalog, ModelPart, ModelTemplate, PlacementCamera, PlacementPlugin, TrackedPlanes,
//!     TrackedSurface,
//! };
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(PlacementPlugin)
//!         .add_systems(Startup, setup)
//!         .run();
//! }
//!
//! fn setup(
//!     mut commands: Commands,
//!     mut meshes: ResMut<Assets<Mesh>>,
//!     mut materials: ResMut<Assets<StandardMaterial>>,
//!     mut planes: ResMut<TrackedPlanes>,
//! ) {
//!     // Camera used for screen-to-surface rays
//!     commands.spawn((
//!         Camera3d::default(),
//!         Transform::from_xyz(0.0, 1.5, 3.0).looking_at(Vec3::ZERO, Vec3::Y),
//!         PlacementCamera,
//!     ));
//!
//!     // Models the user can place
//!     let cube = ModelPart::new(
//!         "cube",
//!         meshes.add(Cuboid::from_length(0.2)),
//!         materials.add(Color::WHITE),
//!     );
//!     commands.insert_resource(ModelCatalog::new(vec![
//!         ModelTemplate::new("Cube").with_part(cube),
//!     ]));
//!
//!     // Normally fed by an AR backend
//!     planes.upsert(TrackedSurface::horizontal(0, Vec3::ZERO, Vec2::splat(2.0)));
//! }
//! ```
//!
//! # Features
//!
//! - **Placement**: Double tap a surface to place the selected model
//! - **Bounded registry**: At most `capacity` objects, oldest evicted first
//! - **Manipulation**: Drag to rotate, pinch to scale, double tap to move
//! - **Deletion**: Long press removes the selected model
//! - **Part targeting**: Gaze dwell and taps pick individual model parts
//! - **Auto placement**: Optionally places the first model once surfaces appear
//! - **Tutorial**: Step texts and panel fades driven by placement notifications
//!
//! # Configuration
//!
//! Behavior is tuned through resources, all loadable from JSON with
//! [`PlacementConfig::from_json`]:
//!
//! - [`PlacementSettings`]: Capacity, float height and auto placement
//! - [`GestureSettings`]: Double tap window, long press time, movement threshold
//! - [`ManipulationSettings`]: Rotation speed and scale limits
//! - [`FallbackScales`]: Spawn scale factors keyed by model index

#![warn(missing_docs)]

use bevy::prelude::*;

mod auto_spawn;
mod catalog;
mod collider;
mod controllers;
mod draw;
mod error;
mod gesture;
mod interaction;
mod math;
mod registry;
mod sequence;
mod surface;
mod sync;
mod targeting;
mod tutorial;
mod types;

// Re-export all public types
pub use auto_spawn::AutoSpawn;
pub use catalog::{
    scale_factor, spawn_scale, FallbackScales, ModelCatalog, ModelPart, ModelTemplate, ScaleRule,
    ScaleSource,
};
pub use collider::{
    build_part_collider, root_bounds, try_mesh_collider, BoundingBox, PartCollider, PlacedPart,
    PlacedRoot,
};
pub use controllers::{
    ControlOutcome, ManipulationControllers, MoveController, RotateController, ScaleController,
    SkipReason,
};
pub use draw::{PlacementDebugDrawPlugin, PlacementDebugStyle};
pub use error::{ColliderError, PlacementError};
pub use gesture::GestureInterpreter;
pub use math::{
    clamp_scale, ray_box_intersection, ray_plane_intersection, ray_triangle_intersection,
    smoothstep, yaw_facing,
};
pub use registry::{ObjectRegistry, PlacedEntity, Placement};
pub use sequence::{Easing, FadeSequence, ModelBanner, PanelFade, PanelMotion};
pub use surface::{
    locate_surface, screen_ray, SurfaceAlignment, SurfaceHit, SurfaceProvider, TrackedPlanes,
    TrackedSurface,
};
pub use targeting::{pick_nearest, ray_hits_collider, PartTarget, PartTargetEvent, TargetedPart};
pub use tutorial::{LearnedActions, Tutorial, TutorialCommand, DEFAULT_STEPS};
pub use types::{
    ContactPhase, GestureIntent, GestureSettings, ManipulationSettings, ModelIndex, PlacedId,
    PlacedObject, PlacementCamera, PlacementCommand, PlacementConfig, PlacementNotification,
    PlacementPose, PlacementSettings, TouchContact, TouchFrame,
};

use crate::interaction::{
    collect_touch_contacts, dispatch_gestures, handle_commands, init_registry, interpret_gestures,
    select_tapped_part, tick_auto_spawn, tick_banner, update_part_target, update_tutorial,
};
use crate::sync::{attach_part_colliders, forward_notifications, sync_placed_entities};

/// Plugin that enables surface placement and touch manipulation.
///
/// The plugin registers settings, messages and the systems that turn touches
/// into registry operations. Insert a [`ModelCatalog`] before `PostStartup`;
/// without one the registry is never created and the systems stay idle.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_placement_tools::PlacementPlugin;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(PlacementPlugin)
///     .run();
/// ```
pub struct PlacementPlugin;

impl Plugin for PlacementPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlacementSettings>()
            .init_resource::<GestureSettings>()
            .init_resource::<ManipulationSettings>()
            .init_resource::<FallbackScales>()
            .init_resource::<TrackedPlanes>()
            .init_resource::<TouchFrame>()
            .init_resource::<GestureInterpreter>()
            .init_resource::<ManipulationControllers>()
            .init_resource::<AutoSpawn>()
            .init_resource::<Tutorial>()
            .init_resource::<ModelBanner>()
            .init_resource::<PartTarget>()
            .add_message::<GestureIntent>()
            .add_message::<PlacementCommand>()
            .add_message::<PlacementNotification>()
            .add_message::<TutorialCommand>()
            .add_message::<PartTargetEvent>()
            .add_systems(PostStartup, init_registry)
            .add_systems(
                Update,
                (
                    collect_touch_contacts,
                    interpret_gestures,
                    handle_commands,
                    dispatch_gestures,
                    tick_auto_spawn,
                    sync_placed_entities,
                    attach_part_colliders,
                    update_part_target,
                    select_tapped_part,
                    forward_notifications,
                    update_tutorial,
                    tick_banner,
                )
                    .chain()
                    .run_if(resource_exists::<ObjectRegistry>),
            );
    }
}
