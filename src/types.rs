//! Core types for the placement plugin.
//!
//! This module contains the public types shared between the registry, the
//! gesture interpreter and the manipulation controllers, plus the settings
//! resources that configure them.

use bevy::prelude::*;
use serde::Deserialize;
use std::fmt;

use crate::catalog::FallbackScales;
use crate::error::PlacementError;

/// Position of a model template in the [`ModelCatalog`](crate::ModelCatalog).
///
/// The registry keys placed objects by this index, so at most one object per
/// template exists at a time.
pub type ModelIndex = usize;

/// Identity of a placed object.
///
/// Ids are handed out in creation order and never reused, so a relocated
/// object keeps its id while a respawned one gets a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlacedId(pub u64);

impl fmt::Display for PlacedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A world-space position and orientation resolved on a tracked surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementPose {
    /// Point on the surface.
    pub position: Vec3,
    /// Orientation whose local +Y is the surface normal.
    pub rotation: Quat,
}

impl PlacementPose {
    /// Creates a pose from a position and rotation.
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// The pose's up direction (the surface normal for surface hits).
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }
}

impl Default for PlacementPose {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY)
    }
}

/// Marker component for the camera used to cast screen points into the world.
///
/// Only the first tagged camera is used. Its position is also the "viewer"
/// that freshly placed objects turn to face.
///
/// # Example
///
/// ```ignore
/// commands.spawn((
///     Camera3d::default(),
///     Transform::from_xyz(0.0, 1.5, 3.0).looking_at(Vec3::ZERO, Vec3::Y),
///     PlacementCamera,
/// ));
/// ```
#[derive(Component)]
pub struct PlacementCamera;

/// Mirrors one registry entry in the ECS world.
///
/// The plugin spawns and despawns these root entities; applications should
/// treat them as read-only and go through [`ObjectRegistry`](crate::ObjectRegistry)
/// to change anything.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedObject {
    /// Registry identity of the mirrored object.
    pub id: PlacedId,
    /// Template the object was spawned from.
    pub model_index: ModelIndex,
}

/// Lifecycle notifications published by the registry.
///
/// Each one is raised once per triggering action; onboarding UI listens for
/// them with a `MessageReader`.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementNotification {
    /// The very first object of the session was placed. Raised at most once.
    FirstPlacement,
    /// An object was moved to a new pose.
    ObjectMoved,
    /// An object was resized by a pinch gesture.
    ObjectScaled,
    /// An object was rotated by a drag gesture.
    ObjectRotated,
}

impl fmt::Display for PlacementNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementNotification::FirstPlacement => f.write_str("FirstPlacement"),
            PlacementNotification::ObjectMoved => f.write_str("ObjectMoved"),
            PlacementNotification::ObjectScaled => f.write_str("ObjectScaled"),
            PlacementNotification::ObjectRotated => f.write_str("ObjectRotated"),
        }
    }
}

/// Button-style commands an application UI sends to the plugin.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementCommand {
    /// Flip move mode (double tap relocates the selected object).
    ToggleMoveMode,
    /// Flip rotate mode (one-finger drag rotates the selected object).
    ToggleRotateMode,
    /// Select the next template in the catalog.
    CycleModel,
    /// Remove the selected template's object, if placed.
    DeleteSelected,
    /// Swap the selected object between its main and alternate parts.
    ToggleVariant,
    /// Re-arm and immediately attempt the screen-centre auto placement.
    TriggerAutoSpawn,
    /// Remove the object whose part is under the gaze.
    DeleteTargeted,
}

/// Lifecycle phase of a touch contact within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactPhase {
    /// The contact touched down this frame.
    Began,
    /// The contact is down and moved since the previous frame.
    Moved,
    /// The contact is down and did not move.
    Stationary,
    /// The contact lifted (or was cancelled) this frame.
    Ended,
}

/// One touch contact as seen in a single frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchContact {
    /// Stable identity for the lifetime of the contact.
    pub id: u64,
    /// Screen position in logical pixels.
    pub position: Vec2,
    /// Phase of the contact this frame.
    pub phase: ContactPhase,
}

impl TouchContact {
    /// Creates a contact sample.
    pub fn new(id: u64, position: Vec2, phase: ContactPhase) -> Self {
        Self {
            id,
            position,
            phase,
        }
    }

    /// Whether the contact is still down after this frame.
    pub fn is_active(&self) -> bool {
        self.phase != ContactPhase::Ended
    }
}

/// Touch contacts collected for the current frame, sorted by contact id.
#[derive(Resource, Debug, Clone, Default)]
pub struct TouchFrame {
    /// Contacts in ascending id order.
    pub contacts: Vec<TouchContact>,
}

/// A classified gesture, ready to be routed to the registry or a controller.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub enum GestureIntent {
    /// A contact touched down; per-gesture baselines must be discarded.
    ContactDown,
    /// A single primary tap. Selects the part under it.
    Tap {
        /// Screen position of the tap.
        position: Vec2,
    },
    /// Two primary taps inside the double-tap window.
    DoubleTap {
        /// Screen position of the second tap.
        position: Vec2,
    },
    /// A single contact held still long enough.
    LongPress {
        /// Screen position of the held contact.
        position: Vec2,
    },
    /// A single moving contact.
    Drag {
        /// Current screen position of the contact.
        position: Vec2,
    },
    /// Two contacts with at least one moving.
    Pinch {
        /// First contact, in id order.
        a: Vec2,
        /// Second contact, in id order.
        b: Vec2,
    },
    /// A contact lifted; per-gesture state must be reset.
    ContactUp,
}

/// Registry and auto-placement settings.
#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlacementSettings {
    /// Maximum number of placed objects at once.
    pub capacity: usize,
    /// Distance objects hover above the surface they are placed on.
    pub float_height: f32,
    /// Whether to place the selected model once the first surface appears.
    pub auto_spawn_enabled: bool,
    /// Seconds to wait after a surface appears before auto placement.
    pub auto_spawn_delay: f32,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            capacity: 2,
            float_height: 0.1,
            auto_spawn_enabled: true,
            auto_spawn_delay: 0.5,
        }
    }
}

/// Gesture classification thresholds.
#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GestureSettings {
    /// Maximum seconds between two primary taps to count as a double tap.
    pub double_tap_window: f32,
    /// Seconds a still contact must be held to count as a long press.
    pub long_press_time: f32,
    /// Pixels of travel after which a press is treated as a drag.
    pub movement_threshold: f32,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            double_tap_window: 0.3,
            long_press_time: 0.7,
            movement_threshold: 10.0,
        }
    }
}

/// Tuning for the rotate and scale controllers.
#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ManipulationSettings {
    /// Degrees of rotation per pixel of drag.
    pub rotate_speed: f32,
    /// Squared pixel delta below which drag movement is ignored.
    pub jitter_threshold_sq: f32,
    /// Lower bound of every scale axis.
    pub min_scale: f32,
    /// Upper bound of every scale axis.
    pub max_scale: f32,
    /// Gain applied to the pinch ratio's distance from 1.
    pub scale_multiplier: f32,
    /// Pinch distances below this many pixels are ignored.
    pub min_pinch_distance: f32,
}

impl Default for ManipulationSettings {
    fn default() -> Self {
        Self {
            rotate_speed: 0.2,
            jitter_threshold_sq: 1.0,
            min_scale: 0.1,
            max_scale: 5.0,
            scale_multiplier: 1.0,
            min_pinch_distance: 0.1,
        }
    }
}

impl ManipulationSettings {
    /// Checks the scale limits and pinch threshold.
    ///
    /// Scale limits must be finite, positive and ordered; the minimum pinch
    /// distance must be positive so pinch ratios stay finite.
    pub fn validate(&self) -> Result<(), PlacementError> {
        let invalid = |field, reason| Err(PlacementError::InvalidSettings { field, reason });
        if !(self.min_scale.is_finite() && self.min_scale > 0.0) {
            return invalid("min_scale", "must be finite and greater than 0");
        }
        if !(self.max_scale.is_finite() && self.max_scale > 0.0) {
            return invalid("max_scale", "must be finite and greater than 0");
        }
        if self.min_scale > self.max_scale {
            return invalid("min_scale", "must not exceed max_scale");
        }
        if !(self.min_pinch_distance.is_finite() && self.min_pinch_distance > 0.0) {
            return invalid("min_pinch_distance", "must be finite and greater than 0");
        }
        Ok(())
    }
}

/// All plugin settings, loadable from one JSON document.
///
/// Missing sections and fields fall back to their defaults.
///
/// ```ignore
/// let config = PlacementConfig::from_json(r#"{ "placement": { "capacity": 3 } }"#)?;
/// app.insert_resource(config.placement);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Registry and auto-placement settings.
    pub placement: PlacementSettings,
    /// Gesture thresholds.
    pub gestures: GestureSettings,
    /// Controller tuning.
    pub manipulation: ManipulationSettings,
    /// Index-keyed spawn scale factors.
    pub fallback_scales: FallbackScales,
}

impl PlacementConfig {
    /// Parses settings from JSON and rejects values the controllers cannot use.
    pub fn from_json(json: &str) -> Result<Self, PlacementError> {
        let config: Self = serde_json::from_str(json)?;
        config.manipulation.validate()?;
        Ok(config)
    }

    /// Inserts every section as a resource, replacing existing values.
    pub fn insert_into(self, app: &mut App) {
        app.insert_resource(self.placement)
            .insert_resource(self.gestures)
            .insert_resource(self.manipulation)
            .insert_resource(self.fallback_scales);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_fills_missing_fields_with_defaults() {
        let config = PlacementConfig::from_json(
            r#"{ "placement": { "capacity": 3 }, "manipulation": { "max_scale": 8.0 } }"#,
        )
        .unwrap();

        assert_eq!(config.placement.capacity, 3);
        assert_eq!(config.placement.float_height, 0.1);
        assert_eq!(config.manipulation.max_scale, 8.0);
        assert_eq!(config.manipulation.min_scale, 0.1);
        assert_eq!(config.gestures.double_tap_window, 0.3);
    }

    #[test]
    fn config_rejects_malformed_json() {
        let err = PlacementConfig::from_json("{ capacity: ").unwrap_err();
        assert!(matches!(err, PlacementError::Settings(_)));
    }

    #[test]
    fn config_rejects_unusable_scale_limits() {
        let err = PlacementConfig::from_json(
            r#"{ "manipulation": { "min_scale": 5.0, "max_scale": 0.1 } }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PlacementError::InvalidSettings {
                field: "min_scale",
                ..
            }
        ));

        let err = PlacementConfig::from_json(r#"{ "manipulation": { "min_pinch_distance": 0.0 } }"#)
            .unwrap_err();
        assert!(matches!(
            err,
            PlacementError::InvalidSettings {
                field: "min_pinch_distance",
                ..
            }
        ));

        let settings = ManipulationSettings {
            max_scale: f32::INFINITY,
            ..default()
        };
        assert!(settings.validate().is_err());
        assert!(ManipulationSettings::default().validate().is_ok());
    }

    #[test]
    fn pose_up_follows_rotation() {
        let pose = PlacementPose::new(Vec3::ZERO, Quat::from_rotation_x(std::f32::consts::FRAC_PI_2));
        assert!(pose.up().abs_diff_eq(Vec3::Z, 1e-5));
    }
}
