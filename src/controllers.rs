//! Rotate, pinch-scale and move controllers.
//!
//! Each controller keeps only its own gesture baseline and toggle. The
//! object they act on is looked up in the [`ObjectRegistry`] on every call,
//! and every change goes through the registry's mutators.

use bevy::prelude::*;

use crate::math::clamp_scale;
use crate::registry::ObjectRegistry;
use crate::types::{GestureIntent, ManipulationSettings, PlacementNotification, PlacementPose};

/// Why a controller did nothing this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The controller's mode is switched off.
    Disabled,
    /// Nothing is placed for the selected model.
    NoCurrentEntity,
    /// The input geometry is unusable (e.g. fingers on top of each other).
    Degenerate,
    /// This frame only recorded the gesture's starting point.
    BaselineCaptured,
    /// The movement was too small to act on.
    BelowJitter,
    /// A commit was requested with no staged target.
    NothingStaged,
}

/// What a controller did with its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOutcome {
    /// The selected object was changed.
    Applied,
    /// The input was ignored; the controller is ready for the next frame.
    Skipped(SkipReason),
}

impl ControlOutcome {
    /// Whether the object was changed.
    pub fn is_applied(&self) -> bool {
        matches!(self, ControlOutcome::Applied)
    }
}

/// Turns one-finger drags into world-space yaw and pitch.
#[derive(Debug, Clone, Default)]
pub struct RotateController {
    enabled: bool,
    previous: Option<Vec2>,
    rotated: bool,
}

impl RotateController {
    /// Whether drags rotate the selected object.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Switches rotate mode on or off.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        info!("rotation {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Flips rotate mode. Returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.set_enabled(!self.enabled);
        self.enabled
    }

    /// Forgets the previous drag position.
    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// Takes and clears the "rotated since last asked" flag.
    pub fn take_rotated(&mut self) -> bool {
        std::mem::take(&mut self.rotated)
    }

    /// Rotates the selected object by the drag since the previous position.
    pub fn handle_drag(
        &mut self,
        position: Vec2,
        registry: &mut ObjectRegistry,
        settings: &ManipulationSettings,
    ) -> ControlOutcome {
        if !self.enabled {
            return ControlOutcome::Skipped(SkipReason::Disabled);
        }
        if registry.current().is_none() {
            return ControlOutcome::Skipped(SkipReason::NoCurrentEntity);
        }
        let Some(previous) = self.previous else {
            self.previous = Some(position);
            return ControlOutcome::Skipped(SkipReason::BaselineCaptured);
        };

        let delta = position - previous;
        if delta.length_squared() < settings.jitter_threshold_sq {
            return ControlOutcome::Skipped(SkipReason::BelowJitter);
        }

        let yaw = Quat::from_axis_angle(Vec3::Y, (delta.x * settings.rotate_speed).to_radians());
        let pitch = Quat::from_axis_angle(Vec3::X, (-delta.y * settings.rotate_speed).to_radians());
        registry.rotate_current(pitch * yaw);

        self.previous = Some(position);
        self.rotated = true;
        ControlOutcome::Applied
    }
}

/// Scales the selected object by the ratio of pinch distances.
#[derive(Debug, Clone, Default)]
pub struct ScaleController {
    baseline: Option<(f32, Vec3)>,
    scaled: bool,
}

impl ScaleController {
    /// Forgets the pinch baseline.
    pub fn reset(&mut self) {
        self.baseline = None;
    }

    /// Takes and clears the "scaled since last asked" flag.
    pub fn take_scaled(&mut self) -> bool {
        std::mem::take(&mut self.scaled)
    }

    /// Applies a pinch between two screen points.
    ///
    /// The first usable frame records the finger distance and the object's
    /// scale; later frames scale relative to that and clamp each axis.
    pub fn handle_pinch(
        &mut self,
        a: Vec2,
        b: Vec2,
        registry: &mut ObjectRegistry,
        settings: &ManipulationSettings,
    ) -> ControlOutcome {
        let Some(current) = registry.current() else {
            return ControlOutcome::Skipped(SkipReason::NoCurrentEntity);
        };

        let distance = a.distance(b);
        if distance < settings.min_pinch_distance {
            return ControlOutcome::Skipped(SkipReason::Degenerate);
        }

        let Some((start_distance, start_scale)) = self.baseline else {
            self.baseline = Some((distance, current.transform.scale));
            return ControlOutcome::Skipped(SkipReason::BaselineCaptured);
        };

        let ratio = distance / start_distance;
        let factor = 1.0 + (ratio - 1.0) * settings.scale_multiplier;
        let scale = clamp_scale(start_scale * factor, settings.min_scale, settings.max_scale);
        registry.set_current_scale(scale);

        self.scaled = true;
        ControlOutcome::Applied
    }
}

/// Relocates the selected object to a staged pose when move mode is on.
#[derive(Debug, Clone, Default)]
pub struct MoveController {
    enabled: bool,
    staged: Option<PlacementPose>,
}

impl MoveController {
    /// Whether double taps relocate instead of placing.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Switches move mode on or off.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        info!("move mode {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Flips move mode. Returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.set_enabled(!self.enabled);
        self.enabled
    }

    /// Target pose waiting for [`Self::commit`].
    pub fn staged(&self) -> Option<PlacementPose> {
        self.staged
    }

    /// Records the pose the next commit moves to.
    pub fn stage(&mut self, pose: PlacementPose) {
        debug!("staged move to {}", pose.position);
        self.staged = Some(pose);
    }

    /// Moves the selected object to the staged pose.
    pub fn commit(&mut self, registry: &mut ObjectRegistry) -> ControlOutcome {
        if !self.enabled {
            return ControlOutcome::Skipped(SkipReason::Disabled);
        }
        if registry.current().is_none() {
            return ControlOutcome::Skipped(SkipReason::NoCurrentEntity);
        }
        let Some(pose) = self.staged.take() else {
            return ControlOutcome::Skipped(SkipReason::NothingStaged);
        };
        registry.set_current_pose(pose);
        registry.notify(PlacementNotification::ObjectMoved);
        ControlOutcome::Applied
    }
}

/// The three controllers plus the routing from gestures to them.
#[derive(Resource, Debug, Clone, Default)]
pub struct ManipulationControllers {
    /// One-finger drag rotation.
    pub rotate: RotateController,
    /// Two-finger pinch scaling.
    pub scale: ScaleController,
    /// Double-tap relocation.
    pub moving: MoveController,
}

impl ManipulationControllers {
    /// Routes one gesture.
    ///
    /// `locate` resolves a screen point to a surface pose and `viewer` is the
    /// camera position objects turn to face.
    pub fn dispatch(
        &mut self,
        intent: GestureIntent,
        registry: &mut ObjectRegistry,
        settings: &ManipulationSettings,
        mut locate: impl FnMut(Vec2) -> Option<PlacementPose>,
        viewer: Option<Vec3>,
    ) {
        match intent {
            GestureIntent::ContactDown => {
                self.rotate.reset();
                self.scale.reset();
            }
            GestureIntent::ContactUp => {
                self.rotate.reset();
                self.scale.reset();
                if self.rotate.take_rotated() {
                    registry.notify(PlacementNotification::ObjectRotated);
                }
                if self.scale.take_scaled() {
                    registry.notify(PlacementNotification::ObjectScaled);
                }
            }
            GestureIntent::Tap { .. } => {}
            GestureIntent::DoubleTap { position } => {
                let Some(pose) = locate(position) else {
                    debug!("double tap at {position}: no surface");
                    return;
                };
                if self.moving.is_enabled() && registry.current().is_some() {
                    let lifted = pose.position + Vec3::Y * registry.float_height();
                    self.moving.stage(PlacementPose::new(lifted, pose.rotation));
                    let outcome = self.moving.commit(registry);
                    debug!("double tap move: {outcome:?}");
                } else if let Err(err) = registry.place_selected(pose, viewer) {
                    warn!("double tap placement failed: {err}");
                }
            }
            GestureIntent::LongPress { .. } => {
                if let Err(err) = registry.delete_selected() {
                    debug!("long press: {err}");
                }
            }
            GestureIntent::Pinch { a, b } => {
                let outcome = self.scale.handle_pinch(a, b, registry, settings);
                trace!("pinch: {outcome:?}");
            }
            GestureIntent::Drag { position } => {
                let outcome = self.rotate.handle_drag(position, registry, settings);
                trace!("drag: {outcome:?}");
            }
        }
    }
}
