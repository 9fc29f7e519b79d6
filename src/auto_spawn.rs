//! Delayed placement at the screen centre once surfaces appear.

use bevy::prelude::*;

use crate::types::PlacementSettings;

/// Countdown to the one-time automatic placement.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct AutoSpawn {
    enabled: bool,
    delay: f32,
    remaining: Option<f32>,
    done: bool,
}

impl Default for AutoSpawn {
    fn default() -> Self {
        Self::from_settings(&PlacementSettings::default())
    }
}

impl AutoSpawn {
    /// Creates a countdown from the placement settings.
    pub fn from_settings(settings: &PlacementSettings) -> Self {
        Self {
            enabled: settings.auto_spawn_enabled,
            delay: settings.auto_spawn_delay,
            remaining: None,
            done: false,
        }
    }

    /// Whether the automatic placement already happened.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Whether a countdown is running.
    pub fn is_pending(&self) -> bool {
        self.remaining.is_some()
    }

    /// Surfaces changed; (re)starts the countdown while still waiting to place.
    pub fn on_surfaces_changed(&mut self, surface_count: usize) {
        if !self.enabled || self.done || surface_count == 0 {
            return;
        }
        self.remaining = Some(self.delay);
    }

    /// Advances the countdown. Returns `true` on the frame placement is due.
    pub fn tick(&mut self, dt: f32) -> bool {
        let Some(remaining) = self.remaining.as_mut() else {
            return false;
        };
        *remaining -= dt;
        if *remaining <= 0.0 {
            self.remaining = None;
            return true;
        }
        false
    }

    /// Forgets a previous placement and makes placement due on the next tick.
    ///
    /// Works even when automatic placement is disabled in the settings.
    pub fn trigger(&mut self) {
        self.done = false;
        self.remaining = Some(0.0);
    }

    /// Records whether a due placement succeeded.
    ///
    /// A miss (no surface under the screen centre) leaves the countdown idle
    /// until surfaces change again.
    pub fn finish(&mut self, placed: bool) {
        if placed {
            self.done = true;
            info!("auto-placed the selected model");
        } else {
            debug!("auto placement found no surface at the screen centre");
        }
    }
}
