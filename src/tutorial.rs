//! Onboarding tutorial driven by placement notifications.
//!
//! The tutorial owns no widgets. It exposes the step text and the panel's
//! fade state; an application draws them however it likes.

use bevy::prelude::*;

use crate::sequence::PanelFade;
use crate::types::PlacementNotification;

/// Buttons on the tutorial panel.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TutorialCommand {
    /// Advance to the next step.
    Next,
    /// Close the tutorial.
    Skip,
}

/// Default step texts.
pub const DEFAULT_STEPS: [&str; 4] = [
    "Welcome! Move your device around slowly to detect surfaces.",
    "Surface detected! Double tap a surface to place the model.",
    "Great! Now you can:\n- Pinch with two fingers to scale\n- Drag with one finger to rotate (rotate mode)\n- Double tap to move (move mode)",
    "More controls:\n- Cycle models with the switch button\n- Long press to delete the selected model",
];

/// Step shown once surfaces are tracked.
const SURFACE_STEP: usize = 1;

/// Step shown after the first placement.
const MANIPULATION_STEP: usize = 2;

/// Which manipulations the user has performed at least once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LearnedActions {
    /// An object was moved.
    pub moved: bool,
    /// An object was pinch-scaled.
    pub scaled: bool,
    /// An object was drag-rotated.
    pub rotated: bool,
}

impl LearnedActions {
    /// Whether every manipulation has been tried.
    pub fn all(&self) -> bool {
        self.moved && self.scaled && self.rotated
    }
}

/// Tutorial progress and panel state.
#[derive(Resource, Debug, Clone)]
pub struct Tutorial {
    steps: Vec<String>,
    step: usize,
    active: bool,
    surface_seen: bool,
    placement_seen: bool,
    learned: LearnedActions,
    panel: PanelFade,
}

impl Default for Tutorial {
    fn default() -> Self {
        Self::new(DEFAULT_STEPS.iter().map(|s| s.to_string()).collect())
    }
}

impl Tutorial {
    /// Creates a tutorial with custom step texts.
    ///
    /// The tutorial starts inactive; [`Self::start`] shows the first step.
    pub fn new(steps: Vec<String>) -> Self {
        Self {
            steps,
            step: 0,
            active: false,
            surface_seen: false,
            placement_seen: false,
            learned: LearnedActions::default(),
            panel: PanelFade::default(),
        }
    }

    /// Index of the current step.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Text of the current step, while the tutorial runs.
    pub fn text(&self) -> Option<&str> {
        self.active
            .then(|| self.steps.get(self.step).map(String::as_str))
            .flatten()
    }

    /// Whether the tutorial is running.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Manipulations tried so far.
    pub fn learned(&self) -> LearnedActions {
        self.learned
    }

    /// Panel animation state.
    pub fn panel(&self) -> &PanelFade {
        &self.panel
    }

    /// Shows the first step.
    pub fn start(&mut self) {
        self.active = true;
        self.show_step(0);
    }

    /// Shows `step`, or ends the tutorial past the last one.
    pub fn show_step(&mut self, step: usize) {
        if step >= self.steps.len() {
            info!("tutorial finished");
            self.end();
            return;
        }
        if !self.active {
            return;
        }
        self.step = step;
        debug!("tutorial step {step}");
        self.panel.show();
    }

    /// Advances one step.
    pub fn next(&mut self) {
        self.show_step(self.step + 1);
    }

    /// Hides the panel and stops reacting to events.
    pub fn end(&mut self) {
        self.active = false;
        self.panel.hide();
    }

    /// Tracked surfaces appeared.
    pub fn on_surfaces_detected(&mut self) {
        if self.surface_seen {
            return;
        }
        self.surface_seen = true;
        if self.active && self.step < SURFACE_STEP {
            self.show_step(SURFACE_STEP);
        }
    }

    /// Reacts to a placement notification.
    pub fn on_notification(&mut self, notification: PlacementNotification) {
        match notification {
            PlacementNotification::FirstPlacement => {
                if !self.placement_seen {
                    self.placement_seen = true;
                    if self.active && self.step < MANIPULATION_STEP {
                        self.show_step(MANIPULATION_STEP);
                    }
                }
            }
            PlacementNotification::ObjectMoved => self.learned.moved = true,
            PlacementNotification::ObjectScaled => self.learned.scaled = true,
            PlacementNotification::ObjectRotated => self.learned.rotated = true,
        }
        if self.active && self.step == MANIPULATION_STEP && self.learned.all() {
            self.next();
        }
    }

    /// Applies a panel button press.
    pub fn on_command(&mut self, command: TutorialCommand) {
        match command {
            TutorialCommand::Next => self.next(),
            TutorialCommand::Skip => self.end(),
        }
    }

    /// Advances the panel animation.
    pub fn tick(&mut self, dt: f32) {
        self.panel.tick(dt);
    }
}
