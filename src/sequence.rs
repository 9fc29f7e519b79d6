//! Frame-ticked timed sequences.
//!
//! Fades and delays are plain state machines advanced by the frame's delta
//! time. Starting a new sequence on an owner replaces (and so cancels) the
//! one it was running.

use bevy::prelude::*;

use crate::math::smoothstep;

/// Interpolation curve of a [`FadeSequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    /// Constant rate.
    #[default]
    Linear,
    /// Slow start and end.
    SmoothStep,
}

impl Easing {
    fn apply(self, t: f32) -> f32 {
        match self {
            Easing::Linear => t.clamp(0.0, 1.0),
            Easing::SmoothStep => smoothstep(t),
        }
    }
}

/// A value interpolated from `from` to `to` over `duration` seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct FadeSequence {
    from: f32,
    to: f32,
    duration: f32,
    elapsed: f32,
    easing: Easing,
    cancelled: bool,
}

impl FadeSequence {
    /// Starts a sequence.
    pub fn new(from: f32, to: f32, duration: f32, easing: Easing) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.0),
            elapsed: 0.0,
            easing,
            cancelled: false,
        }
    }

    /// Current interpolated value.
    ///
    /// A cancelled sequence holds the value it had when cancelled.
    pub fn value(&self) -> f32 {
        self.from + (self.to - self.from) * self.easing.apply(self.progress())
    }

    /// Fraction of the duration elapsed, in [0, 1].
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    /// Advances by `dt` seconds and returns the new value.
    pub fn tick(&mut self, dt: f32) -> f32 {
        if !self.cancelled {
            self.elapsed = (self.elapsed + dt).min(self.duration);
        }
        self.value()
    }

    /// Stops the sequence where it is.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Whether the sequence reached its end or was cancelled.
    pub fn is_finished(&self) -> bool {
        self.cancelled || self.progress() >= 1.0
    }

    /// Target value.
    pub fn target(&self) -> f32 {
        self.to
    }
}

/// Direction of the current panel animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelMotion {
    /// Fading in and sliding up.
    Showing,
    /// Fading out and sliding down.
    Hiding,
}

/// Slide-and-fade animation for an onboarding panel.
///
/// `alpha` goes 0 → 1 on show and back to 0 on hide; `offset` is how far
/// below its resting place the panel is drawn, in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelFade {
    /// Seconds to fade in.
    pub show_duration: f32,
    /// Seconds to fade out.
    pub hide_duration: f32,
    /// Pixels the panel slides while fading.
    pub slide_distance: f32,
    motion: Option<(PanelMotion, FadeSequence)>,
    visible: bool,
}

impl Default for PanelFade {
    fn default() -> Self {
        Self {
            show_duration: 0.5,
            hide_duration: 0.3,
            slide_distance: 100.0,
            motion: None,
            visible: false,
        }
    }
}

impl PanelFade {
    /// Current opacity.
    pub fn alpha(&self) -> f32 {
        match &self.motion {
            Some((_, fade)) => fade.value(),
            None if self.visible => 1.0,
            None => 0.0,
        }
    }

    /// Current slide offset below the resting position.
    pub fn offset(&self) -> f32 {
        (1.0 - self.alpha()) * self.slide_distance
    }

    /// Whether the panel should be drawn at all.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Animation in progress, if any.
    pub fn motion(&self) -> Option<PanelMotion> {
        self.motion.as_ref().map(|(m, _)| *m)
    }

    /// Starts fading in from the current opacity, replacing any running animation.
    pub fn show(&mut self) {
        let from = if self.visible { self.alpha() } else { 0.0 };
        self.visible = true;
        self.motion = Some((
            PanelMotion::Showing,
            FadeSequence::new(from, 1.0, self.show_duration, Easing::SmoothStep),
        ));
    }

    /// Starts fading out from the current opacity, replacing any running animation.
    pub fn hide(&mut self) {
        if !self.visible {
            return;
        }
        self.motion = Some((
            PanelMotion::Hiding,
            FadeSequence::new(self.alpha(), 0.0, self.hide_duration, Easing::SmoothStep),
        ));
    }

    /// Advances the animation by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        let Some((motion, fade)) = self.motion.as_mut() else {
            return;
        };
        fade.tick(dt);
        if fade.is_finished() {
            if *motion == PanelMotion::Hiding {
                self.visible = false;
            }
            self.motion = None;
        }
    }
}

/// Briefly shows the selected model's name, then fades it out.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct ModelBanner {
    /// Seconds the text takes to fade out.
    pub fade_duration: f32,
    text: String,
    fade: Option<FadeSequence>,
}

impl Default for ModelBanner {
    fn default() -> Self {
        Self {
            fade_duration: 2.0,
            text: String::new(),
            fade: None,
        }
    }
}

impl ModelBanner {
    /// Shows `text` at full opacity, restarting any fade in progress.
    pub fn show(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.fade = Some(FadeSequence::new(1.0, 0.0, self.fade_duration, Easing::Linear));
    }

    /// Text currently on the banner.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Current opacity.
    pub fn alpha(&self) -> f32 {
        self.fade.as_ref().map_or(0.0, FadeSequence::value)
    }

    /// Advances the fade by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        if let Some(fade) = self.fade.as_mut() {
            fade.tick(dt);
            if fade.is_finished() {
                self.fade = None;
            }
        }
    }
}
