//! Touch gesture classification.
//!
//! [`GestureInterpreter`] consumes one [`TouchFrame`] per frame and emits
//! [`GestureIntent`]s. It owns only timing and press bookkeeping; baselines
//! for rotation and pinch live in the controllers, which reset them on
//! [`GestureIntent::ContactDown`] and [`GestureIntent::ContactUp`].

use bevy::prelude::*;

use crate::types::{ContactPhase, GestureIntent, GestureSettings, TouchContact, TouchFrame};

/// Bookkeeping for the contact that may become a long press.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Press {
    id: u64,
    started_at: f32,
    origin: Vec2,
    /// Moved past the threshold; can no longer fire.
    dragged: bool,
    fired: bool,
}

/// Classifies raw touch contacts into gestures.
#[derive(Resource, Debug, Clone, Default)]
pub struct GestureInterpreter {
    settings: GestureSettings,
    last_tap_at: Option<f32>,
    press: Option<Press>,
}

impl GestureInterpreter {
    /// Creates an interpreter with the given thresholds.
    pub fn new(settings: GestureSettings) -> Self {
        Self {
            settings,
            last_tap_at: None,
            press: None,
        }
    }

    /// Thresholds in use.
    pub fn settings(&self) -> &GestureSettings {
        &self.settings
    }

    /// Replaces the thresholds without touching in-flight state.
    pub fn set_settings(&mut self, settings: GestureSettings) {
        self.settings = settings;
    }

    /// Whether the current press already fired a long press.
    pub fn is_long_pressing(&self) -> bool {
        self.press.is_some_and(|p| p.fired)
    }

    /// Classifies one frame of contacts at time `now` (seconds).
    ///
    /// Contacts must be in ascending id order. A contact that touched down and
    /// lifted within the frame appears twice, `Began` then `Ended`, and taps
    /// like any other. Any release clears the pending long press.
    pub fn interpret(&mut self, frame: &TouchFrame, now: f32) -> Vec<GestureIntent> {
        let mut intents = Vec::new();
        let contacts = &frame.contacts;

        let ended = |id: u64| {
            contacts
                .iter()
                .any(|c| c.id == id && c.phase == ContactPhase::Ended)
        };
        let active: Vec<&TouchContact> = contacts
            .iter()
            .filter(|c| c.is_active() && !(c.phase == ContactPhase::Began && ended(c.id)))
            .collect();
        let began: Vec<&TouchContact> = contacts
            .iter()
            .filter(|c| c.phase == ContactPhase::Began)
            .collect();

        for contact in &began {
            intents.push(GestureIntent::ContactDown);
            // Only a contact that lands alone can tap.
            let lone = match active.as_slice() {
                [] => true,
                [only] => only.id == contact.id,
                _ => false,
            };
            if lone {
                self.primary_down(contact, now, &mut intents);
            } else if let Some(press) = self.press.as_mut() {
                press.dragged = true;
            }
        }

        if active.len() == 1 {
            self.check_long_press(active[0], now, &mut intents);
        }

        let moved = contacts.iter().any(|c| c.phase == ContactPhase::Moved);
        if moved {
            match active.as_slice() {
                [a, b] => intents.push(GestureIntent::Pinch {
                    a: a.position,
                    b: b.position,
                }),
                [only] if only.phase == ContactPhase::Moved && !self.is_long_pressing() => {
                    intents.push(GestureIntent::Drag {
                        position: only.position,
                    });
                }
                _ => {}
            }
        }

        if contacts.iter().any(|c| c.phase == ContactPhase::Ended) {
            self.press = None;
            intents.push(GestureIntent::ContactUp);
        }

        intents
    }

    fn primary_down(&mut self, contact: &TouchContact, now: f32, intents: &mut Vec<GestureIntent>) {
        self.press = Some(Press {
            id: contact.id,
            started_at: now,
            origin: contact.position,
            dragged: false,
            fired: false,
        });

        intents.push(GestureIntent::Tap {
            position: contact.position,
        });

        match self.last_tap_at {
            Some(last) if now - last <= self.settings.double_tap_window => {
                debug!("double tap at {}", contact.position);
                intents.push(GestureIntent::DoubleTap {
                    position: contact.position,
                });
                self.last_tap_at = None;
            }
            _ => self.last_tap_at = Some(now),
        }
    }

    fn check_long_press(&mut self, contact: &TouchContact, now: f32, intents: &mut Vec<GestureIntent>) {
        let threshold = self.settings.movement_threshold;
        let hold = self.settings.long_press_time;
        let Some(press) = self.press.as_mut().filter(|p| p.id == contact.id) else {
            return;
        };
        if press.fired || press.dragged {
            return;
        }
        if press.origin.distance(contact.position) >= threshold {
            press.dragged = true;
            return;
        }
        if now - press.started_at >= hold {
            press.fired = true;
            debug!("long press at {}", contact.position);
            intents.push(GestureIntent::LongPress {
                position: contact.position,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(contacts: &[(u64, Vec2, ContactPhase)]) -> TouchFrame {
        TouchFrame {
            contacts: contacts
                .iter()
                .map(|(id, p, phase)| TouchContact::new(*id, *p, *phase))
                .collect(),
        }
    }

    fn has(intents: &[GestureIntent], f: impl Fn(&GestureIntent) -> bool) -> bool {
        intents.iter().any(f)
    }

    fn is_double(i: &GestureIntent) -> bool {
        matches!(i, GestureIntent::DoubleTap { .. })
    }

    fn is_long(i: &GestureIntent) -> bool {
        matches!(i, GestureIntent::LongPress { .. })
    }

    fn tap(g: &mut GestureInterpreter, id: u64, at: f32) -> Vec<GestureIntent> {
        let p = Vec2::new(100.0, 200.0);
        let mut intents = g.interpret(&frame(&[(id, p, ContactPhase::Began)]), at);
        intents.extend(g.interpret(&frame(&[(id, p, ContactPhase::Ended)]), at + 0.05));
        intents
    }

    #[test]
    fn two_quick_taps_make_a_double_tap() {
        let mut g = GestureInterpreter::default();
        let first = tap(&mut g, 1, 0.0);
        assert!(has(&first, |i| matches!(i, GestureIntent::Tap { .. })));
        assert!(!has(&first, is_double));

        let second = tap(&mut g, 2, 0.25);
        assert!(has(&second, is_double));
    }

    #[test]
    fn slow_taps_do_not_double() {
        let mut g = GestureInterpreter::default();
        tap(&mut g, 1, 0.0);
        assert!(!has(&tap(&mut g, 2, 0.5), is_double));
        // The slow tap starts a new window.
        assert!(has(&tap(&mut g, 3, 0.7), is_double));
    }

    #[test]
    fn third_tap_does_not_double_again() {
        let mut g = GestureInterpreter::default();
        tap(&mut g, 1, 0.0);
        assert!(has(&tap(&mut g, 2, 0.2), is_double));
        assert!(!has(&tap(&mut g, 3, 0.4), is_double));
    }

    #[test]
    fn still_hold_fires_long_press_once() {
        let mut g = GestureInterpreter::default();
        let p = Vec2::new(50.0, 50.0);
        g.interpret(&frame(&[(1, p, ContactPhase::Began)]), 0.0);
        assert!(!has(&g.interpret(&frame(&[(1, p, ContactPhase::Stationary)]), 0.5), is_long));

        let jiggle = p + Vec2::new(3.0, 4.0);
        assert!(has(&g.interpret(&frame(&[(1, jiggle, ContactPhase::Moved)]), 0.75), is_long));
        assert!(g.is_long_pressing());
        assert!(!has(&g.interpret(&frame(&[(1, p, ContactPhase::Stationary)]), 1.5), is_long));
    }

    #[test]
    fn moving_press_never_becomes_long_press() {
        let mut g = GestureInterpreter::default();
        let p = Vec2::new(50.0, 50.0);
        g.interpret(&frame(&[(1, p, ContactPhase::Began)]), 0.0);
        let far = p + Vec2::new(12.0, 0.0);
        let intents = g.interpret(&frame(&[(1, far, ContactPhase::Moved)]), 0.2);
        assert!(has(&intents, |i| matches!(i, GestureIntent::Drag { .. })));

        // Back inside the threshold and held long enough: still a drag.
        assert!(!has(&g.interpret(&frame(&[(1, p, ContactPhase::Moved)]), 1.0), is_long));
    }

    #[test]
    fn no_drag_after_long_press() {
        let mut g = GestureInterpreter::default();
        let p = Vec2::new(50.0, 50.0);
        g.interpret(&frame(&[(1, p, ContactPhase::Began)]), 0.0);
        g.interpret(&frame(&[(1, p, ContactPhase::Stationary)]), 0.8);
        let intents = g.interpret(&frame(&[(1, p + Vec2::X * 20.0, ContactPhase::Moved)]), 0.9);
        assert!(!has(&intents, |i| matches!(i, GestureIntent::Drag { .. })));
    }

    #[test]
    fn release_clears_long_press_state() {
        let mut g = GestureInterpreter::default();
        let p = Vec2::new(50.0, 50.0);
        g.interpret(&frame(&[(1, p, ContactPhase::Began)]), 0.0);
        g.interpret(&frame(&[(1, p, ContactPhase::Stationary)]), 0.8);
        assert!(g.is_long_pressing());

        let up = g.interpret(&frame(&[(1, p, ContactPhase::Ended)]), 0.9);
        assert!(has(&up, |i| *i == GestureIntent::ContactUp));
        assert!(!g.is_long_pressing());
    }

    #[test]
    fn two_moving_contacts_pinch_in_id_order() {
        let mut g = GestureInterpreter::default();
        let a = Vec2::new(10.0, 10.0);
        let b = Vec2::new(110.0, 10.0);
        g.interpret(&frame(&[(1, a, ContactPhase::Began)]), 0.0);
        g.interpret(
            &frame(&[(1, a, ContactPhase::Stationary), (2, b, ContactPhase::Began)]),
            0.02,
        );
        let intents = g.interpret(
            &frame(&[(1, a, ContactPhase::Stationary), (2, b + Vec2::X * 5.0, ContactPhase::Moved)]),
            0.04,
        );
        assert!(intents.contains(&GestureIntent::Pinch {
            a,
            b: b + Vec2::X * 5.0
        }));
    }

    #[test]
    fn second_finger_cancels_pending_long_press() {
        let mut g = GestureInterpreter::default();
        let a = Vec2::new(10.0, 10.0);
        g.interpret(&frame(&[(1, a, ContactPhase::Began)]), 0.0);
        g.interpret(
            &frame(&[(1, a, ContactPhase::Stationary), (2, a + Vec2::X * 80.0, ContactPhase::Began)]),
            0.1,
        );
        // Second finger lifts, first keeps holding.
        g.interpret(
            &frame(&[(1, a, ContactPhase::Stationary), (2, a + Vec2::X * 80.0, ContactPhase::Ended)]),
            0.2,
        );
        assert!(!has(&g.interpret(&frame(&[(1, a, ContactPhase::Stationary)]), 1.0), is_long));
    }

    #[test]
    fn lifting_either_finger_drops_the_pending_press() {
        let mut g = GestureInterpreter::default();
        let a = Vec2::new(10.0, 10.0);
        let b = a + Vec2::X * 80.0;
        g.interpret(&frame(&[(1, a, ContactPhase::Began)]), 0.0);
        g.interpret(&frame(&[(1, a, ContactPhase::Stationary), (2, b, ContactPhase::Began)]), 0.1);
        // The pressing finger lifts; the joined one holds on alone.
        g.interpret(&frame(&[(1, a, ContactPhase::Ended), (2, b, ContactPhase::Stationary)]), 0.2);
        assert!(!has(&g.interpret(&frame(&[(2, b, ContactPhase::Stationary)]), 1.5), is_long));

        // A fresh lone press still works afterwards.
        g.interpret(&frame(&[(2, b, ContactPhase::Ended)]), 1.6);
        g.interpret(&frame(&[(3, a, ContactPhase::Began)]), 2.0);
        assert!(has(&g.interpret(&frame(&[(3, a, ContactPhase::Stationary)]), 2.8), is_long));
    }

    #[test]
    fn touch_down_and_up_in_one_frame_still_taps() {
        let mut g = GestureInterpreter::default();
        let p = Vec2::new(30.0, 40.0);
        let intents = g.interpret(&frame(&[(3, p, ContactPhase::Began), (3, p, ContactPhase::Ended)]), 0.0);
        assert_eq!(
            intents,
            vec![
                GestureIntent::ContactDown,
                GestureIntent::Tap { position: p },
                GestureIntent::ContactUp,
            ]
        );
        assert!(!g.is_long_pressing());

        let again = g.interpret(&frame(&[(4, p, ContactPhase::Began), (4, p, ContactPhase::Ended)]), 0.1);
        assert!(has(&again, is_double));
    }

    #[test]
    fn contact_down_and_up_bracket_every_sequence() {
        let mut g = GestureInterpreter::default();
        let p = Vec2::ZERO;
        let down = g.interpret(&frame(&[(4, p, ContactPhase::Began)]), 0.0);
        assert_eq!(down[0], GestureIntent::ContactDown);
        let up = g.interpret(&frame(&[(4, p, ContactPhase::Ended)]), 0.1);
        assert_eq!(up.last(), Some(&GestureIntent::ContactUp));
    }
}
