//! State stabilization
//!
//! A raw state is published only after it has persisted for longer than the
//! hold duration. Anything that flips faster than that never reaches
//! consumers.

use std::time::Duration;

use palmsense_core::{FrameTime, GestureState};
use tracing::debug;

/// Result of one stabilizer update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilizerStep {
    /// Published state
    pub state: GestureState,
    /// True only on the tick the published state changed
    pub transition: bool,
    /// Intensity that belongs to the published state
    pub intensity: f32,
}

/// Minimum-hold debouncer over {open, semi, closed, none}
#[derive(Debug, Clone)]
pub struct StateStabilizer {
    hold: Duration,
    /// Last raw state seen
    last_raw: GestureState,
    /// When `last_raw` started; `None` before the first update
    raw_since: Option<FrameTime>,
    /// Published state
    stable: GestureState,
    /// Intensity last observed while raw matched the published state
    held_intensity: f32,
}

impl StateStabilizer {
    pub fn new(hold: Duration) -> Self {
        Self {
            hold,
            last_raw: GestureState::None,
            raw_since: None,
            stable: GestureState::None,
            held_intensity: 0.0,
        }
    }

    /// Feed one tick's raw state
    pub fn update(&mut self, raw: GestureState, raw_intensity: f32, now: FrameTime) -> StabilizerStep {
        let since = match self.raw_since {
            Some(t) if raw == self.last_raw => t,
            _ => {
                self.last_raw = raw;
                self.raw_since = Some(now);
                now
            }
        };

        let mut transition = false;
        if raw != self.stable && now - since > self.hold {
            debug!(
                from = %self.stable,
                to = %raw,
                held_ms = (now - since).as_millis() as u64,
                "gesture state stabilized"
            );
            self.stable = raw;
            transition = true;
        }

        if raw == self.stable {
            self.held_intensity = if raw.is_hand() { raw_intensity } else { 0.0 };
        }

        StabilizerStep {
            state: self.stable,
            transition,
            intensity: if self.stable.is_hand() {
                self.held_intensity
            } else {
                0.0
            },
        }
    }

    pub fn stable(&self) -> GestureState {
        self.stable
    }

    /// Raw state currently pending (equal to `stable()` when nothing is pending)
    pub fn pending(&self) -> GestureState {
        self.last_raw
    }

    pub fn hold(&self) -> Duration {
        self.hold
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.hold);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOLD: Duration = Duration::from_millis(150);

    fn ms(v: i64) -> FrameTime {
        FrameTime::from_millis(v)
    }

    #[test]
    fn test_starts_at_none() {
        let mut s = StateStabilizer::new(HOLD);
        let step = s.update(GestureState::None, 0.0, ms(0));
        assert_eq!(step.state, GestureState::None);
        assert!(!step.transition);
    }

    #[test]
    fn test_fast_oscillation_never_publishes() {
        let mut s = StateStabilizer::new(HOLD);
        for i in 0..40 {
            let raw = if i % 2 == 0 {
                GestureState::Open
            } else {
                GestureState::Closed
            };
            let step = s.update(raw, 1.0, ms(i * 50));
            assert_eq!(step.state, GestureState::None);
            assert!(!step.transition);
        }
    }

    #[test]
    fn test_converges_after_hold() {
        let mut s = StateStabilizer::new(HOLD);
        let mut edges = 0;
        let mut first_open = None;

        for i in 0..20 {
            let t = i * 16;
            let step = s.update(GestureState::Open, 0.8, ms(t));
            if step.transition {
                edges += 1;
                first_open = Some(t);
            }
        }

        assert_eq!(edges, 1);
        let t = first_open.unwrap();
        // First tick strictly past the hold window
        assert!(t > 150 && t <= 150 + 16);
        assert_eq!(s.stable(), GestureState::Open);
    }

    #[test]
    fn test_exactly_hold_is_not_enough() {
        let mut s = StateStabilizer::new(HOLD);
        s.update(GestureState::Semi, 1.0, ms(0));
        assert_eq!(s.update(GestureState::Semi, 1.0, ms(150)).state, GestureState::None);
        assert_eq!(s.update(GestureState::Semi, 1.0, ms(151)).state, GestureState::Semi);
    }

    #[test]
    fn test_hand_loss_is_debounced_too() {
        let mut s = StateStabilizer::new(HOLD);
        s.update(GestureState::Open, 0.9, ms(0));
        s.update(GestureState::Open, 0.9, ms(200));
        assert_eq!(s.stable(), GestureState::Open);

        // Brief dropout
        s.update(GestureState::None, 0.0, ms(216));
        s.update(GestureState::None, 0.0, ms(300));
        let back = s.update(GestureState::Open, 0.7, ms(316));
        assert_eq!(back.state, GestureState::Open);
        assert!(!back.transition);

        // Sustained loss
        s.update(GestureState::None, 0.0, ms(400));
        let lost = s.update(GestureState::None, 0.0, ms(600));
        assert_eq!(lost.state, GestureState::None);
        assert!(lost.transition);
        assert_eq!(lost.intensity, 0.0);
    }

    #[test]
    fn test_intensity_held_while_pending() {
        let mut s = StateStabilizer::new(HOLD);
        s.update(GestureState::Open, 0.9, ms(0));
        let step = s.update(GestureState::Open, 0.8, ms(200));
        assert_eq!(step.intensity, 0.8);

        // Closed pending: published intensity still belongs to open
        let step = s.update(GestureState::Closed, 0.3, ms(216));
        assert_eq!(step.state, GestureState::Open);
        assert_eq!(step.intensity, 0.8);

        let step = s.update(GestureState::Closed, 0.4, ms(400));
        assert_eq!(step.state, GestureState::Closed);
        assert!(step.transition);
        assert_eq!(step.intensity, 0.4);
    }

    #[test]
    fn test_reset() {
        let mut s = StateStabilizer::new(HOLD);
        s.update(GestureState::Open, 0.9, ms(0));
        s.update(GestureState::Open, 0.9, ms(200));
        s.reset();
        assert_eq!(s.stable(), GestureState::None);
        assert_eq!(s.hold(), HOLD);
    }
}
