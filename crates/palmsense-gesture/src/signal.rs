//! Published gesture signal
//!
//! One value per tick, overwritten wholesale. Consumers only ever get a
//! shared reference or a copy.

use std::fmt;

use palmsense_core::{Emotion, FrameTime, GestureState};

/// Everything a rendering or audio consumer reads from the pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSignal {
    /// Tick counter of the pipeline that produced this signal
    pub tick: u64,
    /// Frame time of that tick
    pub at: FrameTime,
    /// Stabilized state
    pub state: GestureState,
    /// Intensity of the stabilized state, in [0, 1]
    pub intensity: f32,
    /// Smoothed motion, in [0, 1]. Already filtered: do not smooth again.
    pub motion: f32,
    /// True on the tick `state` changed
    pub transition: bool,
    /// True on the tick a motion burst fired
    pub motion_burst: bool,
}

impl GestureSignal {
    /// Signal before the first tick
    pub fn idle() -> Self {
        Self {
            tick: 0,
            at: FrameTime::ZERO,
            state: GestureState::None,
            intensity: 0.0,
            motion: 0.0,
            transition: false,
            motion_burst: false,
        }
    }

    pub fn emotion(&self) -> Emotion {
        self.state.emotion()
    }

    pub fn hand_present(&self) -> bool {
        self.state.is_hand()
    }
}

impl Default for GestureSignal {
    fn default() -> Self {
        Self::idle()
    }
}

impl fmt::Display for GestureSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "State: {} | emotion: {} | intensity: {:.2} | motion: {:.2}",
            self.state,
            self.emotion(),
            self.intensity,
            self.motion
        )
    }
}
