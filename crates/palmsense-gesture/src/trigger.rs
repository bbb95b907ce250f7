//! Motion burst trigger
//!
//! Schmitt trigger over the smoothed motion signal. Consumers use the burst
//! edge for discrete changes (e.g. stepping a background palette) rather
//! than following motion continuously.

use palmsense_core::FrameTime;
use tracing::debug;

use crate::TriggerConfig;

#[derive(Debug, Clone)]
pub struct MotionTrigger {
    config: TriggerConfig,
    armed: bool,
    /// Cooldown is measured from here
    cooldown_from: FrameTime,
}

impl MotionTrigger {
    pub fn new(config: TriggerConfig) -> Self {
        Self {
            config,
            armed: true,
            cooldown_from: FrameTime::ZERO,
        }
    }

    /// Returns true on the tick a burst fires
    pub fn update(&mut self, hand_present: bool, motion: f32, now: FrameTime) -> bool {
        if !hand_present {
            self.armed = true;
            self.cooldown_from = now;
            return false;
        }

        if motion < self.config.off {
            self.armed = true;
        }

        if self.armed && motion >= self.config.on && now - self.cooldown_from >= self.config.cooldown {
            self.armed = false;
            self.cooldown_from = now;
            debug!(motion, "motion burst");
            return true;
        }

        false
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}
