//! Clock implementations for frame-driven evaluation

use std::time::{Duration, Instant};

use palmsense_core::FrameTime;

/// Anything that can stamp a tick with a [`FrameTime`]
pub trait FrameClock {
    /// Advance to the current tick and return its time
    fn tick(&mut self) -> FrameTime;

    /// Time of the last tick, without advancing
    fn now(&self) -> FrameTime;
}

/// Wall-clock frame clock
/// INVARIANT: time is monotonically non-decreasing and never advances by
/// more than `max_step` in a single tick
pub struct MonotonicClock {
    /// Current frame time
    value: FrameTime,
    /// Last update instant
    last_update: Instant,
    /// Largest advance accepted per tick
    max_step: Duration,
}

impl MonotonicClock {
    /// Default cap on a single tick's advance
    pub const DEFAULT_MAX_STEP: Duration = Duration::from_millis(250);

    /// Create a new clock starting at zero
    pub fn new() -> Self {
        Self::with_max_step(Self::DEFAULT_MAX_STEP)
    }

    pub fn with_max_step(max_step: Duration) -> Self {
        MonotonicClock {
            value: FrameTime::ZERO,
            last_update: Instant::now(),
            max_step,
        }
    }

    pub fn max_step(&self) -> Duration {
        self.max_step
    }
}

impl FrameClock for MonotonicClock {
    fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update);

        // Clamp to prevent large jumps (e.g., after system sleep)
        let clamped = elapsed.min(self.max_step);

        self.value = self.value.saturating_add(clamped);
        self.last_update = now;
        self.value
    }

    fn now(&self) -> FrameTime {
        self.value
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Explicitly driven clock.
///
/// Each `tick()` advances by the configured step unless the time was set
/// directly since the previous tick.
#[derive(Debug, Clone)]
pub struct ManualClock {
    value: FrameTime,
    step: Duration,
    pending: Option<FrameTime>,
}

impl ManualClock {
    pub fn new(step: Duration) -> Self {
        ManualClock {
            value: FrameTime::ZERO,
            step,
            pending: None,
        }
    }

    /// ~60 fps
    pub fn sixty_hz() -> Self {
        Self::new(Duration::from_micros(16_667))
    }

    /// Jump to a specific time on the next tick. Backward targets are ignored.
    pub fn set(&mut self, target: FrameTime) {
        if target >= self.value {
            self.pending = Some(target);
        }
    }

    /// Advance immediately by an arbitrary amount
    pub fn advance(&mut self, dt: Duration) -> FrameTime {
        self.value = self.value.saturating_add(dt);
        self.value
    }

    pub fn step(&self) -> Duration {
        self.step
    }
}

impl FrameClock for ManualClock {
    fn tick(&mut self) -> FrameTime {
        self.value = match self.pending.take() {
            Some(target) => target,
            None => self.value.saturating_add(self.step),
        };
        self.value
    }

    fn now(&self) -> FrameTime {
        self.value
    }
}
