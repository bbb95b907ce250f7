//! End-to-end Integration Test Suite
//!
//! Tests that verify the complete gesture flow:
//! - Open, closed and semi poses reach consumers with the right intensity
//! - Flicker never reaches consumers
//! - Dropout and reappearance never produce motion spikes
//! - Several consumers fed from one slot stay consistent

use palmsense_core::Point3;
use palmsense_gesture::{GestureConfig, GestureSignal};
use palmsense_runtime::{RuntimeResult, Stage, StageConfig};
use palmsense_time::ManualClock;

use crate::{LandmarkChaos, SyntheticHand};

// ============================================================================
// STAGE HARNESS
// ============================================================================

/// A stage on a manual 60 fps clock, fed frame by frame
pub struct StageHarness {
    stage: Stage<ManualClock>,
    chaos: Option<LandmarkChaos>,
}

impl StageHarness {
    /// Stage with one consumer per `(name, config)`
    pub fn new(consumers: &[(&str, GestureConfig)]) -> RuntimeResult<Self> {
        let mut stage = Stage::with_clock(StageConfig::default(), ManualClock::sixty_hz())?;
        for (name, config) in consumers {
            stage.add_consumer(*name, config.clone())?;
        }
        Ok(StageHarness { stage, chaos: None })
    }

    pub fn with_chaos(mut self, chaos: LandmarkChaos) -> Self {
        self.chaos = Some(chaos);
        self
    }

    /// Publish one detector frame, then tick once
    pub fn feed(&mut self, frame: Option<Vec<Point3>>) {
        let frame = match self.chaos.as_mut() {
            Some(chaos) => chaos.apply(frame),
            None => frame,
        };
        let slot = self.stage.slot();
        match frame {
            Some(points) => slot.publish(points, None),
            None => slot.clear(),
        };
        self.stage.tick();
    }

    /// Feed the same hand for `ticks` ticks
    pub fn hold(&mut self, hand: &SyntheticHand, ticks: usize) {
        for _ in 0..ticks {
            self.feed(Some(hand.points()));
        }
    }

    /// Tick without publishing (the detector is slower than the render loop)
    pub fn idle_tick(&mut self) {
        self.stage.tick();
    }

    pub fn signal(&self, consumer: &str) -> Option<GestureSignal> {
        self.stage.signal(consumer).copied()
    }

    pub fn stage(&self) -> &Stage<ManualClock> {
        &self.stage
    }
}
