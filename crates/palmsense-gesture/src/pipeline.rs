//! Gesture pipeline - one instance per consumer
//!
//! Owns the rolling memory (previous knuckles, stabilized state, smoothed
//! motion, trigger arming) and runs the stages in a fixed order against a
//! single landmark snapshot per tick.

use palmsense_core::{FrameTime, GestureState, LandmarkSet, Point3};
use tracing::{trace, warn};

use crate::{
    extract_features, Classification, ConfigResult, GestureClassifier, GestureConfig,
    GestureSignal, HandFeatures, LandmarkSlot, MotionEstimator, MotionTrigger, StateStabilizer,
};

/// Counters kept by a pipeline
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub ticks: u64,
    pub hands_seen: u64,
    pub malformed_frames: u64,
    pub transitions: u64,
    pub motion_bursts: u64,
}

/// Feature extraction, motion, classification and stabilization for one consumer
#[derive(Debug)]
pub struct GesturePipeline {
    config: GestureConfig,
    motion: MotionEstimator,
    classifier: GestureClassifier,
    stabilizer: StateStabilizer,
    trigger: MotionTrigger,
    signal: GestureSignal,
    /// Last hand features and raw classification, for diagnostics
    last_features: Option<HandFeatures>,
    last_classification: Option<Classification>,
    stats: PipelineStats,
}

impl GesturePipeline {
    /// Create a pipeline from a validated configuration
    pub fn new(config: GestureConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: GestureConfig) -> Self {
        Self {
            motion: MotionEstimator::new(config.motion.clone(), config.geometry),
            classifier: GestureClassifier::from_config(&config),
            stabilizer: StateStabilizer::new(config.hold),
            trigger: MotionTrigger::new(config.trigger.clone()),
            signal: GestureSignal::idle(),
            last_features: None,
            last_classification: None,
            stats: PipelineStats::default(),
            config,
        }
    }

    /// Evaluate one tick from raw detector output.
    ///
    /// `None` means no hand. A detection that fails validation is discarded
    /// and the tick is evaluated as no hand.
    pub fn tick(&mut self, detection: Option<&[Point3]>, now: FrameTime) -> &GestureSignal {
        let set = match detection {
            None => None,
            Some(points) => match LandmarkSet::from_points(points) {
                Ok(set) => Some(set),
                Err(error) => {
                    self.stats.malformed_frames += 1;
                    warn!(profile = self.config.name, %error, "discarding landmark frame");
                    None
                }
            },
        };
        self.evaluate(set.as_ref(), now)
    }

    /// Evaluate one tick from the latest detection in a slot.
    /// The slot is read exactly once.
    pub fn tick_slot(&mut self, slot: &LandmarkSlot, now: FrameTime) -> &GestureSignal {
        let snapshot = slot.latest();
        self.tick(snapshot.as_deref().map(|d| d.points.as_slice()), now)
    }

    /// Evaluate one tick from an already validated landmark set
    pub fn evaluate(&mut self, set: Option<&LandmarkSet>, now: FrameTime) -> &GestureSignal {
        self.stats.ticks += 1;

        let features = set.map(|s| extract_features(s, &self.config.geometry));

        let motion = match (set, features.as_ref()) {
            (Some(s), Some(f)) => self.motion.observe(s, f),
            _ => self.motion.lose_hand(),
        };

        let classification = features
            .as_ref()
            .map(|f| self.classifier.classify(f, self.stabilizer.stable()));
        let (raw, raw_intensity) = classification
            .map(|c| (c.state, c.intensity))
            .unwrap_or((GestureState::None, 0.0));

        let step = self.stabilizer.update(raw, raw_intensity, now);
        let burst = self.trigger.update(set.is_some(), motion.smoothed, now);

        if set.is_some() {
            self.stats.hands_seen += 1;
        }
        if step.transition {
            self.stats.transitions += 1;
        }
        if burst {
            self.stats.motion_bursts += 1;
        }

        self.last_features = features;
        self.last_classification = classification;
        self.signal = GestureSignal {
            tick: self.stats.ticks,
            at: now,
            state: step.state,
            intensity: step.intensity,
            motion: motion.smoothed,
            transition: step.transition,
            motion_burst: burst,
        };

        trace!(
            profile = self.config.name,
            tick = self.stats.ticks,
            raw = %raw,
            state = %step.state,
            intensity = step.intensity,
            motion = motion.smoothed,
            "gesture tick"
        );

        &self.signal
    }

    /// Signal published by the last tick
    pub fn signal(&self) -> &GestureSignal {
        &self.signal
    }

    /// Raw (unstabilized) state of the last tick
    pub fn raw_state(&self) -> GestureState {
        self.last_classification
            .map(|c| c.state)
            .unwrap_or(GestureState::None)
    }

    pub fn last_features(&self) -> Option<&HandFeatures> {
        self.last_features.as_ref()
    }

    pub fn last_classification(&self) -> Option<&Classification> {
        self.last_classification.as_ref()
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Forget all rolling memory, keeping the configuration
    pub fn reset(&mut self) {
        *self = Self::build(self.config.clone());
    }
}

impl Default for GesturePipeline {
    fn default() -> Self {
        Self::build(GestureConfig::default())
    }
}
