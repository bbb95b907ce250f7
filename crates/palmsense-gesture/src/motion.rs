//! Motion estimation
//!
//! Spatial motion only: opening or closing the hand does not register,
//! because only the wrist and the four knuckles are tracked.

use palmsense_core::{FrameGeometry, HandLandmark, LandmarkSet, Point3};

use crate::features::finite_or_zero;
use crate::{HandFeatures, MotionConfig, MIN_PALM_DENOMINATOR};

/// Motion for one tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionReading {
    /// Unsmoothed magnitude in [0, 1]
    pub raw: f32,
    /// Published signal in [0, 1]
    pub smoothed: f32,
}

/// Knuckle displacement tracker with one-pole smoothing
#[derive(Debug, Clone)]
pub struct MotionEstimator {
    config: MotionConfig,
    geometry: FrameGeometry,
    /// Knuckle positions (pixels) from the previous hand sample
    previous: Option<[Point3; 5]>,
    smoothed: f32,
}

impl MotionEstimator {
    pub fn new(config: MotionConfig, geometry: FrameGeometry) -> Self {
        Self {
            config,
            geometry,
            previous: None,
            smoothed: 0.0,
        }
    }

    /// Feed one tick: a hand sample, or `None` when no hand is present
    pub fn update(&mut self, sample: Option<(&LandmarkSet, &HandFeatures)>) -> MotionReading {
        match sample {
            Some((set, features)) => self.observe(set, features),
            None => self.lose_hand(),
        }
    }

    /// A hand is present this tick
    pub fn observe(&mut self, set: &LandmarkSet, features: &HandFeatures) -> MotionReading {
        let knuckles = HandLandmark::knuckles().map(|l| self.geometry.to_pixels(set.get(l)));

        let raw = match &self.previous {
            Some(prev) => {
                let total: f32 = knuckles
                    .iter()
                    .zip(prev.iter())
                    .map(|(a, b)| a.planar_distance(b))
                    .sum();
                let mean = total / knuckles.len() as f32;
                let spatial = mean / features.palm_size.max(MIN_PALM_DENOMINATOR);
                unit(spatial * self.config.sensitivity)
            }
            None => 0.0,
        };

        self.previous = Some(knuckles);
        self.smoothed = unit(lerp(self.smoothed, raw, self.config.rise));

        MotionReading {
            raw,
            smoothed: self.smoothed,
        }
    }

    /// No hand this tick: forget the last sample and let the signal fade
    pub fn lose_hand(&mut self) -> MotionReading {
        self.previous = None;
        self.smoothed = unit(lerp(self.smoothed, 0.0, self.config.decay));

        MotionReading {
            raw: 0.0,
            smoothed: self.smoothed,
        }
    }

    /// Current published signal
    pub fn signal(&self) -> f32 {
        self.smoothed
    }

    /// Whether the next hand sample will be compared against a previous one
    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    pub fn reset(&mut self) {
        self.previous = None;
        self.smoothed = 0.0;
    }
}

#[inline]
pub(crate) fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Clamp into [0, 1]; NaN collapses to 0, +inf saturates to 1
#[inline]
fn unit(v: f32) -> f32 {
    if v == f32::INFINITY {
        1.0
    } else {
        finite_or_zero(v).clamp(0.0, 1.0)
    }
}
