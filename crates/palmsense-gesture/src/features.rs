//! Feature extraction
//!
//! Turns a landmark set into a palm-normalized summary. Every score is a
//! distance difference divided by the palm size, so it does not change as
//! the hand moves toward or away from the camera.

use palmsense_core::{FrameGeometry, HandLandmark, LandmarkSet, Point3};

/// Smallest palm size (in pixels) used as a denominator
pub const MIN_PALM_DENOMINATOR: f32 = 1.0;

/// Palm-normalized summary of one hand
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HandFeatures {
    /// Wrist to middle-finger knuckle, in pixels
    pub palm_size: f32,
    /// Extension scores for index, middle, ring, pinky.
    /// Positive means the tip is further from the wrist than the PIP joint.
    pub fingers: [f32; 4],
    /// Thumb tip to thumb MCP, palm-normalized
    pub thumb_open: f32,
    /// Mean of the four finger scores
    pub ext_avg: f32,
}

impl HandFeatures {
    /// Build features from precomputed scores
    pub fn from_scores(palm_size: f32, fingers: [f32; 4], thumb_open: f32) -> Self {
        let ext_avg = fingers.iter().sum::<f32>() / 4.0;
        Self {
            palm_size,
            fingers,
            thumb_open,
            ext_avg,
        }
    }

    pub fn index(&self) -> f32 {
        self.fingers[0]
    }

    pub fn middle(&self) -> f32 {
        self.fingers[1]
    }

    pub fn ring(&self) -> f32 {
        self.fingers[2]
    }

    pub fn pinky(&self) -> f32 {
        self.fingers[3]
    }

    /// Fingers scoring strictly above `threshold`
    pub fn count_above(&self, threshold: f32) -> usize {
        self.fingers.iter().filter(|&&v| v > threshold).count()
    }

    /// Fingers scoring strictly below `threshold`
    pub fn count_below(&self, threshold: f32) -> usize {
        self.fingers.iter().filter(|&&v| v < threshold).count()
    }
}

/// Extract features from a validated landmark set.
///
/// Never fails: the palm denominator is clamped to one pixel and any
/// non-finite intermediate collapses to zero.
pub fn extract_features(set: &LandmarkSet, geometry: &FrameGeometry) -> HandFeatures {
    let px = set.to_pixels(geometry);
    let at = |l: HandLandmark| -> &Point3 { &px[l.index()] };

    let wrist = at(HandLandmark::Wrist);
    let palm_size = finite_or_zero(wrist.planar_distance(at(HandLandmark::MiddleMcp)));
    let denom = palm_size.max(MIN_PALM_DENOMINATOR);

    let fingers = HandLandmark::finger_joints().map(|(tip, pip)| {
        let reach = wrist.planar_distance(at(tip)) - wrist.planar_distance(at(pip));
        finite_or_zero(reach / denom)
    });

    let thumb_open = finite_or_zero(
        at(HandLandmark::ThumbTip).planar_distance(at(HandLandmark::ThumbMcp)) / denom,
    );

    HandFeatures::from_scores(palm_size, fingers, thumb_open)
}

#[inline]
pub(crate) fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}
