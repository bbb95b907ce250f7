//! Gesture classification
//!
//! Maps hand features to one of open / semi / closed plus an intensity.
//! Rules are checked in a fixed order (closed, then open, then semi) and
//! semi absorbs everything else, so classification is total.
//!
//! The closed and open bands are separated by an openness gap
//! (`closed_openness_max < open_openness_min`), so no feature vector can
//! satisfy both. The gap doubles as hysteresis against sensor noise.

use palmsense_core::GestureState;

use crate::{ClassifierPolicy, GestureConfig, HandFeatures, HoldingRules, ThresholdProfile};

/// Classifier output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// Never [`GestureState::None`]
    pub state: GestureState,
    /// How strongly the state's defining feature is expressed, in [0, 1]
    pub intensity: f32,
    /// Normalized ext_avg, in [0, 1]
    pub openness: f32,
}

/// Linear map of `x` from `[low, high]` to `[0, 1]`, unclamped.
/// An empty input range maps to 0.
pub fn map01(x: f32, low: f32, high: f32) -> f32 {
    let span = high - low;
    if span == 0.0 || !span.is_finite() {
        return 0.0;
    }
    (x - low) / span
}

/// Openness in [0, 1] derived from the mean finger extension
pub fn openness(ext_avg: f32, profile: &ThresholdProfile) -> f32 {
    let v = map01(ext_avg, profile.openness_low, profile.openness_high);
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// Intensity of `state` at a given openness
pub fn intensity_for(state: GestureState, openness: f32) -> f32 {
    let v = match state {
        GestureState::Open => openness,
        GestureState::Closed => 1.0 - openness,
        GestureState::Semi => 1.0 - (openness - 0.5).abs() * 2.0,
        GestureState::None => 0.0,
    };
    v.clamp(0.0, 1.0)
}

/// Threshold classifier
#[derive(Debug, Clone)]
pub struct GestureClassifier {
    profile: ThresholdProfile,
    policy: ClassifierPolicy,
}

impl GestureClassifier {
    pub fn new(profile: ThresholdProfile, policy: ClassifierPolicy) -> Self {
        Self { profile, policy }
    }

    pub fn from_config(config: &GestureConfig) -> Self {
        Self::new(config.thresholds.clone(), config.policy.clone())
    }

    pub fn profile(&self) -> &ThresholdProfile {
        &self.profile
    }

    pub fn policy(&self) -> &ClassifierPolicy {
        &self.policy
    }

    /// Classify one tick's features.
    ///
    /// `stable` is the currently published state. The banded policy ignores
    /// it; the holding policy uses it to keep open sticky.
    pub fn classify(&self, features: &HandFeatures, stable: GestureState) -> Classification {
        let open = openness(features.ext_avg, &self.profile);

        let state = match &self.policy {
            ClassifierPolicy::Banded => self.banded(features, open),
            ClassifierPolicy::Holding(rules) => self.holding(features, open, stable, rules),
        };

        Classification {
            state,
            intensity: intensity_for(state, open),
            openness: open,
        }
    }

    fn banded(&self, f: &HandFeatures, open: f32) -> GestureState {
        if self.is_closed(f, open) {
            GestureState::Closed
        } else if self.is_open(f, open) {
            GestureState::Open
        } else {
            GestureState::Semi
        }
    }

    fn holding(
        &self,
        f: &HandFeatures,
        open: f32,
        stable: GestureState,
        rules: &HoldingRules,
    ) -> GestureState {
        if self.is_closed(f, open) {
            return GestureState::Closed;
        }

        let open_hold = stable == GestureState::Open
            && open >= rules.open_hold_openness
            && f.count_above(self.profile.finger_extended) >= rules.open_hold_min_fingers;
        if self.is_open(f, open) || open_hold {
            return GestureState::Open;
        }

        if rules.early_semi && Self::is_early_semi(f, rules) {
            return GestureState::Semi;
        }
        if open >= rules.fallback_open_openness {
            return GestureState::Open;
        }
        GestureState::Semi
    }

    fn is_closed(&self, f: &HandFeatures, open: f32) -> bool {
        let p = &self.profile;
        f.count_below(p.finger_folded) >= p.min_fingers
            && f.ext_avg < p.closed_ext_avg_max
            && f.thumb_open < p.closed_thumb_max
            && open < p.closed_openness_max
    }

    fn is_open(&self, f: &HandFeatures, open: f32) -> bool {
        let p = &self.profile;
        f.count_above(p.finger_extended) >= p.min_fingers
            && f.ext_avg > p.open_ext_avg_min
            && open > p.open_openness_min
    }

    fn is_early_semi(f: &HandFeatures, rules: &HoldingRules) -> bool {
        let pair = (f.index() + f.middle()) * 0.5;
        let others = (f.ring() + f.pinky()) * 0.5;
        pair >= rules.early_semi_pair_min
            && pair <= rules.early_semi_pair_max
            && others < rules.early_semi_others_max
    }
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new(ThresholdProfile::default(), ClassifierPolicy::Banded)
    }
}
