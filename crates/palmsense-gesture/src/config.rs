//! Gesture pipeline configuration
//!
//! Every tunable lives here under a name. The default is the canonical
//! profile; the alternate presets are the values the sound and spatial
//! consumers were tuned with.

use std::time::Duration;

use palmsense_core::FrameGeometry;

use crate::{ConfigError, ConfigResult};

/// Classifier thresholds
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdProfile {
    /// ext_avg mapped to openness 0
    pub openness_low: f32,
    /// ext_avg mapped to openness 1
    pub openness_high: f32,

    /// Finger score above which a finger counts as extended
    pub finger_extended: f32,
    /// Finger score below which a finger counts as folded
    pub finger_folded: f32,
    /// Fingers (out of 4) that must agree for open or closed
    pub min_fingers: usize,

    pub closed_ext_avg_max: f32,
    pub closed_thumb_max: f32,
    pub closed_openness_max: f32,

    pub open_ext_avg_min: f32,
    pub open_openness_min: f32,
}

impl Default for ThresholdProfile {
    fn default() -> Self {
        Self {
            openness_low: 0.02,
            openness_high: 0.10,
            finger_extended: 0.06,
            finger_folded: 0.015,
            min_fingers: 3,
            closed_ext_avg_max: 0.03,
            closed_thumb_max: 0.70,
            closed_openness_max: 0.28,
            open_ext_avg_min: 0.07,
            open_openness_min: 0.72,
        }
    }
}

/// Extra rules used by [`ClassifierPolicy::Holding`]
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingRules {
    /// While stable is open, stay open down to this openness
    pub open_hold_openness: f32,
    /// Extended fingers still required to stay open
    pub open_hold_min_fingers: usize,

    /// Enable the early-semi heuristic
    pub early_semi: bool,
    /// Index/middle mean score band for early semi
    pub early_semi_pair_min: f32,
    pub early_semi_pair_max: f32,
    /// Ring/pinky mean score must stay below this for early semi
    pub early_semi_others_max: f32,

    /// Openness at which an otherwise unmatched hand resolves to open
    pub fallback_open_openness: f32,
}

impl Default for HoldingRules {
    fn default() -> Self {
        Self {
            open_hold_openness: 0.48,
            open_hold_min_fingers: 2,
            early_semi: false,
            early_semi_pair_min: 0.015,
            early_semi_pair_max: 0.25,
            early_semi_others_max: 0.03,
            fallback_open_openness: 0.85,
        }
    }
}

/// How the classifier resolves the middle ground between open and closed
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ClassifierPolicy {
    /// Pure function of the current features, fixed bands
    #[default]
    Banded,
    /// Open is sticky once the stabilized state is open
    Holding(HoldingRules),
}

/// Motion estimator tunables
#[derive(Debug, Clone, PartialEq)]
pub struct MotionConfig {
    /// Multiplier applied to palm-normalized knuckle displacement
    pub sensitivity: f32,
    /// Smoothing factor toward the raw value while a hand is present
    pub rise: f32,
    /// Smoothing factor toward zero while no hand is present
    pub decay: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            sensitivity: 3.0,
            rise: 0.12,
            decay: 0.08,
        }
    }
}

/// Motion burst trigger tunables
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerConfig {
    /// Fire at or above this smoothed motion
    pub on: f32,
    /// Re-arm below this smoothed motion
    pub off: f32,
    /// Minimum time between bursts
    pub cooldown: Duration,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            on: 0.12,
            off: 0.07,
            cooldown: Duration::from_millis(260),
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq)]
pub struct GestureConfig {
    /// Preset name, for logs
    pub name: &'static str,
    /// Pixel size of the analysed frame
    pub geometry: FrameGeometry,
    /// Minimum time a raw state must persist before it is published
    pub hold: Duration,
    pub thresholds: ThresholdProfile,
    pub policy: ClassifierPolicy,
    pub motion: MotionConfig,
    pub trigger: TriggerConfig,
}

impl Default for GestureConfig {
    fn default() -> Self {
        // Canonical profile (poem scroll)
        GestureConfig {
            name: "canonical",
            geometry: FrameGeometry::default(),
            hold: Duration::from_millis(160),
            thresholds: ThresholdProfile::default(),
            policy: ClassifierPolicy::Banded,
            motion: MotionConfig::default(),
            trigger: TriggerConfig::default(),
        }
    }
}

impl GestureConfig {
    /// Preset for the ambient audio mixer: shorter hold, faster motion
    /// response, sticky open
    pub fn ambient_sound() -> Self {
        GestureConfig {
            name: "ambient-sound",
            hold: Duration::from_millis(140),
            policy: ClassifierPolicy::Holding(HoldingRules {
                early_semi: true,
                ..HoldingRules::default()
            }),
            motion: MotionConfig {
                rise: 0.18,
                decay: 0.12,
                ..MotionConfig::default()
            },
            ..Self::default()
        }
    }

    /// Preset for the particle and text fields
    pub fn spatial_field() -> Self {
        GestureConfig {
            name: "spatial-field",
            motion: MotionConfig {
                rise: 0.18,
                decay: 0.12,
                ..MotionConfig::default()
            },
            ..Self::default()
        }
    }

    /// Look a preset up by name
    pub fn preset(name: &str) -> ConfigResult<Self> {
        match name {
            "canonical" | "default" => Ok(Self::default()),
            "ambient-sound" => Ok(Self::ambient_sound()),
            "spatial-field" => Ok(Self::spatial_field()),
            other => Err(ConfigError::UnknownProfile(other.to_string())),
        }
    }

    pub fn with_hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    pub fn with_geometry(mut self, geometry: FrameGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_policy(mut self, policy: ClassifierPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_motion(mut self, motion: MotionConfig) -> Self {
        self.motion = motion;
        self
    }

    /// Check every invariant the pipeline relies on
    pub fn validate(&self) -> ConfigResult<()> {
        if self.hold.is_zero() {
            return Err(ConfigError::ZeroHold);
        }

        let g = &self.geometry;
        if !(g.width.is_finite() && g.height.is_finite() && g.width > 0.0 && g.height > 0.0) {
            return Err(ConfigError::InvalidGeometry {
                width: g.width,
                height: g.height,
            });
        }

        let t = &self.thresholds;
        if !(t.openness_low < t.openness_high) {
            return Err(ConfigError::EmptyOpennessBand {
                low: t.openness_low,
                high: t.openness_high,
            });
        }
        if !(t.finger_folded < t.finger_extended) {
            return Err(ConfigError::FingerThresholdsInverted {
                folded: t.finger_folded,
                extended: t.finger_extended,
            });
        }
        // Keeps the closed and open rule sets mutually exclusive
        if !(t.closed_openness_max < t.open_openness_min) {
            return Err(ConfigError::OverlappingBands {
                closed_max: t.closed_openness_max,
                open_min: t.open_openness_min,
            });
        }
        if !(1..=4).contains(&t.min_fingers) {
            return Err(ConfigError::FingerCount(t.min_fingers));
        }
        if let ClassifierPolicy::Holding(rules) = &self.policy {
            if !(1..=4).contains(&rules.open_hold_min_fingers) {
                return Err(ConfigError::FingerCount(rules.open_hold_min_fingers));
            }
        }

        let m = &self.motion;
        check_factor("motion.rise", m.rise)?;
        check_factor("motion.decay", m.decay)?;
        if !(m.sensitivity.is_finite() && m.sensitivity > 0.0) {
            return Err(ConfigError::InvalidSensitivity(m.sensitivity));
        }

        if !(self.trigger.off < self.trigger.on) {
            return Err(ConfigError::TriggerInverted {
                on: self.trigger.on,
                off: self.trigger.off,
            });
        }

        Ok(())
    }
}

fn check_factor(name: &'static str, value: f32) -> ConfigResult<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::SmoothingOutOfRange { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        for config in [
            GestureConfig::default(),
            GestureConfig::ambient_sound(),
            GestureConfig::spatial_field(),
        ] {
            assert_eq!(config.validate(), Ok(()), "{}", config.name);
        }
    }

    #[test]
    fn test_preset_lookup() {
        assert_eq!(GestureConfig::preset("ambient-sound").unwrap().hold, Duration::from_millis(140));
        assert_eq!(GestureConfig::preset("default").unwrap().name, "canonical");
        assert_eq!(
            GestureConfig::preset("lullaby"),
            Err(ConfigError::UnknownProfile("lullaby".into()))
        );
    }

    #[test]
    fn test_rejects_overlapping_bands() {
        let mut config = GestureConfig::default();
        config.thresholds.closed_openness_max = 0.8;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::OverlappingBands { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_tunables() {
        let zero_hold = GestureConfig::default().with_hold(Duration::ZERO);
        assert_eq!(zero_hold.validate(), Err(ConfigError::ZeroHold));

        let mut config = GestureConfig::default();
        config.motion.decay = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SmoothingOutOfRange { name: "motion.decay", .. })
        ));

        let flat = GestureConfig::default().with_geometry(FrameGeometry::new(0.0, 480.0));
        assert!(matches!(flat.validate(), Err(ConfigError::InvalidGeometry { .. })));

        let mut config = GestureConfig::default();
        config.trigger.off = 0.2;
        assert!(matches!(config.validate(), Err(ConfigError::TriggerInverted { .. })));
    }
}
