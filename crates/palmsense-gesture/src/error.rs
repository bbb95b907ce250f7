//! Configuration errors

use thiserror::Error;

/// Rejections raised by [`crate::GestureConfig::validate`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Hold duration must be positive")]
    ZeroHold,

    #[error("Frame geometry must be positive and finite: {width}x{height}")]
    InvalidGeometry { width: f32, height: f32 },

    #[error("Openness band is empty: low {low} >= high {high}")]
    EmptyOpennessBand { low: f32, high: f32 },

    #[error("Finger thresholds inverted: folded {folded} >= extended {extended}")]
    FingerThresholdsInverted { folded: f32, extended: f32 },

    #[error("Closed and open bands overlap: closed max {closed_max} >= open min {open_min}")]
    OverlappingBands { closed_max: f32, open_min: f32 },

    #[error("Finger count {0} outside 1..=4")]
    FingerCount(usize),

    #[error("Smoothing factor {name} out of range (0, 1]: {value}")]
    SmoothingOutOfRange { name: &'static str, value: f32 },

    #[error("Motion sensitivity must be positive: {0}")]
    InvalidSensitivity(f32),

    #[error("Trigger thresholds inverted: off {off} >= on {on}")]
    TriggerInverted { on: f32, off: f32 },

    #[error("Unknown profile: {0}")]
    UnknownProfile(String),
}

/// Result type for configuration
pub type ConfigResult<T> = Result<T, ConfigError>;
