//! Runtime and replay errors

use std::path::PathBuf;
use std::time::Duration;

use palmsense_core::FrameTime;
use palmsense_gesture::ConfigError;
use thiserror::Error;

/// Errors raised while assembling a stage
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Consumer already registered: {0}")]
    DuplicateConsumer(String),

    #[error("Invalid tick interval: {0:?}")]
    InvalidTickInterval(Duration),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while loading or replaying a recording
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Cannot read {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: {source}")]
    Json {
        line: usize,
        source: serde_json::Error,
    },

    #[error("Line {line}: timestamp {t_ms}ms is not a finite, non-negative number")]
    BadTimestamp { line: usize, t_ms: f64 },

    #[error("Line {line}: timestamp {t_ms}ms goes backwards (previous {previous_ms}ms)")]
    TimeWentBackwards {
        line: usize,
        t_ms: f64,
        previous_ms: f64,
    },

    #[error("Recording ends at {end:?}, which needs {ticks} ticks at {interval:?} (limit {limit})")]
    SpanTooLong {
        end: FrameTime,
        interval: Duration,
        ticks: u128,
        limit: u64,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
pub type ReplayResult<T> = Result<T, ReplayError>;
