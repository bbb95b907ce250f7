//! palmsense Test Harness - Synthetic hands and pipeline validation
//!
//! This crate provides:
//! - Synthetic hands with exact feature values
//! - Detector chaos (jitter, dropout, malformed frames)
//! - A scenario runner with a fixed tick
//! - End-to-end scenarios over pipelines and stages

pub mod chaos;
pub mod integration;
pub mod scenario;
pub mod synthetic;

pub use chaos::*;
pub use scenario::*;
pub use synthetic::*;
