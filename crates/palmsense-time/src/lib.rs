//! palmsense Time - Frame clocks
//!
//! The gesture pipeline is driven by an external frame clock (one evaluation
//! per rendered frame). This crate provides the two clocks hosts use:
//! - [`MonotonicClock`]: wall-clock driven, never jumps backwards
//! - [`ManualClock`]: advanced explicitly, for replay and tests

pub mod clock;

pub use clock::*;
