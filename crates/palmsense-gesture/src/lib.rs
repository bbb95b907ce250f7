//! palmsense Gesture State
//!
//! Hand pose as STATE, not as a stream of detections.
//!
//! # Pipeline
//!
//! Once per animation tick, against a single landmark snapshot:
//!
//! 1. Feature extraction: palm-normalized finger extension scores
//! 2. Motion estimation: smoothed knuckle displacement, independent of openness
//! 3. Classification: open / semi / closed plus an intensity
//! 4. Stabilization: minimum-hold debouncing with a transition edge
//! 5. Publication: one read-only [`GestureSignal`] per tick
//!
//! Detection dropout and malformed frames are absorbed as the `none` state.
//! Nothing in this crate returns an error once a pipeline is built.

pub mod classifier;
pub mod config;
pub mod error;
pub mod features;
pub mod motion;
pub mod pipeline;
pub mod signal;
pub mod slot;
pub mod stabilizer;
pub mod trigger;

pub use classifier::*;
pub use config::*;
pub use error::*;
pub use features::*;
pub use motion::*;
pub use pipeline::*;
pub use signal::*;
pub use slot::*;
pub use stabilizer::*;
pub use trigger::*;
