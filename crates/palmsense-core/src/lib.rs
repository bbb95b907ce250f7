//! palmsense Core - Fundamental types and primitives
//!
//! This crate defines the types shared by every stage of the gesture pipeline:
//! - Landmarks (Point3, LandmarkSet, HandLandmark, FrameGeometry)
//! - Gesture states and the emotions they drive
//! - Frame time
//! - Error types

pub mod error;
pub mod landmark;
pub mod state;
pub mod time;

pub use error::*;
pub use landmark::*;
pub use state::*;
pub use time::*;
