//! palmsense Runtime - Stage loop, logging and replay
//!
//! Each stage tick:
//! 1. Advance the frame clock
//! 2. Take one snapshot of the landmark slot
//! 3. Validate it once
//! 4. Evaluate every consumer pipeline against the same set
//! 5. Publish each consumer's signal to the board
//!
//! Recordings can be replayed through a single pipeline without a stage,
//! either one tick per record or at a fixed tick rate.

pub mod error;
pub mod logging;
pub mod replay;
pub mod stage;

pub use error::*;
pub use logging::{LogFormat, LoggingConfig};
pub use replay::*;
pub use stage::*;
