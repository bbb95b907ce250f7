//! Latest-detection handoff
//!
//! The detector callback and the render tick run on different schedules.
//! They meet in a [`LandmarkSlot`]: the producer swaps in a whole new
//! detection, the consumer takes one `Arc` snapshot per tick. Nobody ever
//! reads a detection while it is being written.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use palmsense_core::{FrameTime, Point3};

/// One detector result, unvalidated
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Increments on every publish or clear
    pub sequence: u64,
    /// When the analysed camera frame was captured, if the producer knows
    pub captured_at: Option<FrameTime>,
    /// Raw points as delivered by the detector
    pub points: Vec<Point3>,
}

#[derive(Debug, Default)]
struct SlotInner {
    latest: Mutex<Option<Arc<Detection>>>,
    sequence: AtomicU64,
}

/// Single-slot, cloneable handoff between producer and tick loop
#[derive(Debug, Clone, Default)]
pub struct LandmarkSlot {
    inner: Arc<SlotInner>,
}

impl LandmarkSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the latest detection. Returns its sequence number.
    pub fn publish(&self, points: Vec<Point3>, captured_at: Option<FrameTime>) -> u64 {
        let sequence = self.next_sequence();
        let detection = Arc::new(Detection {
            sequence,
            captured_at,
            points,
        });
        *self.inner.latest.lock() = Some(detection);
        sequence
    }

    /// Record that the detector saw no hand. Returns the sequence number.
    pub fn clear(&self) -> u64 {
        let sequence = self.next_sequence();
        *self.inner.latest.lock() = None;
        sequence
    }

    /// Snapshot of the latest detection
    pub fn latest(&self) -> Option<Arc<Detection>> {
        self.inner.latest.lock().clone()
    }

    /// Sequence number of the last publish or clear
    pub fn sequence(&self) -> u64 {
        self.inner.sequence.load(Ordering::Acquire)
    }

    fn next_sequence(&self) -> u64 {
        self.inner.sequence.fetch_add(1, Ordering::AcqRel) + 1
    }
}
