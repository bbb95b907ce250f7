//! Stage - the tick loop
//!
//! A stage owns one [`LandmarkSlot`] fed by the detector, a frame clock and
//! any number of named consumer pipelines (visuals, audio, text). Every
//! tick takes exactly one snapshot of the slot, validates it once and feeds
//! the same landmark set to every consumer.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use palmsense_core::{FrameTime, LandmarkSet};
use palmsense_gesture::{GestureConfig, GesturePipeline, GestureSignal, LandmarkSlot};
use palmsense_time::{FrameClock, MonotonicClock};
use parking_lot::RwLock;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::{RuntimeError, RuntimeResult};

/// Stage configuration
#[derive(Clone, Debug)]
pub struct StageConfig {
    /// Tick interval when driven by [`Stage::run_until`]
    pub tick_interval: Duration,
    /// Largest clock advance per tick (suspend, debugger pauses)
    pub max_clock_step: Duration,
}

impl Default for StageConfig {
    fn default() -> Self {
        StageConfig {
            tick_interval: Duration::from_micros(16_667),
            max_clock_step: MonotonicClock::DEFAULT_MAX_STEP,
        }
    }
}

impl StageConfig {
    /// 30 fps, for hosts that render at half rate
    pub fn half_rate() -> Self {
        StageConfig {
            tick_interval: Duration::from_micros(33_333),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> RuntimeResult<()> {
        if self.tick_interval.is_zero() {
            return Err(RuntimeError::InvalidTickInterval(self.tick_interval));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct StageStats {
    pub ticks: u64,
    /// Ticks with a valid landmark set
    pub frames_seen: u64,
    /// Ticks whose snapshot was the same detection as the previous tick
    pub repeated_frames: u64,
    pub malformed_frames: u64,
    /// State changes summed over all consumers
    pub transitions: u64,
    pub motion_bursts: u64,
    pub last_tick_duration: Duration,
}

/// Latest signal per consumer, readable from other threads
#[derive(Clone, Debug, Default)]
pub struct SignalBoard {
    inner: Arc<RwLock<HashMap<String, GestureSignal>>>,
}

impl SignalBoard {
    pub fn get(&self, consumer: &str) -> Option<GestureSignal> {
        self.inner.read().get(consumer).copied()
    }

    /// Copy of every consumer's signal
    pub fn snapshot(&self) -> Vec<(String, GestureSignal)> {
        let mut all: Vec<_> = self
            .inner
            .read()
            .iter()
            .map(|(name, signal)| (name.clone(), *signal))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    fn insert(&self, consumer: &str) {
        self.inner
            .write()
            .insert(consumer.to_string(), GestureSignal::idle());
    }

    fn remove(&self, consumer: &str) {
        self.inner.write().remove(consumer);
    }

    fn publish(&self, consumers: &[Consumer]) {
        let mut board = self.inner.write();
        for consumer in consumers {
            if let Some(slot) = board.get_mut(&consumer.name) {
                *slot = *consumer.pipeline.signal();
            }
        }
    }
}

#[derive(Debug)]
struct Consumer {
    name: String,
    pipeline: GesturePipeline,
}

/// Tick loop over one landmark source and several consumers
pub struct Stage<C: FrameClock = MonotonicClock> {
    config: StageConfig,
    clock: C,
    slot: LandmarkSlot,
    consumers: Vec<Consumer>,
    board: SignalBoard,
    /// Sequence of the last detection evaluated
    last_sequence: Option<u64>,
    stats: StageStats,
}

impl Stage<MonotonicClock> {
    /// Stage driven by the wall clock
    pub fn new(config: StageConfig) -> RuntimeResult<Self> {
        let clock = MonotonicClock::with_max_step(config.max_clock_step);
        Self::with_clock(config, clock)
    }
}

impl<C: FrameClock> Stage<C> {
    pub fn with_clock(config: StageConfig, clock: C) -> RuntimeResult<Self> {
        config.validate()?;
        Ok(Stage {
            config,
            clock,
            slot: LandmarkSlot::new(),
            consumers: Vec::new(),
            board: SignalBoard::default(),
            last_sequence: None,
            stats: StageStats::default(),
        })
    }

    /// Register a consumer with its own gesture configuration
    pub fn add_consumer(&mut self, name: impl Into<String>, config: GestureConfig) -> RuntimeResult<()> {
        let name = name.into();
        if self.consumers.iter().any(|c| c.name == name) {
            return Err(RuntimeError::DuplicateConsumer(name));
        }

        let pipeline = GesturePipeline::new(config)?;
        debug!(consumer = %name, profile = pipeline.config().name, "consumer added");
        self.board.insert(&name);
        self.consumers.push(Consumer { name, pipeline });
        Ok(())
    }

    pub fn remove_consumer(&mut self, name: &str) -> bool {
        let before = self.consumers.len();
        self.consumers.retain(|c| c.name != name);
        self.board.remove(name);
        self.consumers.len() != before
    }

    /// Producer handle for the detector callback
    pub fn slot(&self) -> LandmarkSlot {
        self.slot.clone()
    }

    /// Reader handle for other threads
    pub fn board(&self) -> SignalBoard {
        self.board.clone()
    }

    /// Run one tick. Returns the frame time it was evaluated at.
    pub fn tick(&mut self) -> FrameTime {
        let start = Instant::now();
        self.stats.ticks += 1;

        // Advance clock
        let now = self.clock.tick();

        // Sample the slot once
        let snapshot = self.slot.latest();

        // Validate once for all consumers
        let set = match snapshot.as_deref() {
            None => None,
            Some(detection) => {
                if self.last_sequence == Some(detection.sequence) {
                    self.stats.repeated_frames += 1;
                }
                self.last_sequence = Some(detection.sequence);

                match LandmarkSet::from_points(&detection.points) {
                    Ok(set) => {
                        self.stats.frames_seen += 1;
                        Some(set)
                    }
                    Err(error) => {
                        self.stats.malformed_frames += 1;
                        warn!(sequence = detection.sequence, %error, "discarding landmark frame");
                        None
                    }
                }
            }
        };

        // Evaluate every consumer against the same set
        for consumer in &mut self.consumers {
            let signal = *consumer.pipeline.evaluate(set.as_ref(), now);
            if signal.transition {
                self.stats.transitions += 1;
                debug!(consumer = %consumer.name, state = %signal.state, "consumer state changed");
            }
            if signal.motion_burst {
                self.stats.motion_bursts += 1;
            }
        }

        // Publish
        self.board.publish(&self.consumers);

        self.stats.last_tick_duration = start.elapsed();
        now
    }

    /// Tick on a fixed interval until `shutdown` resolves.
    /// Returns the number of ticks run.
    pub async fn run_until<F, T>(&mut self, shutdown: F, mut on_tick: T) -> u64
    where
        F: Future<Output = ()>,
        T: FnMut(FrameTime, &Self),
    {
        let mut interval = tokio::time::interval(self.config.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(
            consumers = self.consumers.len(),
            interval = ?self.config.tick_interval,
            "stage running"
        );

        let mut ticks = 0;
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = interval.tick() => {
                    let now = self.tick();
                    ticks += 1;
                    on_tick(now, self);
                }
            }
        }

        info!(ticks, "stage stopped");
        ticks
    }

    pub fn signal(&self, consumer: &str) -> Option<&GestureSignal> {
        self.pipeline(consumer).map(|p| p.signal())
    }

    pub fn pipeline(&self, consumer: &str) -> Option<&GesturePipeline> {
        self.consumers
            .iter()
            .find(|c| c.name == consumer)
            .map(|c| &c.pipeline)
    }

    /// Consumer names in registration order
    pub fn consumers(&self) -> impl Iterator<Item = &str> {
        self.consumers.iter().map(|c| c.name.as_str())
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn stats(&self) -> &StageStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palmsense_core::{FrameGeometry, GestureState, Point3, LANDMARK_COUNT};
    use palmsense_time::ManualClock;

    /// Upright hand, palm 100px, every finger at the same extension score
    fn hand(score: f32, thumb: f32) -> Vec<Point3> {
        let geometry = FrameGeometry::default();
        let (cx, cy, palm) = (320.0f32, 400.0f32, 100.0f32);
        let mut px = vec![Point3::planar(cx, cy); LANDMARK_COUNT];

        for (f, angle) in [-0.3f32, 0.0, 0.2, 0.4].into_iter().enumerate() {
            let mcp = 5 + f * 4;
            let along = |d: f32| Point3::planar(cx + angle.sin() * d, cy - angle.cos() * d);
            px[mcp] = along(palm);
            px[mcp + 1] = along(palm * 1.3);
            px[mcp + 2] = along(palm * (1.3 + score * 0.5));
            px[mcp + 3] = along(palm * (1.3 + score));
        }
        px[2] = Point3::planar(cx - 50.0, cy - 40.0);
        px[3] = Point3::planar(cx - 50.0 - thumb * 50.0, cy - 40.0);
        px[4] = Point3::planar(cx - 50.0 - thumb * palm, cy - 40.0);

        px.iter().map(|p| geometry.to_normalized(p)).collect()
    }

    fn stage() -> Stage<ManualClock> {
        let mut stage = Stage::with_clock(StageConfig::default(), ManualClock::sixty_hz()).unwrap();
        stage.add_consumer("visuals", GestureConfig::default()).unwrap();
        stage.add_consumer("audio", GestureConfig::ambient_sound()).unwrap();
        stage
    }

    #[test]
    fn test_consumers_share_snapshot() {
        let mut stage = stage();
        stage.slot().publish(hand(0.10, 0.9), None);

        for _ in 0..20 {
            stage.tick();
        }

        assert_eq!(stage.signal("visuals").unwrap().state, GestureState::Open);
        assert_eq!(stage.signal("audio").unwrap().state, GestureState::Open);
        assert_eq!(stage.stats().frames_seen, 20);
        assert_eq!(stage.stats().repeated_frames, 19);
        assert_eq!(stage.stats().transitions, 2);
    }

    #[test]
    fn test_fist_maps_to_closed_for_all() {
        let mut stage = stage();
        stage.slot().publish(hand(-0.05, 0.3), None);
        for _ in 0..20 {
            stage.tick();
        }
        for name in ["visuals", "audio"] {
            let signal = stage.signal(name).unwrap();
            assert_eq!(signal.state, GestureState::Closed);
            assert!(signal.intensity > 0.99);
        }
    }

    #[test]
    fn test_duplicate_consumer_rejected() {
        let mut stage = stage();
        let err = stage.add_consumer("audio", GestureConfig::default()).unwrap_err();
        assert!(matches!(err, RuntimeError::DuplicateConsumer(name) if name == "audio"));
        assert_eq!(stage.consumers().count(), 2);
    }

    #[test]
    fn test_invalid_consumer_config_rejected() {
        let mut stage = stage();
        let config = GestureConfig::default().with_hold(Duration::ZERO);
        assert!(matches!(
            stage.add_consumer("text", config),
            Err(RuntimeError::Config(_))
        ));
    }

    #[test]
    fn test_zero_tick_interval_rejected() {
        let config = StageConfig {
            tick_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(Stage::new(config).is_err());
    }

    #[test]
    fn test_malformed_frame_counted_once() {
        let mut stage = stage();
        stage.slot().publish(hand(0.10, 0.9)[..12].to_vec(), None);
        stage.tick();

        assert_eq!(stage.stats().malformed_frames, 1);
        assert_eq!(stage.stats().frames_seen, 0);
        assert_eq!(stage.signal("visuals").unwrap().state, GestureState::None);
    }

    #[test]
    fn test_hand_loss_reaches_board() {
        let mut stage = stage();
        let board = stage.board();
        let slot = stage.slot();

        slot.publish(hand(0.10, 0.9), None);
        for _ in 0..20 {
            stage.tick();
        }
        assert_eq!(board.get("visuals").unwrap().state, GestureState::Open);

        slot.clear();
        stage.tick();
        // Dropout is debounced like any other change
        assert_eq!(board.get("visuals").unwrap().state, GestureState::Open);

        for _ in 0..20 {
            stage.tick();
        }
        let signal = board.get("visuals").unwrap();
        assert_eq!(signal.state, GestureState::None);
        assert_eq!(signal.intensity, 0.0);
    }

    #[test]
    fn test_remove_consumer() {
        let mut stage = stage();
        assert!(stage.remove_consumer("audio"));
        assert!(!stage.remove_consumer("audio"));
        assert!(stage.board().get("audio").is_none());
        assert_eq!(stage.board().snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_run_until_shutdown() {
        let config = StageConfig {
            tick_interval: Duration::from_millis(2),
            ..Default::default()
        };
        let mut stage = Stage::new(config).unwrap();
        stage.add_consumer("visuals", GestureConfig::default()).unwrap();
        stage.slot().publish(hand(0.10, 0.9), None);

        let mut seen = 0;
        let ticks = stage
            .run_until(tokio::time::sleep(Duration::from_millis(40)), |_, _| seen += 1)
            .await;

        assert!(ticks > 0);
        assert_eq!(ticks, seen);
        assert_eq!(stage.stats().ticks, ticks);
    }
}
