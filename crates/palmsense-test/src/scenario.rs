//! Scenario runner
//!
//! Scripts a sequence of detector conditions, runs it through a pipeline at
//! a fixed tick and records every published signal.

use std::time::Duration;

use palmsense_core::{FrameTime, GestureState, Point3};
use palmsense_gesture::{ConfigError, GestureConfig, GesturePipeline, GestureSignal};
use thiserror::Error;

use crate::{LandmarkChaos, SyntheticHand};

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Tick interval must be positive")]
    ZeroTick,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// One scripted segment
#[derive(Clone, Debug)]
pub enum Step {
    /// Hand held still
    Hold { hand: SyntheticHand, duration: Duration },
    /// Detector reports no hand
    Dropout { duration: Duration },
    /// Detector delivers a frame with too few points
    Malformed { duration: Duration },
    /// Two hands swapped every `period`
    Alternate {
        a: SyntheticHand,
        b: SyntheticHand,
        period: Duration,
        duration: Duration,
    },
    /// Wrist moves linearly to `to` (pixels)
    Sweep {
        hand: SyntheticHand,
        to: (f32, f32),
        duration: Duration,
    },
    /// Exact frame, once
    Frame(Option<Vec<Point3>>),
}

impl Step {
    fn duration(&self) -> Option<Duration> {
        match self {
            Step::Hold { duration, .. }
            | Step::Dropout { duration }
            | Step::Malformed { duration }
            | Step::Alternate { duration, .. }
            | Step::Sweep { duration, .. } => Some(*duration),
            Step::Frame(_) => None,
        }
    }

    /// Detector frame at `elapsed` into this step
    fn frame(&self, elapsed: Duration) -> Option<Vec<Point3>> {
        match self {
            Step::Hold { hand, .. } => Some(hand.points()),
            Step::Dropout { .. } => None,
            Step::Malformed { .. } => Some(vec![Point3::planar(0.5, 0.5); 20]),
            Step::Alternate { a, b, period, .. } => {
                let phase = elapsed.as_micros() / period.as_micros().max(1);
                let hand = if phase % 2 == 0 { a } else { b };
                Some(hand.points())
            }
            Step::Sweep { hand, to, duration } => {
                let t = if duration.is_zero() {
                    1.0
                } else {
                    (elapsed.as_secs_f32() / duration.as_secs_f32()).min(1.0)
                };
                let (x0, y0) = hand.wrist();
                let moved = hand
                    .clone()
                    .at(x0 + (to.0 - x0) * t, y0 + (to.1 - y0) * t);
                Some(moved.points())
            }
            Step::Frame(frame) => frame.clone(),
        }
    }
}

/// A scripted run
#[derive(Clone, Debug, Default)]
pub struct Scenario {
    steps: Vec<Step>,
}

impl Scenario {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hold(mut self, hand: impl Into<SyntheticHand>, duration: Duration) -> Self {
        self.steps.push(Step::Hold {
            hand: hand.into(),
            duration,
        });
        self
    }

    pub fn dropout(mut self, duration: Duration) -> Self {
        self.steps.push(Step::Dropout { duration });
        self
    }

    pub fn malformed(mut self, duration: Duration) -> Self {
        self.steps.push(Step::Malformed { duration });
        self
    }

    pub fn alternate(
        mut self,
        a: impl Into<SyntheticHand>,
        b: impl Into<SyntheticHand>,
        period: Duration,
        duration: Duration,
    ) -> Self {
        self.steps.push(Step::Alternate {
            a: a.into(),
            b: b.into(),
            period,
            duration,
        });
        self
    }

    pub fn sweep(mut self, hand: impl Into<SyntheticHand>, to: (f32, f32), duration: Duration) -> Self {
        self.steps.push(Step::Sweep {
            hand: hand.into(),
            to,
            duration,
        });
        self
    }

    /// A single exact frame, evaluated on one tick
    pub fn frame(mut self, frame: Option<Vec<Point3>>) -> Self {
        self.steps.push(Step::Frame(frame));
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

/// One evaluated tick
#[derive(Clone, Debug)]
pub struct TraceEntry {
    /// Index of the step that produced the frame
    pub step: usize,
    /// Raw classification before stabilization
    pub raw: GestureState,
    pub signal: GestureSignal,
}

/// Everything a scenario published
#[derive(Clone, Debug, Default)]
pub struct ScenarioTrace {
    pub entries: Vec<TraceEntry>,
}

impl ScenarioTrace {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&GestureSignal> {
        self.entries.last().map(|e| &e.signal)
    }

    pub fn final_state(&self) -> GestureState {
        self.last().map(|s| s.state).unwrap_or_default()
    }

    /// Published states at every transition, in order
    pub fn transitions(&self) -> Vec<GestureState> {
        self.entries
            .iter()
            .filter(|e| e.signal.transition)
            .map(|e| e.signal.state)
            .collect()
    }

    /// Time of the first transition into `state`
    pub fn first_transition_to(&self, state: GestureState) -> Option<FrameTime> {
        self.entries
            .iter()
            .find(|e| e.signal.transition && e.signal.state == state)
            .map(|e| e.signal.at)
    }

    /// Entries produced by one step
    pub fn step(&self, index: usize) -> impl Iterator<Item = &TraceEntry> {
        self.entries.iter().filter(move |e| e.step == index)
    }

    pub fn max_motion(&self) -> f32 {
        self.entries
            .iter()
            .map(|e| e.signal.motion)
            .fold(0.0, f32::max)
    }

    pub fn bursts(&self) -> usize {
        self.entries.iter().filter(|e| e.signal.motion_burst).count()
    }

    /// Raw state changes between consecutive ticks
    pub fn raw_flips(&self) -> usize {
        self.entries
            .windows(2)
            .filter(|w| w[0].raw != w[1].raw)
            .count()
    }
}

/// Runs scenarios through one pipeline at a fixed tick
pub struct ScenarioRunner {
    pipeline: GesturePipeline,
    tick: Duration,
    chaos: Option<LandmarkChaos>,
    now: FrameTime,
}

impl ScenarioRunner {
    pub fn new(config: GestureConfig, tick: Duration) -> Result<Self, HarnessError> {
        if tick.is_zero() {
            return Err(HarnessError::ZeroTick);
        }
        Ok(ScenarioRunner {
            pipeline: GesturePipeline::new(config)?,
            tick,
            chaos: None,
            now: FrameTime::ZERO,
        })
    }

    /// Canonical configuration at ~60 fps
    pub fn canonical() -> Result<Self, HarnessError> {
        Self::new(GestureConfig::default(), Duration::from_micros(16_667))
    }

    pub fn with_chaos(mut self, chaos: LandmarkChaos) -> Self {
        self.chaos = Some(chaos);
        self
    }

    /// Run every step. Time continues across calls.
    pub fn run(&mut self, scenario: &Scenario) -> ScenarioTrace {
        let mut trace = ScenarioTrace::default();

        for (index, step) in scenario.steps().iter().enumerate() {
            match step.duration() {
                None => self.evaluate(index, step.frame(Duration::ZERO), &mut trace),
                Some(duration) => {
                    let mut elapsed = Duration::ZERO;
                    while elapsed < duration {
                        self.evaluate(index, step.frame(elapsed), &mut trace);
                        elapsed += self.tick;
                    }
                }
            }
        }

        trace
    }

    fn evaluate(&mut self, step: usize, frame: Option<Vec<Point3>>, trace: &mut ScenarioTrace) {
        let frame = match self.chaos.as_mut() {
            Some(chaos) => chaos.apply(frame),
            None => frame,
        };

        let signal = *self.pipeline.tick(frame.as_deref(), self.now);
        trace.entries.push(TraceEntry {
            step,
            raw: self.pipeline.raw_state(),
            signal,
        });
        self.now = self.now + self.tick;
    }

    pub fn pipeline(&self) -> &GesturePipeline {
        &self.pipeline
    }

    pub fn now(&self) -> FrameTime {
        self.now
    }

    pub fn chaos(&self) -> Option<&LandmarkChaos> {
        self.chaos.as_ref()
    }
}
