//! Recording replay
//!
//! A recording is JSON lines, one detector result per line:
//!
//! ```text
//! {"t_ms": 0.0, "landmarks": [[0.51, 0.83, 0.0], ...]}
//! {"t_ms": 33.4, "landmarks": null}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. Timestamps must not
//! go backwards. Landmark arrays of the wrong length are kept as-is and
//! surface as malformed frames during replay.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;

use palmsense_core::{FrameTime, Point3};
use palmsense_gesture::{GesturePipeline, GestureSignal, LandmarkSlot};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{ReplayError, ReplayResult};

/// One recorded detector result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayRecord {
    /// Milliseconds since the start of the recording
    pub t_ms: f64,
    /// `None` when the detector saw no hand
    #[serde(default)]
    pub landmarks: Option<Vec<[f32; 3]>>,
}

impl ReplayRecord {
    pub fn at(&self) -> FrameTime {
        FrameTime::from_millis_f64(self.t_ms)
    }

    pub fn points(&self) -> Option<Vec<Point3>> {
        self.landmarks
            .as_ref()
            .map(|l| l.iter().map(|&[x, y, z]| Point3::new(x, y, z)).collect())
    }

    /// Record for a set of points (used when capturing)
    pub fn from_points(t_ms: f64, points: Option<&[Point3]>) -> Self {
        ReplayRecord {
            t_ms,
            landmarks: points.map(|p| p.iter().map(|p| [p.x, p.y, p.z]).collect()),
        }
    }
}

/// A loaded recording, timestamps non-decreasing
#[derive(Debug, Clone, Default)]
pub struct Recording {
    records: Vec<ReplayRecord>,
}

impl Recording {
    pub fn open(path: impl AsRef<Path>) -> ReplayResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ReplayError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let recording = Self::from_reader(BufReader::new(file))?;
        info!(path = %path.display(), records = recording.len(), "recording loaded");
        Ok(recording)
    }

    pub fn from_reader(reader: impl BufRead) -> ReplayResult<Self> {
        let mut records = Vec::new();
        let mut previous_ms: Option<f64> = None;

        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            let line = line?;
            let text = line.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }

            let record: ReplayRecord = serde_json::from_str(text).map_err(|source| ReplayError::Json {
                line: line_no,
                source,
            })?;

            if !record.t_ms.is_finite() || record.t_ms < 0.0 {
                return Err(ReplayError::BadTimestamp {
                    line: line_no,
                    t_ms: record.t_ms,
                });
            }
            if let Some(previous_ms) = previous_ms {
                if record.t_ms < previous_ms {
                    return Err(ReplayError::TimeWentBackwards {
                        line: line_no,
                        t_ms: record.t_ms,
                        previous_ms,
                    });
                }
            }
            previous_ms = Some(record.t_ms);
            records.push(record);
        }

        Ok(Recording { records })
    }

    pub fn from_records(records: Vec<ReplayRecord>) -> Self {
        Recording { records }
    }

    pub fn records(&self) -> &[ReplayRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Time of the last record
    pub fn duration(&self) -> FrameTime {
        self.records.last().map(|r| r.at()).unwrap_or(FrameTime::ZERO)
    }
}

/// Upper bound on fixed-rate ticks for one replay, about 46 hours at 60 fps
pub const MAX_REPLAY_TICKS: u64 = 10_000_000;

/// How ticks are scheduled during replay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayPacing {
    /// One tick per record, at the record's timestamp
    PerRecord,
    /// Fixed-rate ticks, each reading the latest record at or before it
    Fixed(Duration),
}

/// Totals of one replay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub ticks: u64,
    pub hands_seen: u64,
    pub malformed_frames: u64,
    pub transitions: u64,
    pub motion_bursts: u64,
}

/// Drive `pipeline` through `recording`, calling `sink` after every tick.
///
/// Fixed pacing fails up front with [`ReplayError::SpanTooLong`] when the
/// recording would need more than [`MAX_REPLAY_TICKS`] ticks.
pub fn replay<F>(
    recording: &Recording,
    pipeline: &mut GesturePipeline,
    pacing: ReplayPacing,
    mut sink: F,
) -> ReplayResult<ReplaySummary>
where
    F: FnMut(&GestureSignal),
{
    match pacing {
        ReplayPacing::PerRecord => {
            for record in recording.records() {
                let points = record.points();
                sink(pipeline.tick(points.as_deref(), record.at()));
            }
        }
        ReplayPacing::Fixed(interval) => {
            let end = recording.duration();
            let step = interval.as_micros();
            let ticks = if step == 0 {
                1
            } else {
                (end.as_micros().max(0) as u128 + step - 1) / step + 1
            };
            if ticks > MAX_REPLAY_TICKS as u128 {
                return Err(ReplayError::SpanTooLong {
                    end,
                    interval,
                    ticks,
                    limit: MAX_REPLAY_TICKS,
                });
            }

            let slot = LandmarkSlot::new();
            let mut pending = recording.records().iter().peekable();
            let mut now = FrameTime::ZERO;

            loop {
                // Deliver every detection that arrived by now
                while let Some(record) = pending.next_if(|r| r.at() <= now) {
                    match record.points() {
                        Some(points) => slot.publish(points, Some(record.at())),
                        None => slot.clear(),
                    };
                }
                sink(pipeline.tick_slot(&slot, now));

                if now >= end || step == 0 {
                    break;
                }
                now = now + interval;
            }
        }
    }

    let stats = pipeline.stats();
    let summary = ReplaySummary {
        ticks: stats.ticks,
        hands_seen: stats.hands_seen,
        malformed_frames: stats.malformed_frames,
        transitions: stats.transitions,
        motion_bursts: stats.motion_bursts,
    };
    debug!(?summary, "replay finished");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use palmsense_core::{FrameGeometry, GestureState, LANDMARK_COUNT};
    use proptest::prelude::*;

    fn hand_json(score: f32) -> String {
        let geometry = FrameGeometry::default();
        let (cx, cy, palm) = (320.0f32, 400.0f32, 100.0f32);
        let mut px = vec![Point3::planar(cx, cy); LANDMARK_COUNT];
        for f in 0..4 {
            let dx = (f as f32 - 1.0) * 20.0;
            let len = (dx * dx + palm * palm).sqrt();
            let along = |d: f32| Point3::planar(cx + dx / len * d, cy - palm / len * d);
            let mcp = 5 + f * 4;
            px[mcp] = along(len);
            px[mcp + 1] = along(len * 1.3);
            px[mcp + 2] = along(len * 1.3 + score * palm * 0.5);
            px[mcp + 3] = along(len * 1.3 + score * palm);
        }
        px[4] = Point3::planar(cx - 90.0, cy - 40.0);
        px[2] = Point3::planar(cx, cy - 40.0);

        let points: Vec<Point3> = px.iter().map(|p| geometry.to_normalized(p)).collect();
        serde_json::to_string(&ReplayRecord::from_points(0.0, Some(points.as_slice())).landmarks).unwrap()
    }

    fn recording(lines: &[String]) -> ReplayResult<Recording> {
        Recording::from_reader(lines.join("\n").as_bytes())
    }

    #[test]
    fn test_parse_lines() {
        let lines = vec![
            "# captured at 30 fps".to_string(),
            r#"{"t_ms": 0, "landmarks": [[0.1, 0.2, 0.0]]}"#.to_string(),
            String::new(),
            r#"{"t_ms": 33.3, "landmarks": null}"#.to_string(),
            r#"{"t_ms": 66.6}"#.to_string(),
        ];
        let rec = recording(&lines).unwrap();
        assert_eq!(rec.len(), 3);
        assert_eq!(rec.records()[0].points().unwrap(), vec![Point3::new(0.1, 0.2, 0.0)]);
        assert!(rec.records()[1].landmarks.is_none());
        assert!(rec.records()[2].landmarks.is_none());
        assert_eq!(rec.duration(), FrameTime::from_micros(66_600));
    }

    #[test]
    fn test_json_error_has_line() {
        let lines = vec![
            r#"{"t_ms": 0, "landmarks": null}"#.to_string(),
            r#"{"t_ms": "soon"}"#.to_string(),
        ];
        match recording(&lines) {
            Err(ReplayError::Json { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_backwards_time_rejected() {
        let lines = vec![
            r#"{"t_ms": 100, "landmarks": null}"#.to_string(),
            r#"{"t_ms": 50, "landmarks": null}"#.to_string(),
        ];
        assert!(matches!(
            recording(&lines),
            Err(ReplayError::TimeWentBackwards { line: 2, .. })
        ));

        let negative = vec![r#"{"t_ms": -1, "landmarks": null}"#.to_string()];
        assert!(matches!(
            recording(&negative),
            Err(ReplayError::BadTimestamp { line: 1, .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = Recording::open("/nonexistent/palmsense/recording.jsonl").unwrap_err();
        assert!(matches!(err, ReplayError::Open { .. }));
        assert!(err.to_string().contains("recording.jsonl"));
    }

    fn open_then_gone() -> Recording {
        let open = hand_json(0.10);
        let mut lines = Vec::new();
        for i in 0..20 {
            lines.push(format!(r#"{{"t_ms": {}, "landmarks": {}}}"#, i * 33, open));
        }
        for i in 20..40 {
            lines.push(format!(r#"{{"t_ms": {}, "landmarks": null}}"#, i * 33));
        }
        recording(&lines).unwrap()
    }

    #[test]
    fn test_replay_per_record() {
        let rec = open_then_gone();
        let mut pipeline = GesturePipeline::default();
        let mut states = Vec::new();

        let summary = replay(&rec, &mut pipeline, ReplayPacing::PerRecord, |s| states.push(s.state)).unwrap();

        assert_eq!(summary.ticks, 40);
        assert_eq!(summary.hands_seen, 20);
        assert_eq!(summary.transitions, 2);
        assert!(states.contains(&GestureState::Open));
        assert_eq!(states.last(), Some(&GestureState::None));
    }

    #[test]
    fn test_replay_fixed_rate() {
        let rec = open_then_gone();
        let mut pipeline = GesturePipeline::default();
        let mut lines = Vec::new();

        let summary = replay(
            &rec,
            &mut pipeline,
            ReplayPacing::Fixed(Duration::from_micros(16_667)),
            |s| lines.push(s.to_string()),
        )
        .unwrap();

        // 39 * 33ms of recording at ~60 ticks per second
        assert!(summary.ticks >= 77 && summary.ticks <= 79);
        assert_eq!(summary.transitions, 2);
        assert!(lines.iter().any(|l| l.starts_with("State: open | emotion: joy")));
    }

    #[test]
    fn test_wrong_arity_is_malformed() {
        let lines = vec![r#"{"t_ms": 0, "landmarks": [[0.5, 0.5, 0.0], [0.4, 0.4, 0.0]]}"#.to_string()];
        let rec = recording(&lines).unwrap();
        let mut pipeline = GesturePipeline::default();
        let summary = replay(&rec, &mut pipeline, ReplayPacing::PerRecord, |_| {}).unwrap();
        assert_eq!(summary.malformed_frames, 1);
        assert_eq!(summary.hands_seen, 0);
    }

    #[test]
    fn test_exact_hold_gap_does_not_transition() {
        let open = hand_json(0.10);
        for start in [0.0, 4.1, 33.3, 66.6, 123.7, 199.9] {
            let lines = vec![
                format!(r#"{{"t_ms": {start}, "landmarks": {open}}}"#),
                format!(r#"{{"t_ms": {}, "landmarks": {open}}}"#, start + 160.0),
            ];
            let rec = recording(&lines).unwrap();
            assert_eq!(rec.records()[1].at() - rec.records()[0].at(), Duration::from_millis(160));

            // Canonical hold is 160 ms, publishing needs strictly more
            let mut pipeline = GesturePipeline::default();
            let summary = replay(&rec, &mut pipeline, ReplayPacing::PerRecord, |_| {}).unwrap();
            assert_eq!(summary.transitions, 0, "start {start}");

            let later = ReplayRecord {
                t_ms: start + 160.1,
                landmarks: rec.records()[1].landmarks.clone(),
            };
            let mut records = rec.records().to_vec();
            records.push(later);
            let mut pipeline = GesturePipeline::default();
            let summary = replay(&Recording::from_records(records), &mut pipeline, ReplayPacing::PerRecord, |_| {}).unwrap();
            assert_eq!(summary.transitions, 1, "start {start}");
        }
    }

    #[test]
    fn test_fixed_rate_span_is_capped() {
        let lines = vec![r#"{"t_ms": 1e12, "landmarks": null}"#.to_string()];
        let rec = recording(&lines).unwrap();
        let mut pipeline = GesturePipeline::default();
        let mut calls = 0u64;

        let result = replay(&rec, &mut pipeline, ReplayPacing::Fixed(Duration::from_millis(16)), |_| calls += 1);

        match result {
            Err(ReplayError::SpanTooLong { ticks, limit, .. }) => {
                assert!(ticks > limit as u128);
                assert_eq!(limit, MAX_REPLAY_TICKS);
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(calls, 0);
        assert_eq!(pipeline.stats().ticks, 0);

        // Per-record pacing is one tick per line whatever the span
        let summary = replay(&rec, &mut pipeline, ReplayPacing::PerRecord, |_| {}).unwrap();
        assert_eq!(summary.ticks, 1);
    }

    #[test]
    fn test_sub_microsecond_tick_runs_once() {
        let lines = vec![
            r#"{"t_ms": 0, "landmarks": null}"#.to_string(),
            r#"{"t_ms": 50, "landmarks": null}"#.to_string(),
        ];
        let rec = recording(&lines).unwrap();
        let mut pipeline = GesturePipeline::default();
        let summary = replay(&rec, &mut pipeline, ReplayPacing::Fixed(Duration::from_nanos(500)), |_| {}).unwrap();
        assert_eq!(summary.ticks, 1);
    }

    proptest! {
        #[test]
        fn fixed_pacing_covers_recording(
            gaps in prop::collection::vec(0u32..200, 1..40),
            tick_ms in 1u64..50,
        ) {
            let mut t_ms = 0.0;
            let records = gaps
                .iter()
                .map(|&gap| {
                    t_ms += gap as f64;
                    ReplayRecord { t_ms, landmarks: None }
                })
                .collect();
            let rec = Recording::from_records(records);
            let mut pipeline = GesturePipeline::default();

            let summary = replay(&rec, &mut pipeline, ReplayPacing::Fixed(Duration::from_millis(tick_ms)), |_| {}).unwrap();

            // Ticks at 0, tick, 2*tick, ... up to the first one at or past the end
            let end = rec.duration().as_micros();
            let tick = tick_ms as i64 * 1000;
            let expected = (end + tick - 1) / tick + 1;
            prop_assert_eq!(summary.ticks, expected as u64);
            prop_assert_eq!(summary.hands_seen, 0);
        }
    }
}
