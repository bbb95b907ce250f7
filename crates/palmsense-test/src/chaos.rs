//! Landmark chaos
//!
//! Simulates a hostile detector:
//! - Per-point jitter
//! - Dropout, single and in bursts
//! - Malformed frames (truncated, padded, non-finite)

use palmsense_core::{FrameGeometry, Point3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// How a malformed frame is broken
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Corruption {
    /// Fewer than 21 points
    Truncated,
    /// More than 21 points
    Padded,
    /// One coordinate is NaN or infinite
    NonFinite,
}

/// Detector chaos configuration
#[derive(Clone, Debug)]
pub struct LandmarkChaosConfig {
    /// Gaussian jitter, standard deviation in pixels
    pub jitter_px: f32,
    /// Single-frame dropout probability
    pub dropout_prob: f64,
    /// Probability that a dropout burst starts
    pub burst_prob: f64,
    /// Burst length range, in frames
    pub burst_length: (u32, u32),
    /// Probability a frame arrives malformed
    pub malformed_prob: f64,
}

impl Default for LandmarkChaosConfig {
    fn default() -> Self {
        LandmarkChaosConfig {
            jitter_px: 1.5,
            dropout_prob: 0.02,
            burst_prob: 0.01,
            burst_length: (2, 6),
            malformed_prob: 0.0,
        }
    }
}

impl LandmarkChaosConfig {
    /// No chaos at all
    pub fn clean() -> Self {
        LandmarkChaosConfig {
            jitter_px: 0.0,
            dropout_prob: 0.0,
            burst_prob: 0.0,
            burst_length: (0, 0),
            malformed_prob: 0.0,
        }
    }

    /// Low light, motion blur, partial occlusion
    pub fn hostile() -> Self {
        LandmarkChaosConfig {
            jitter_px: 4.0,
            dropout_prob: 0.1,
            burst_prob: 0.05,
            burst_length: (3, 10),
            malformed_prob: 0.02,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct LandmarkChaosStats {
    pub frames: u64,
    pub dropped: u64,
    pub malformed: u64,
    pub delivered: u64,
}

impl LandmarkChaosStats {
    pub fn drop_rate(&self) -> f64 {
        if self.frames == 0 {
            0.0
        } else {
            self.dropped as f64 / self.frames as f64
        }
    }
}

/// Seeded detector chaos
pub struct LandmarkChaos {
    config: LandmarkChaosConfig,
    geometry: FrameGeometry,
    rng: StdRng,
    burst_remaining: u32,
    stats: LandmarkChaosStats,
}

impl LandmarkChaos {
    pub fn new(config: LandmarkChaosConfig, geometry: FrameGeometry, seed: u64) -> Self {
        LandmarkChaos {
            config,
            geometry,
            rng: StdRng::seed_from_u64(seed),
            burst_remaining: 0,
            stats: LandmarkChaosStats::default(),
        }
    }

    /// Pass one detector frame through the chaos
    pub fn apply(&mut self, frame: Option<Vec<Point3>>) -> Option<Vec<Point3>> {
        self.stats.frames += 1;
        let points = frame?;

        if self.should_drop() {
            self.stats.dropped += 1;
            return None;
        }

        if self.rng.gen::<f64>() < self.config.malformed_prob {
            self.stats.malformed += 1;
            let kind = match self.rng.gen_range(0..3) {
                0 => Corruption::Truncated,
                1 => Corruption::Padded,
                _ => Corruption::NonFinite,
            };
            return Some(self.corrupt(points, kind));
        }

        self.stats.delivered += 1;
        Some(self.jitter(points))
    }

    /// Break a frame on purpose
    pub fn corrupt(&mut self, mut points: Vec<Point3>, kind: Corruption) -> Vec<Point3> {
        match kind {
            Corruption::Truncated => {
                let keep = self.rng.gen_range(0..points.len().max(1));
                points.truncate(keep);
            }
            Corruption::Padded => {
                let extra = self.rng.gen_range(1..4);
                points.extend(std::iter::repeat(Point3::planar(0.5, 0.5)).take(extra));
            }
            Corruption::NonFinite => {
                if points.is_empty() {
                    points.push(Point3::default());
                }
                let i = self.rng.gen_range(0..points.len());
                let bad = if self.rng.gen::<bool>() {
                    f32::NAN
                } else {
                    f32::INFINITY
                };
                if self.rng.gen::<bool>() {
                    points[i].x = bad;
                } else {
                    points[i].y = bad;
                }
            }
        }
        points
    }

    fn jitter(&mut self, points: Vec<Point3>) -> Vec<Point3> {
        if self.config.jitter_px <= 0.0 {
            return points;
        }
        let sigma = self.config.jitter_px;
        points
            .into_iter()
            .map(|p| {
                let dx = self.gaussian() * sigma / self.geometry.width;
                let dy = self.gaussian() * sigma / self.geometry.height;
                Point3::new(p.x + dx, p.y + dy, p.z)
            })
            .collect()
    }

    /// Standard normal sample (Box-Muller)
    fn gaussian(&mut self) -> f32 {
        let u1: f64 = self.rng.gen_range(f64::EPSILON..1.0);
        let u2: f64 = self.rng.gen();
        ((-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()) as f32
    }

    fn should_drop(&mut self) -> bool {
        if self.burst_remaining > 0 {
            self.burst_remaining -= 1;
            return true;
        }

        if self.rng.gen::<f64>() < self.config.burst_prob {
            let (min, max) = self.config.burst_length;
            self.burst_remaining = self.rng.gen_range(min..=max).saturating_sub(1);
            return true;
        }

        self.rng.gen::<f64>() < self.config.dropout_prob
    }

    pub fn stats(&self) -> &LandmarkChaosStats {
        &self.stats
    }
}
