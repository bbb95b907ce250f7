//! Synthetic hands
//!
//! Builds 21-point landmark sets with exact, known feature values. Each
//! finger's tip and PIP sit on the same ray from the wrist, so a finger's
//! extension score is exactly `(tip reach - pip reach) / palm size`.

use palmsense_core::{FrameGeometry, LandmarkResult, LandmarkSet, Point3, LANDMARK_COUNT};
use rand::rngs::StdRng;
use rand::Rng;

/// Named hand poses
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Pose {
    /// All fingers extended, thumb out
    Open,
    /// All fingers curled, thumb tucked
    Fist,
    /// Halfway: openness 0.5
    Half,
    /// Index and middle extended, ring and pinky folded
    Peace,
    /// Explicit finger scores and thumb openness
    Custom { fingers: [f32; 4], thumb: f32 },
}

impl Pose {
    pub fn finger_scores(&self) -> [f32; 4] {
        match self {
            Pose::Open => [0.10; 4],
            Pose::Fist => [-0.05; 4],
            Pose::Half => [0.06; 4],
            Pose::Peace => [0.10, 0.10, -0.04, -0.04],
            Pose::Custom { fingers, .. } => *fingers,
        }
    }

    pub fn thumb(&self) -> f32 {
        match self {
            Pose::Open => 0.9,
            Pose::Fist => 0.3,
            Pose::Half => 0.6,
            Pose::Peace => 0.3,
            Pose::Custom { thumb, .. } => *thumb,
        }
    }
}

/// Finger directions, radians from "up", index to pinky
const FINGER_SPREAD: [f32; 4] = [-0.30, 0.0, 0.22, 0.42];
/// PIP distance from the wrist, in palm sizes
const PIP_REACH: f32 = 1.35;

/// Builder for one synthetic hand
#[derive(Clone, Debug)]
pub struct SyntheticHand {
    geometry: FrameGeometry,
    /// Wrist position in pixels
    wrist: (f32, f32),
    /// Wrist to middle MCP, pixels
    palm: f32,
    /// Whole-hand rotation, radians
    rotation: f32,
    fingers: [f32; 4],
    thumb: f32,
}

impl SyntheticHand {
    pub fn new(pose: Pose) -> Self {
        let geometry = FrameGeometry::default();
        SyntheticHand {
            wrist: (geometry.width * 0.5, geometry.height * 0.8),
            geometry,
            palm: 100.0,
            rotation: 0.0,
            fingers: pose.finger_scores(),
            thumb: pose.thumb(),
        }
    }

    pub fn with_geometry(mut self, geometry: FrameGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Move the wrist, in pixels
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.wrist = (x, y);
        self
    }

    /// Palm size in pixels (hand distance from camera)
    pub fn palm(mut self, px: f32) -> Self {
        self.palm = px;
        self
    }

    pub fn rotated(mut self, radians: f32) -> Self {
        self.rotation = radians;
        self
    }

    pub fn pose(mut self, pose: Pose) -> Self {
        self.fingers = pose.finger_scores();
        self.thumb = pose.thumb();
        self
    }

    pub fn wrist(&self) -> (f32, f32) {
        self.wrist
    }

    pub fn geometry(&self) -> &FrameGeometry {
        &self.geometry
    }

    /// Landmarks in pixel space
    pub fn pixels(&self) -> [Point3; LANDMARK_COUNT] {
        let (wx, wy) = self.wrist;
        let palm = self.palm;
        let ray = |angle: f32, d: f32| {
            let a = angle + self.rotation;
            Point3::planar(wx + a.sin() * d, wy - a.cos() * d)
        };

        let mut px = [Point3::planar(wx, wy); LANDMARK_COUNT];

        for (f, &angle) in FINGER_SPREAD.iter().enumerate() {
            let mcp = 5 + f * 4;
            let score = self.fingers[f];
            px[mcp] = ray(angle, palm);
            px[mcp + 1] = ray(angle, palm * PIP_REACH);
            px[mcp + 2] = ray(angle, palm * (PIP_REACH + score * 0.5));
            px[mcp + 3] = ray(angle, palm * (PIP_REACH + score));
        }

        // Thumb: CMC and MCP fixed, IP and tip extend away from the palm
        let thumb_angle = -1.0;
        px[1] = ray(thumb_angle, palm * 0.35);
        px[2] = ray(thumb_angle, palm * 0.65);
        let (mx, my) = (px[2].x, px[2].y);
        let out = thumb_angle - 0.5 + self.rotation;
        let reach = self.thumb * palm;
        px[3] = Point3::planar(mx + out.sin() * reach * 0.5, my - out.cos() * reach * 0.5);
        px[4] = Point3::planar(mx + out.sin() * reach, my - out.cos() * reach);

        px
    }

    /// Landmarks normalized to the frame, as a detector delivers them
    pub fn points(&self) -> Vec<Point3> {
        self.pixels()
            .iter()
            .map(|p| self.geometry.to_normalized(p))
            .collect()
    }

    pub fn landmark_set(&self) -> LandmarkResult<LandmarkSet> {
        LandmarkSet::from_points(&self.points())
    }

    /// Random pose, position, size and rotation
    pub fn random(rng: &mut StdRng) -> Self {
        let geometry = FrameGeometry::default();
        let pose = Pose::Custom {
            fingers: [
                rng.gen_range(-0.08..0.14),
                rng.gen_range(-0.08..0.14),
                rng.gen_range(-0.08..0.14),
                rng.gen_range(-0.08..0.14),
            ],
            thumb: rng.gen_range(0.1..1.2),
        };
        SyntheticHand::new(pose)
            .at(
                rng.gen_range(0.2..0.8) * geometry.width,
                rng.gen_range(0.5..0.95) * geometry.height,
            )
            .palm(rng.gen_range(30.0..160.0))
            .rotated(rng.gen_range(-0.6..0.6))
    }
}

impl From<Pose> for SyntheticHand {
    fn from(pose: Pose) -> Self {
        SyntheticHand::new(pose)
    }
}
