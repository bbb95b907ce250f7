//! Hand landmarks - the detector's output as validated, immutable state
//!
//! The detector is a black box. It hands us 21 points per tracked hand in
//! normalized image coordinates. Nothing downstream ever sees a point set
//! that has not passed [`LandmarkSet::from_points`].

use crate::{LandmarkError, LandmarkResult};

/// Points per hand in the standard hand topology
pub const LANDMARK_COUNT: usize = 21;

/// Landmark identifier in the standard 21-point hand topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLandmark {
    Wrist = 0,

    ThumbCmc = 1,
    ThumbMcp = 2,
    ThumbIp = 3,
    ThumbTip = 4,

    IndexMcp = 5,
    IndexPip = 6,
    IndexDip = 7,
    IndexTip = 8,

    MiddleMcp = 9,
    MiddlePip = 10,
    MiddleDip = 11,
    MiddleTip = 12,

    RingMcp = 13,
    RingPip = 14,
    RingDip = 15,
    RingTip = 16,

    PinkyMcp = 17,
    PinkyPip = 18,
    PinkyDip = 19,
    PinkyTip = 20,
}

impl HandLandmark {
    /// Position of this landmark inside a [`LandmarkSet`]
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Wrist plus the four finger knuckles.
    /// These barely move when the hand opens or closes.
    pub fn knuckles() -> [HandLandmark; 5] {
        [
            HandLandmark::Wrist,
            HandLandmark::IndexMcp,
            HandLandmark::MiddleMcp,
            HandLandmark::RingMcp,
            HandLandmark::PinkyMcp,
        ]
    }

    /// (tip, pip) pairs for index, middle, ring and pinky
    pub fn finger_joints() -> [(HandLandmark, HandLandmark); 4] {
        [
            (HandLandmark::IndexTip, HandLandmark::IndexPip),
            (HandLandmark::MiddleTip, HandLandmark::MiddlePip),
            (HandLandmark::RingTip, HandLandmark::RingPip),
            (HandLandmark::PinkyTip, HandLandmark::PinkyPip),
        ]
    }
}

/// Landmark position. x and y are normalized to the camera frame, z is
/// relative depth and stays 0 when the detector does not provide it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn planar(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Distance in the image plane, ignoring depth
    pub fn planar_distance(&self, other: &Point3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Pixel size of the frame the detector analysed.
///
/// Landmark distances are measured in pixels so that the `max(1, palm)`
/// guard means "one pixel", not "the whole frame".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameGeometry {
    pub width: f32,
    pub height: f32,
}

impl FrameGeometry {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Scale a normalized point into pixel space
    #[inline]
    pub fn to_pixels(&self, p: &Point3) -> Point3 {
        Point3::new(p.x * self.width, p.y * self.height, p.z)
    }

    /// Scale a pixel-space point back to normalized coordinates
    #[inline]
    pub fn to_normalized(&self, p: &Point3) -> Point3 {
        let w = if self.width > 0.0 { self.width } else { 1.0 };
        let h = if self.height > 0.0 { self.height } else { 1.0 };
        Point3::new(p.x / w, p.y / h, p.z)
    }
}

impl Default for FrameGeometry {
    fn default() -> Self {
        Self::new(640.0, 480.0)
    }
}

/// A validated set of exactly 21 hand landmarks
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: [Point3; LANDMARK_COUNT],
}

impl LandmarkSet {
    /// Validate a raw detection.
    ///
    /// Rejects anything that is not exactly 21 points and any point with a
    /// NaN or infinite coordinate.
    pub fn from_points(points: &[Point3]) -> LandmarkResult<Self> {
        if points.len() != LANDMARK_COUNT {
            return Err(LandmarkError::wrong_arity(points.len()));
        }
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(LandmarkError::NonFinite { index });
        }

        let mut fixed = [Point3::default(); LANDMARK_COUNT];
        fixed.copy_from_slice(points);
        Ok(Self { points: fixed })
    }

    #[inline]
    pub fn get(&self, landmark: HandLandmark) -> &Point3 {
        &self.points[landmark.index()]
    }

    pub fn points(&self) -> &[Point3; LANDMARK_COUNT] {
        &self.points
    }

    /// The whole set in pixel coordinates
    pub fn to_pixels(&self, geometry: &FrameGeometry) -> [Point3; LANDMARK_COUNT] {
        self.points.map(|p| geometry.to_pixels(&p))
    }
}

impl TryFrom<&[Point3]> for LandmarkSet {
    type Error = LandmarkError;

    fn try_from(points: &[Point3]) -> LandmarkResult<Self> {
        Self::from_points(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Vec<Point3> {
        (0..LANDMARK_COUNT)
            .map(|i| Point3::planar(i as f32 / 40.0, 0.5))
            .collect()
    }

    #[test]
    fn test_accepts_21_points() {
        let set = LandmarkSet::from_points(&grid()).unwrap();
        assert_eq!(set.points().len(), LANDMARK_COUNT);
        assert_eq!(set.get(HandLandmark::PinkyTip).x, 20.0 / 40.0);
    }

    #[test]
    fn test_rejects_wrong_arity() {
        let mut points = grid();
        points.pop();

        assert_eq!(
            LandmarkSet::from_points(&points),
            Err(LandmarkError::WrongArity {
                expected: 21,
                actual: 20
            })
        );
        assert!(LandmarkSet::from_points(&[]).is_err());
    }

    #[test]
    fn test_rejects_non_finite() {
        let mut points = grid();
        points[7].y = f32::NAN;

        assert_eq!(
            LandmarkSet::try_from(points.as_slice()),
            Err(LandmarkError::NonFinite { index: 7 })
        );
    }

    #[test]
    fn test_pixel_roundtrip_and_distance() {
        let geometry = FrameGeometry::new(640.0, 480.0);
        let p = geometry.to_pixels(&Point3::planar(0.5, 0.25));
        assert_eq!((p.x, p.y), (320.0, 120.0));

        let back = geometry.to_normalized(&p);
        assert!((back.x - 0.5).abs() < 1e-6);

        let a = Point3::new(0.0, 0.0, 5.0);
        let b = Point3::new(3.0, 4.0, -5.0);
        assert!((a.planar_distance(&b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_topology_indices() {
        assert_eq!(HandLandmark::Wrist.index(), 0);
        assert_eq!(HandLandmark::MiddleMcp.index(), 9);
        let knuckles: Vec<usize> = HandLandmark::knuckles().iter().map(|l| l.index()).collect();
        assert_eq!(knuckles, vec![0, 5, 9, 13, 17]);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn point() -> impl Strategy<Value = Point3> {
            (-2.0f32..2.0, -2.0f32..2.0, -1.0f32..1.0).prop_map(|(x, y, z)| Point3::new(x, y, z))
        }

        proptest! {
            #[test]
            fn only_exact_arity_validates(points in prop::collection::vec(point(), 0..40)) {
                let result = LandmarkSet::from_points(&points);
                prop_assert_eq!(result.is_ok(), points.len() == LANDMARK_COUNT);
            }
        }
    }
}
