//! Arbitrary detector output through a full pipeline.
//!
//! Frames may have any arity and any float, including NaN and infinities.
//! The published signal must always stay in range.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use palmsense_core::{FrameTime, GestureState, Point3};
use palmsense_gesture::{GestureConfig, GesturePipeline};

#[derive(Arbitrary, Debug)]
enum Profile {
    Canonical,
    AmbientSound,
    SpatialField,
}

#[derive(Arbitrary, Debug)]
struct Tick {
    /// Microseconds since the previous tick
    dt: u16,
    frame: Option<Vec<(f32, f32, f32)>>,
}

#[derive(Arbitrary, Debug)]
struct Input {
    profile: Profile,
    ticks: Vec<Tick>,
}

fuzz_target!(|input: Input| {
    let config = match input.profile {
        Profile::Canonical => GestureConfig::default(),
        Profile::AmbientSound => GestureConfig::ambient_sound(),
        Profile::SpatialField => GestureConfig::spatial_field(),
    };
    let Ok(mut pipeline) = GesturePipeline::new(config) else {
        return;
    };

    let mut now = FrameTime::ZERO;
    for tick in input.ticks.iter().take(512) {
        now = FrameTime::from_micros(now.as_micros() + i64::from(tick.dt));
        let points: Option<Vec<Point3>> = tick
            .frame
            .as_ref()
            .map(|f| f.iter().map(|&(x, y, z)| Point3::new(x, y, z)).collect());

        let signal = *pipeline.tick(points.as_deref(), now);

        assert!((0.0..=1.0).contains(&signal.motion));
        assert!((0.0..=1.0).contains(&signal.intensity));
        if signal.state == GestureState::None {
            assert_eq!(signal.intensity, 0.0);
        }
    }
});
