//! Arbitrary feature vectors through both classifier policies.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use palmsense_core::GestureState;
use palmsense_gesture::{GestureClassifier, GestureConfig, HandFeatures};

#[derive(Arbitrary, Debug)]
struct Input {
    palm: f32,
    fingers: [f32; 4],
    thumb: f32,
    stable: u8,
}

fuzz_target!(|input: Input| {
    let features = HandFeatures::from_scores(input.palm, input.fingers, input.thumb);
    let stable = match input.stable % 4 {
        0 => GestureState::None,
        1 => GestureState::Open,
        2 => GestureState::Semi,
        _ => GestureState::Closed,
    };

    for config in [GestureConfig::default(), GestureConfig::ambient_sound()] {
        let c = GestureClassifier::from_config(&config).classify(&features, stable);
        assert!(c.state.is_hand());
        assert!((0.0..=1.0).contains(&c.intensity));
        assert!((0.0..=1.0).contains(&c.openness));
    }
});
