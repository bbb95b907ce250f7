//! Gesture states and the emotions they express

use std::fmt;

/// Discrete hand state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GestureState {
    /// No hand tracked
    #[default]
    None,
    Open,
    Semi,
    Closed,
}

impl GestureState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GestureState::None => "none",
            GestureState::Open => "open",
            GestureState::Semi => "semi",
            GestureState::Closed => "closed",
        }
    }

    /// Emotion the installation expresses for this state
    pub fn emotion(&self) -> Emotion {
        match self {
            GestureState::Open => Emotion::Joy,
            GestureState::Semi => Emotion::Sadness,
            GestureState::Closed => Emotion::Fear,
            GestureState::None => Emotion::Neutral,
        }
    }

    pub fn is_hand(&self) -> bool {
        !matches!(self, GestureState::None)
    }

    /// Parse the lowercase name used in recordings and logs
    pub fn parse(name: &str) -> Option<GestureState> {
        match name {
            "none" => Some(GestureState::None),
            "open" => Some(GestureState::Open),
            "semi" => Some(GestureState::Semi),
            "closed" => Some(GestureState::Closed),
            _ => None,
        }
    }
}

impl fmt::Display for GestureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emotional register driven by the stabilized state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emotion {
    Joy,
    Sadness,
    Fear,
    Neutral,
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Joy => "joy",
            Emotion::Sadness => "sadness",
            Emotion::Fear => "fear",
            Emotion::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
