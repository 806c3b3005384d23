//! Wiggle patterns.
//!
//! A pattern expands into a `CursorDisplacement`: an ordered list of
//! relative steps plus the settling delay to wait after each one. Every
//! expansion sums to zero, so the pointer ends where it started.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settling delay after each step of a linear wiggle.
const LINEAR_STEP_DELAY: Duration = Duration::from_millis(50);

/// Settling delay after each step of a circular wiggle.
const CIRCULAR_STEP_DELAY: Duration = Duration::from_millis(25);

/// The named shape of a wiggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pattern {
    /// Right, then back left.
    #[default]
    Linear,
    /// A diamond: right, down, left, up.
    Circular,
}

impl Pattern {
    /// Expands the pattern for a step length of `distance` pixels.
    ///
    /// Distances beyond `i32::MAX` saturate.
    pub fn displacement(self, distance: u32) -> CursorDisplacement {
        let d = i32::try_from(distance).unwrap_or(i32::MAX);
        match self {
            Pattern::Linear => CursorDisplacement {
                steps: vec![(d, 0), (-d, 0)],
                step_delay: LINEAR_STEP_DELAY,
            },
            Pattern::Circular => CursorDisplacement {
                steps: vec![(d, 0), (0, d), (-d, 0), (0, -d)],
                step_delay: CIRCULAR_STEP_DELAY,
            },
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Pattern::Linear => "linear",
            Pattern::Circular => "circular",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown pattern {0:?} (expected \"linear\" or \"circular\")")]
pub struct UnknownPattern(String);

impl FromStr for Pattern {
    type Err = UnknownPattern;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" | "simple" => Ok(Pattern::Linear),
            "circular" | "circle" => Ok(Pattern::Circular),
            _ => Err(UnknownPattern(s.to_owned())),
        }
    }
}

/// Relative pointer steps for one wiggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorDisplacement {
    /// `(dx, dy)` pairs, applied in order.
    pub steps: Vec<(i32, i32)>,
    /// Wait after each step so the OS registers it as separate motion.
    pub step_delay: Duration,
}

impl CursorDisplacement {
    /// Net movement of the whole sequence.
    pub fn net(&self) -> (i64, i64) {
        self.steps.iter().fold((0, 0), |(x, y), &(dx, dy)| {
            (x + i64::from(dx), y + i64::from(dy))
        })
    }

    /// Wall time the sequence takes to play back.
    pub fn duration(&self) -> Duration {
        self.step_delay * self.steps.len() as u32
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
