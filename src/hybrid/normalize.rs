//! Per-family score normalization into `[0, 1]`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreNormalization {
    /// Clamp to `[0, 1]`. For scores with a fixed theoretical bound.
    #[default]
    Bounded,
    /// Divide by the family maximum; the weakest real match stays above zero.
    MaxScaled,
    /// `(s - min) / (max - min)`; all ones when every score is equal and positive.
    MinMax,
}

impl ScoreNormalization {
    /// Normalize `scores` in place.
    pub fn apply(&self, scores: &mut [f32]) {
        if scores.is_empty() {
            return;
        }
        for s in scores.iter_mut() {
            if !s.is_finite() {
                *s = 0.0;
            }
        }
        match self {
            ScoreNormalization::Bounded => {
                for s in scores.iter_mut() {
                    *s = s.clamp(0.0, 1.0);
                }
            }
            ScoreNormalization::MaxScaled => {
                let max = scores.iter().copied().fold(f32::MIN, f32::max);
                for s in scores.iter_mut() {
                    *s = if max > 0.0 { (*s / max).clamp(0.0, 1.0) } else { 0.0 };
                }
            }
            ScoreNormalization::MinMax => {
                let max = scores.iter().copied().fold(f32::MIN, f32::max);
                let min = scores.iter().copied().fold(f32::MAX, f32::min);
                let range = max - min;
                for s in scores.iter_mut() {
                    *s = if range > 0.0 {
                        (*s - min) / range
                    } else if max > 0.0 {
                        1.0
                    } else {
                        0.0
                    };
                }
            }
        }
    }
}
