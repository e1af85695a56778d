//! Score aggregation.
//!
//! `aggregate = Σ w_c · mean(sub-scores of c)` over the nine fixed categories.
//! A category that is absent (or empty) still spends its weight, at zero: partial
//! evidence is penalized rather than renormalized away. Every sub-score is clamped
//! into [0,1] before averaging and the result is clamped again.

use super::CategoryWeights;
use crate::candidate::{clamp01, SignalCategory, SignalScores, SubScores};

/// Mean of the clamped sub-scores; 0.0 when there are none.
pub fn category_score(scores: &SubScores) -> f32 {
    if scores.is_empty() {
        return 0.0;
    }
    let sum: f32 = scores.values().map(|v| clamp01(*v)).sum();
    sum / scores.len() as f32
}

pub fn aggregate(signals: &SignalScores, weights: &CategoryWeights) -> f32 {
    // Iterate the fixed category list, not the map, so the sum order never varies.
    let total: f32 = SignalCategory::ALL
        .iter()
        .map(|c| {
            let s = signals.get(c).map(category_score).unwrap_or(0.0);
            weights.weight(*c) * s
        })
        .sum();
    clamp01(total)
}
