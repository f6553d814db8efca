use serde::{Deserialize, Serialize};

use super::scale::GradingScale;
use crate::rubric::ScoreSet;

/// Total score and final grade derived from a [`ScoreSet`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeResult {
    pub total_score: u32,
    pub final_grade: f64,
}

/// Sum of all awarded points. Unscored indicators contribute nothing.
pub fn compute_total_score(scores: &ScoreSet) -> u32 {
    scores
        .iter()
        .map(|(_, points)| u32::from(points.value()))
        .sum()
}

/// True iff exactly `expected_count` indicators have a defined score.
pub fn all_indicators_scored(scores: &ScoreSet, expected_count: usize) -> bool {
    scores.scored_count() == expected_count
}

/// Maps score sets to grades on a fixed scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringEngine {
    scale: GradingScale,
}

impl ScoringEngine {
    pub fn new(scale: GradingScale) -> Self {
        Self { scale }
    }

    pub fn scale(&self) -> &GradingScale {
        &self.scale
    }

    /// Final grade for a raw total. Never fails: totals outside the
    /// attainable range are extrapolated and clamped.
    pub fn compute_final_grade(&self, total_score: u32) -> f64 {
        self.scale.grade_for_score(f64::from(total_score))
    }

    pub fn grade(&self, scores: &ScoreSet) -> GradeResult {
        let total_score = compute_total_score(scores);
        GradeResult {
            total_score,
            final_grade: self.compute_final_grade(total_score),
        }
    }

    pub fn is_passing(&self, result: &GradeResult) -> bool {
        self.scale.is_passing(result.final_grade)
    }
}
