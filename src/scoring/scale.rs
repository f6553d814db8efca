use super::config::{
    GradingConfig, DEFAULT_MAX_GRADE, DEFAULT_MIN_GRADE, DEFAULT_PASSING_GRADE,
    DEFAULT_PASSING_RATIO,
};
use crate::rubric::ScorePoints;

/// Resolved grading scale for a rubric of a given size.
///
/// `min_total` and `max_total` follow from the indicator count (every
/// indicator scores between 1 and 4 points); the grade bounds and the
/// passing threshold come from [`GradingConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradingScale {
    pub min_total: f64,
    pub max_total: f64,
    pub passing_threshold: f64,
    pub min_grade: f64,
    pub passing_grade: f64,
    pub max_grade: f64,
}

impl GradingScale {
    pub fn for_rubric(indicator_count: usize, config: &GradingConfig) -> Self {
        let count = indicator_count as f64;
        let min_total = count * f64::from(ScorePoints::MIN);
        let max_total = count * f64::from(ScorePoints::MAX);
        let ratio = config.passing_ratio.unwrap_or(DEFAULT_PASSING_RATIO);

        Self {
            min_total,
            max_total,
            passing_threshold: config.passing_threshold.unwrap_or(ratio * max_total),
            min_grade: config.min_grade.unwrap_or(DEFAULT_MIN_GRADE),
            passing_grade: config.passing_grade.unwrap_or(DEFAULT_PASSING_GRADE),
            max_grade: config.max_grade.unwrap_or(DEFAULT_MAX_GRADE),
        }
    }

    /// Map a score onto the grade scale.
    ///
    /// Two linear segments meet at the passing threshold, which maps exactly
    /// to the passing grade. Scores outside `[min_total, max_total]` are
    /// extrapolated and then clamped. The result is rounded to one decimal.
    pub fn grade_for_score(&self, score: f64) -> f64 {
        if !self.has_usable_bounds() {
            return if self.min_grade.is_finite() {
                self.min_grade
            } else {
                DEFAULT_MIN_GRADE
            };
        }
        if !score.is_finite() {
            return self.min_grade;
        }

        let grade = if score >= self.passing_threshold {
            let span = self.max_total - self.passing_threshold;
            if span == 0.0 {
                if score == self.max_total {
                    self.max_grade
                } else {
                    self.passing_grade
                }
            } else {
                let progress = (score - self.passing_threshold) / span;
                self.passing_grade + progress * (self.max_grade - self.passing_grade)
            }
        } else {
            let span = self.passing_threshold - self.min_total;
            if span == 0.0 {
                // Unreachable while score < threshold, kept for degenerate scales
                if score == self.passing_threshold {
                    self.passing_grade
                } else {
                    self.min_grade
                }
            } else {
                let progress = (score - self.min_total) / span;
                self.min_grade + progress * (self.passing_grade - self.min_grade)
            }
        };

        // max/min rather than clamp: a NaN segment result collapses to min_grade
        round_one_decimal(grade.max(self.min_grade).min(self.max_grade))
    }

    /// Grade bounds are finite and ordered, so the mapping cannot leave them
    fn has_usable_bounds(&self) -> bool {
        self.min_grade.is_finite()
            && self.passing_grade.is_finite()
            && self.max_grade.is_finite()
            && self.min_grade <= self.max_grade
    }

    pub fn is_passing(&self, grade: f64) -> bool {
        grade >= self.passing_grade
    }
}

/// Round half away from zero at the first decimal
fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_scale() -> GradingScale {
        GradingScale::for_rubric(13, &GradingConfig::default())
    }

    fn scale_with_threshold(indicators: usize, threshold: f64) -> GradingScale {
        GradingScale::for_rubric(
            indicators,
            &GradingConfig {
                passing_threshold: Some(threshold),
                ..GradingConfig::default()
            },
        )
    }

    #[test]
    fn test_reference_scale_constants() {
        let scale = reference_scale();
        assert_eq!(scale.min_total, 13.0);
        assert_eq!(scale.max_total, 52.0);
        assert!((scale.passing_threshold - 31.2).abs() < 1e-9);
        assert_eq!(scale.min_grade, 2.0);
        assert_eq!(scale.passing_grade, 4.0);
        assert_eq!(scale.max_grade, 7.0);
    }

    #[test]
    fn test_endpoints_and_threshold() {
        let scale = reference_scale();
        assert_eq!(scale.grade_for_score(13.0), 2.0);
        assert_eq!(scale.grade_for_score(52.0), 7.0);
        assert_eq!(scale.grade_for_score(scale.passing_threshold), 4.0);
    }

    #[test]
    fn test_lower_segment_midpoint() {
        // (22 - 13) / (31.2 - 13) * 2.0 + 2.0 = 2.989 -> 3.0
        assert_eq!(reference_scale().grade_for_score(22.0), 3.0);
    }

    #[test]
    fn test_around_threshold() {
        let scale = reference_scale();
        // 31 sits just below the threshold: 2.0 + 18/18.2 * 2.0 = 3.978 -> 4.0
        assert_eq!(scale.grade_for_score(31.0), 4.0);
        // 32 is just above: 4.0 + 0.8/20.8 * 3.0 = 4.115 -> 4.1
        assert_eq!(scale.grade_for_score(32.0), 4.1);
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        let scale = reference_scale();
        assert_eq!(scale.grade_for_score(0.0), 2.0);
        assert_eq!(scale.grade_for_score(-40.0), 2.0);
        assert_eq!(scale.grade_for_score(80.0), 7.0);
    }

    #[test]
    fn test_non_finite_input_maps_to_min_grade() {
        let scale = reference_scale();
        assert_eq!(scale.grade_for_score(f64::NAN), 2.0);
        assert_eq!(scale.grade_for_score(f64::INFINITY), 2.0);
    }

    #[test]
    fn test_threshold_equal_to_max_total() {
        let scale = scale_with_threshold(13, 52.0);
        assert_eq!(scale.grade_for_score(52.0), 7.0);
        // Above the maximum the guard yields the passing grade rather than dividing by zero
        assert_eq!(scale.grade_for_score(60.0), 4.0);
        assert!(scale.grade_for_score(40.0) < 4.0);
    }

    #[test]
    fn test_threshold_equal_to_min_total() {
        let scale = scale_with_threshold(13, 13.0);
        assert_eq!(scale.grade_for_score(13.0), 4.0);
        assert_eq!(scale.grade_for_score(12.0), 2.0);
        assert_eq!(scale.grade_for_score(52.0), 7.0);
    }

    #[test]
    fn test_smaller_rubric() {
        // 5 indicators: totals 5..=20, threshold 12
        let scale = GradingScale::for_rubric(5, &GradingConfig::default());
        assert_eq!(scale.min_total, 5.0);
        assert_eq!(scale.max_total, 20.0);
        assert_eq!(scale.grade_for_score(5.0), 2.0);
        assert_eq!(scale.grade_for_score(20.0), 7.0);
        assert_eq!(scale.grade_for_score(12.0), 4.0);
    }

    #[test]
    fn test_non_finite_bounds_never_panic_or_yield_nan() {
        let nan_min = GradingScale::for_rubric(
            13,
            &GradingConfig {
                min_grade: Some(f64::NAN),
                ..GradingConfig::default()
            },
        );
        assert_eq!(nan_min.grade_for_score(30.0), DEFAULT_MIN_GRADE);

        let nan_passing = GradingScale::for_rubric(
            13,
            &GradingConfig {
                passing_grade: Some(f64::NAN),
                ..GradingConfig::default()
            },
        );
        assert_eq!(nan_passing.grade_for_score(30.0), 2.0);

        let inf_max = GradingScale::for_rubric(
            13,
            &GradingConfig {
                max_grade: Some(f64::INFINITY),
                ..GradingConfig::default()
            },
        );
        assert_eq!(inf_max.grade_for_score(52.0), 2.0);
    }

    #[test]
    fn test_nan_threshold_collapses_to_min_grade() {
        let scale = scale_with_threshold(13, f64::NAN);
        for total in 13..=52 {
            let grade = scale.grade_for_score(f64::from(total));
            assert!(grade.is_finite());
            assert!((2.0..=7.0).contains(&grade));
        }
    }

    #[test]
    fn test_inverted_bounds_do_not_panic() {
        let scale = GradingScale::for_rubric(
            13,
            &GradingConfig {
                min_grade: Some(7.0),
                max_grade: Some(2.0),
                ..GradingConfig::default()
            },
        );
        assert_eq!(scale.grade_for_score(40.0), 7.0);
    }

    #[test]
    fn test_is_passing() {
        let scale = reference_scale();
        assert!(scale.is_passing(4.0));
        assert!(!scale.is_passing(3.9));
    }
}
