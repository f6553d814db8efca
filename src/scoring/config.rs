use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_GRADE: f64 = 2.0;
pub const DEFAULT_PASSING_GRADE: f64 = 4.0;
pub const DEFAULT_MAX_GRADE: f64 = 7.0;
pub const DEFAULT_PASSING_RATIO: f64 = 0.6;

/// Grading scale configuration.
///
/// Defines how a raw total score maps onto the institutional grade scale.
/// The passing threshold is the total score that yields exactly the passing
/// grade. When `passing_threshold` is unset it is derived from
/// `passing_ratio` times the maximum attainable total.
///
/// Example YAML:
/// ```yaml
/// grading:
///   min_grade: 2.0
///   passing_grade: 4.0
///   max_grade: 7.0
///   passing_ratio: 0.6    # 31.2 points out of 52
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GradingConfig {
    /// Grade awarded for the lowest possible total (default: 2.0)
    #[serde(default)]
    pub min_grade: Option<f64>,

    /// Grade awarded exactly at the passing threshold (default: 4.0)
    #[serde(default)]
    pub passing_grade: Option<f64>,

    /// Grade awarded for the highest possible total (default: 7.0)
    #[serde(default)]
    pub max_grade: Option<f64>,

    /// Total score mapping to the passing grade. Overrides `passing_ratio`.
    #[serde(default)]
    pub passing_threshold: Option<f64>,

    /// Fraction of the maximum total that maps to the passing grade (default: 0.6)
    #[serde(default)]
    pub passing_ratio: Option<f64>,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            min_grade: Some(DEFAULT_MIN_GRADE),
            passing_grade: Some(DEFAULT_PASSING_GRADE),
            max_grade: Some(DEFAULT_MAX_GRADE),
            passing_threshold: None,
            passing_ratio: Some(DEFAULT_PASSING_RATIO),
        }
    }
}
