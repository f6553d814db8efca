use std::collections::HashSet;

use crate::config::Config;
use crate::rubric::ScorePoints;

/// Validate configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    validate_rubric(config, &mut errors);
    validate_grading(config, &mut errors);

    // Courses
    if config.courses.is_empty() {
        errors.push("courses: at least one course is required".to_string());
    }
    for (i, course) in config.courses.iter().enumerate() {
        if course.trim().is_empty() {
            errors.push(format!("courses[{}]: must not be blank", i));
        }
    }

    // Feedback
    if let Some(ref feedback) = config.feedback {
        if let Some(t) = feedback.temperature {
            if !(0.0..=2.0).contains(&t) {
                errors.push(format!("feedback.temperature: {} is outside 0.0-2.0", t));
            }
        }
        if let Some(p) = feedback.top_p {
            if !(0.0..=1.0).contains(&p) {
                errors.push(format!("feedback.top_p: {} is outside 0.0-1.0", p));
            }
        }
        if let Some(ref timeout) = feedback.timeout {
            if let Err(e) = humantime::parse_duration(timeout) {
                errors.push(format!(
                    "feedback.timeout: invalid duration '{}' - {}",
                    timeout, e
                ));
            }
        }
        if let Some(ref model) = feedback.model {
            if model.trim().is_empty() {
                errors.push("feedback.model: must not be blank".to_string());
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_rubric(config: &Config, errors: &mut Vec<String>) {
    let Some(ref indicators) = config.rubric else {
        return;
    };

    if indicators.is_empty() {
        errors.push("rubric: at least one indicator is required".to_string());
        return;
    }

    let mut seen = HashSet::new();
    for (i, indicator) in indicators.iter().enumerate() {
        if indicator.id.trim().is_empty() {
            errors.push(format!("rubric[{}].id: must not be blank", i));
        } else if !seen.insert(indicator.id.as_str()) {
            errors.push(format!("rubric[{}].id: duplicate id '{}'", i, indicator.id));
        }

        let mut points: Vec<u8> = indicator.levels.iter().map(|l| l.points.value()).collect();
        points.sort_unstable();
        let expected: Vec<u8> = ScorePoints::all().map(ScorePoints::value).collect();
        if points != expected {
            errors.push(format!(
                "rubric[{}].levels: '{}' must define exactly one level for each of 1, 2, 3, 4",
                i, indicator.id
            ));
        }
    }
}

fn validate_grading(config: &Config, errors: &mut Vec<String>) {
    let Some(ref grading) = config.grading else {
        return;
    };

    if let Some(ratio) = grading.passing_ratio {
        if !(ratio > 0.0 && ratio <= 1.0) {
            errors.push(format!("grading.passing_ratio: {} is outside (0, 1]", ratio));
        }
    }

    let mut finite = true;
    for (field, value) in [
        ("min_grade", grading.min_grade),
        ("passing_grade", grading.passing_grade),
        ("max_grade", grading.max_grade),
        ("passing_threshold", grading.passing_threshold),
    ] {
        if let Some(v) = value {
            if !v.is_finite() {
                errors.push(format!("grading.{}: must be a finite number (got {})", field, v));
                finite = false;
            }
        }
    }
    if !finite {
        return;
    }

    let scale = config.grading_scale();

    if scale.min_grade > scale.passing_grade || scale.passing_grade > scale.max_grade {
        errors.push(format!(
            "grading: grades must satisfy min_grade <= passing_grade <= max_grade (got {} / {} / {})",
            scale.min_grade, scale.passing_grade, scale.max_grade
        ));
    }

    if grading.passing_threshold.is_some()
        && !(scale.min_total..=scale.max_total).contains(&scale.passing_threshold)
    {
        errors.push(format!(
            "grading.passing_threshold: {} is outside the attainable total range {}-{}",
            scale.passing_threshold, scale.min_total, scale.max_total
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::FeedbackConfig;
    use crate::rubric::{reference_rubric, ScoreLevel};
    use crate::scoring::GradingConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_explicit_reference_rubric_is_valid() {
        let config = Config {
            rubric: Some(reference_rubric().indicators().to_vec()),
            grading: Some(GradingConfig::default()),
            feedback: Some(FeedbackConfig::default()),
            ..Config::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_rubric() {
        let config = Config {
            rubric: Some(vec![]),
            ..Config::default()
        };
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].contains("rubric"));
    }

    #[test]
    fn test_duplicate_indicator_id() {
        let mut indicators = reference_rubric().indicators().to_vec();
        indicators[1].id = indicators[0].id.clone();
        let config = Config {
            rubric: Some(indicators),
            ..Config::default()
        };
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("rubric[1].id: duplicate"));
    }

    #[test]
    fn test_missing_level() {
        let mut indicators = reference_rubric().indicators().to_vec();
        indicators[2].levels.pop();
        let config = Config {
            rubric: Some(indicators),
            ..Config::default()
        };
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].contains("rubric[2].levels"));
    }

    #[test]
    fn test_repeated_level_points() {
        let mut indicators = reference_rubric().indicators().to_vec();
        let first: ScoreLevel = indicators[0].levels[0].clone();
        indicators[0].levels[3] = first;
        let config = Config {
            rubric: Some(indicators),
            ..Config::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_threshold_out_of_range() {
        let config = Config {
            grading: Some(GradingConfig {
                passing_threshold: Some(60.0),
                ..GradingConfig::default()
            }),
            ..Config::default()
        };
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].contains("grading.passing_threshold"));
    }

    #[test]
    fn test_unordered_grades() {
        let config = Config {
            grading: Some(GradingConfig {
                passing_grade: Some(8.0),
                ..GradingConfig::default()
            }),
            ..Config::default()
        };
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].contains("min_grade <= passing_grade <= max_grade"));
    }

    #[test]
    fn test_non_finite_grading_values() {
        for grading in [
            GradingConfig {
                min_grade: Some(f64::NAN),
                ..GradingConfig::default()
            },
            GradingConfig {
                passing_grade: Some(f64::NAN),
                ..GradingConfig::default()
            },
            GradingConfig {
                max_grade: Some(f64::INFINITY),
                ..GradingConfig::default()
            },
            GradingConfig {
                passing_threshold: Some(f64::NEG_INFINITY),
                ..GradingConfig::default()
            },
        ] {
            let config = Config {
                grading: Some(grading),
                ..Config::default()
            };
            let errors = validate_config(&config).unwrap_err();
            assert_eq!(errors.len(), 1);
            assert!(errors[0].contains("must be a finite number"));
        }
    }

    #[test]
    fn test_non_finite_values_from_yaml() {
        let config: Config = serde_saphyr::from_str("grading:\n  min_grade: .nan\n").unwrap();
        assert!(validate_config(&config).is_err());

        let config: Config = serde_saphyr::from_str("grading:\n  max_grade: .inf\n").unwrap();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_nan_passing_ratio() {
        let config = Config {
            grading: Some(GradingConfig {
                passing_ratio: Some(f64::NAN),
                ..GradingConfig::default()
            }),
            ..Config::default()
        };
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].contains("grading.passing_ratio"));
    }

    #[test]
    fn test_blank_course() {
        let config = Config {
            courses: vec!["3ºA".to_string(), "  ".to_string()],
            ..Config::default()
        };
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec!["courses[1]: must not be blank".to_string()]);
    }

    #[test]
    fn test_invalid_feedback_timeout() {
        let config = Config {
            feedback: Some(FeedbackConfig {
                timeout: Some("soon".to_string()),
                ..FeedbackConfig::default()
            }),
            ..Config::default()
        };
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].contains("feedback.timeout"));
    }

    #[test]
    fn test_collects_all_errors() {
        let config = Config {
            courses: vec![],                 // Error 1
            grading: Some(GradingConfig {
                passing_ratio: Some(1.5),    // Error 2
                ..GradingConfig::default()
            }),
            feedback: Some(FeedbackConfig {
                temperature: Some(3.0),      // Error 3
                ..FeedbackConfig::default()
            }),
            ..Config::default()
        };
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
