use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::feedback::FeedbackConfig;
use crate::rubric::{reference_rubric, Rubric, RubricIndicator, REFERENCE_COURSES};
use crate::scoring::{GradingConfig, GradingScale};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Institution name printed on reports and passed to the feedback prompt
    #[serde(default)]
    pub institution: Option<String>,

    /// Course/section labels an evaluation may be filed under
    #[serde(default = "default_courses")]
    pub courses: Vec<String>,

    /// Rubric indicators. The built-in 13-indicator rubric is used when unset.
    #[serde(default)]
    pub rubric: Option<Vec<RubricIndicator>>,

    #[serde(default)]
    pub grading: Option<GradingConfig>,

    #[serde(default)]
    pub feedback: Option<FeedbackConfig>,

    #[serde(default)]
    pub store: Option<StoreConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Path of the evaluations JSON file (defaults to ~/.config/rubric-grader/evaluations.json)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_courses() -> Vec<String> {
    REFERENCE_COURSES.iter().map(|c| c.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            institution: None,
            courses: default_courses(),
            rubric: None,
            grading: None,
            feedback: None,
            store: None,
        }
    }
}

impl Config {
    /// The active rubric (configured or built-in)
    pub fn rubric(&self) -> Rubric {
        self.rubric
            .clone()
            .map(Rubric::new)
            .unwrap_or_else(reference_rubric)
    }

    pub fn grading(&self) -> GradingConfig {
        self.grading.clone().unwrap_or_default()
    }

    /// Grading scale sized for the active rubric
    pub fn grading_scale(&self) -> GradingScale {
        GradingScale::for_rubric(self.rubric().len(), &self.grading())
    }

    pub fn feedback(&self) -> FeedbackConfig {
        self.feedback.clone().unwrap_or_default()
    }

    pub fn store_path(&self) -> PathBuf {
        self.store
            .as_ref()
            .and_then(|s| s.path.clone())
            .unwrap_or_else(crate::store::get_store_path)
    }
}
