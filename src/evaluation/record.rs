use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::rubric::ScoreSet;
use crate::scoring::GradeResult;

/// A source consulted by the feedback generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceAttribution {
    pub uri: String,
    #[serde(default)]
    pub title: String,
}

/// Sources and search queries reported alongside generated feedback.
/// Carried unchanged for display and export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub web_search_queries: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributions: Vec<SourceAttribution>,
}

impl GroundingMetadata {
    pub fn is_empty(&self) -> bool {
        self.web_search_queries.is_empty() && self.attributions.is_empty()
    }
}

/// A completed evaluation.
///
/// Built only through [`RecordBuilder`](super::RecordBuilder), which
/// guarantees every rubric indicator is scored and a grade is attached.
/// Fields are read through accessors; the record never changes after
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    id: String,
    student_name: String,
    course: String,
    evaluation_date: NaiveDate,
    scores: ScoreSet,
    grade: GradeResult,
    feedback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    grounding: Option<GroundingMetadata>,
}

impl EvaluationRecord {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: String,
        student_name: String,
        course: String,
        evaluation_date: NaiveDate,
        scores: ScoreSet,
        grade: GradeResult,
        feedback: String,
        grounding: Option<GroundingMetadata>,
    ) -> Self {
        Self {
            id,
            student_name,
            course,
            evaluation_date,
            scores,
            grade,
            feedback,
            grounding,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn student_name(&self) -> &str {
        &self.student_name
    }

    pub fn course(&self) -> &str {
        &self.course
    }

    pub fn evaluation_date(&self) -> NaiveDate {
        self.evaluation_date
    }

    pub fn scores(&self) -> &ScoreSet {
        &self.scores
    }

    pub fn grade(&self) -> GradeResult {
        self.grade
    }

    pub fn total_score(&self) -> u32 {
        self.grade.total_score
    }

    pub fn final_grade(&self) -> f64 {
        self.grade.final_grade
    }

    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    pub fn grounding(&self) -> Option<&GroundingMetadata> {
        self.grounding.as_ref()
    }
}
