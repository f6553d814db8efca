use chrono::{Local, NaiveDate};
use uuid::Uuid;

use super::error::ValidationError;
use super::record::{EvaluationRecord, GroundingMetadata};
use crate::config::Config;
use crate::rubric::{Rubric, ScoreSet};
use crate::scoring::{all_indicators_scored, GradeResult, GradingScale, ScoringEngine};

/// How strict [`RecordBuilder::build`] is about grade and feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Scores complete; a missing grade is computed, feedback may be empty
    Draft,
    /// Ready to persist or export: grade and feedback are required
    Final,
}

/// Inputs collected for one evaluation before it becomes a record
#[derive(Debug, Clone, Default)]
pub struct RecordDraft {
    pub id: Option<String>,
    pub student_name: String,
    pub course: String,
    pub evaluation_date: Option<NaiveDate>,
    pub scores: ScoreSet,
    pub grade: Option<GradeResult>,
    pub feedback: Option<String>,
    pub grounding: Option<GroundingMetadata>,
}

/// Validates drafts against the active rubric and course list and turns
/// them into immutable [`EvaluationRecord`]s. Performs no I/O.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    indicator_ids: Vec<String>,
    courses: Vec<String>,
    engine: ScoringEngine,
}

impl RecordBuilder {
    pub fn new(rubric: &Rubric, courses: &[String], scale: GradingScale) -> Self {
        Self {
            indicator_ids: rubric.ids().map(str::to_string).collect(),
            courses: courses.iter().map(|c| c.trim().to_string()).collect(),
            engine: ScoringEngine::new(scale),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.rubric(), &config.courses, config.grading_scale())
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    pub fn courses(&self) -> &[String] {
        &self.courses
    }

    /// Check name, course and scoring completeness, in that order.
    pub fn validate(
        &self,
        student_name: &str,
        course: &str,
        scores: &ScoreSet,
    ) -> Result<(), ValidationError> {
        if student_name.trim().is_empty() {
            return Err(ValidationError::MissingStudentName);
        }

        let course = course.trim();
        if course.is_empty() || !self.courses.iter().any(|c| c == course) {
            return Err(ValidationError::MissingCourse);
        }

        let complete = all_indicators_scored(scores, self.indicator_ids.len())
            && self.indicator_ids.iter().all(|id| scores.contains(id));
        if !complete {
            return Err(ValidationError::IncompleteScoring);
        }

        Ok(())
    }

    pub fn build(
        &self,
        draft: RecordDraft,
        mode: BuildMode,
    ) -> Result<EvaluationRecord, ValidationError> {
        self.validate(&draft.student_name, &draft.course, &draft.scores)?;

        let feedback = draft.feedback.unwrap_or_default();
        let grade = match (mode, draft.grade) {
            (_, Some(grade)) => grade,
            (BuildMode::Final, None) => return Err(ValidationError::GradeNotComputed),
            (BuildMode::Draft, None) => self.engine.grade(&draft.scores),
        };
        if mode == BuildMode::Final && feedback.trim().is_empty() {
            return Err(ValidationError::FeedbackNotGenerated);
        }

        let id = draft.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let evaluation_date = draft
            .evaluation_date
            .unwrap_or_else(|| Local::now().date_naive());
        let grounding = draft.grounding.filter(|g| !g.is_empty());

        Ok(EvaluationRecord::new(
            id,
            draft.student_name.trim().to_string(),
            draft.course.trim().to_string(),
            evaluation_date,
            draft.scores,
            grade,
            feedback,
            grounding,
        ))
    }
}
