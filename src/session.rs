use std::fmt;

use anyhow::Result;

use crate::evaluation::{
    BuildMode, EvaluationRecord, GroundingMetadata, RecordBuilder, RecordDraft, ValidationError,
};
use crate::feedback::{Feedback, FeedbackError, FeedbackGenerator};
use crate::rubric::{Rubric, ScorePoints, ScoreSet};
use crate::scoring::GradeResult;
use crate::store::EvaluationStore;

/// Failure while producing feedback for a session
#[derive(Debug)]
pub enum SessionError {
    Validation(ValidationError),
    Feedback(FeedbackError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Validation(err) => write!(f, "{}", err),
            SessionError::Feedback(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<ValidationError> for SessionError {
    fn from(err: ValidationError) -> Self {
        SessionError::Validation(err)
    }
}

impl From<FeedbackError> for SessionError {
    fn from(err: FeedbackError) -> Self {
        SessionError::Feedback(err)
    }
}

/// An evaluation in progress. Becomes an [`EvaluationRecord`] on
/// [`finalize`](Self::finalize).
#[derive(Debug, Clone)]
pub struct EvaluationSession {
    builder: RecordBuilder,
    rubric: Rubric,
    student_name: String,
    course: String,
    scores: ScoreSet,
    grade: Option<GradeResult>,
    feedback: Option<Feedback>,
    record_id: Option<String>,
}

impl EvaluationSession {
    pub fn new(builder: RecordBuilder, rubric: Rubric) -> Self {
        Self {
            builder,
            rubric,
            student_name: String::new(),
            course: String::new(),
            scores: ScoreSet::new(),
            grade: None,
            feedback: None,
            record_id: None,
        }
    }

    pub fn student_name(&self) -> &str {
        &self.student_name
    }

    pub fn course(&self) -> &str {
        &self.course
    }

    pub fn scores(&self) -> &ScoreSet {
        &self.scores
    }

    pub fn grade(&self) -> Option<GradeResult> {
        self.grade
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    pub fn set_student_name(&mut self, name: impl Into<String>) {
        self.student_name = name.into();
        self.record_id = None;
    }

    pub fn set_course(&mut self, course: impl Into<String>) {
        self.course = course.into();
        self.record_id = None;
    }

    /// Score one indicator. Any computed grade and feedback are discarded
    /// since they no longer match the scores.
    pub fn set_score(&mut self, indicator_id: &str, points: ScorePoints) -> Result<()> {
        if self.rubric.get(indicator_id).is_none() {
            anyhow::bail!("Unknown indicator '{}'", indicator_id);
        }
        self.scores.set(indicator_id, points);
        self.grade = None;
        self.feedback = None;
        self.record_id = None;
        Ok(())
    }

    /// Use feedback written by hand instead of generating it
    pub fn set_feedback(&mut self, text: impl Into<String>) {
        self.feedback = Some(Feedback {
            text: text.into(),
            grounding: None,
        });
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.builder
            .validate(&self.student_name, &self.course, &self.scores)
    }

    pub fn calculate_grade(&mut self) -> Result<GradeResult, ValidationError> {
        self.validate()?;
        let grade = self.builder.engine().grade(&self.scores);
        tracing::debug!(
            "Computed grade {:.1} from total {}",
            grade.final_grade,
            grade.total_score
        );
        self.grade = Some(grade);
        Ok(grade)
    }

    /// Ask the generator for feedback. On failure the session keeps no
    /// feedback and the error is returned.
    pub async fn generate_feedback<G: FeedbackGenerator>(
        &mut self,
        generator: &G,
    ) -> Result<&Feedback, SessionError> {
        self.validate()?;
        if self.grade.is_none() {
            self.calculate_grade()?;
        }

        self.feedback = None;
        match generator
            .generate(self.student_name.trim(), &self.scores, &self.rubric)
            .await
        {
            Ok(feedback) => Ok(self.feedback.insert(feedback)),
            Err(err) => {
                tracing::warn!("Feedback generation failed: {}", err);
                Err(err.into())
            }
        }
    }

    /// Build the immutable record. The session stays usable afterwards.
    pub fn finalize(&mut self) -> Result<EvaluationRecord, ValidationError> {
        let (feedback, grounding) = match &self.feedback {
            Some(f) => (Some(f.text.clone()), f.grounding.clone()),
            None => (None, None::<GroundingMetadata>),
        };
        let draft = RecordDraft {
            id: self.record_id.clone(),
            student_name: self.student_name.clone(),
            course: self.course.clone(),
            evaluation_date: None,
            scores: self.scores.clone(),
            grade: self.grade,
            feedback,
            grounding,
        };
        let record = self.builder.build(draft, BuildMode::Final)?;
        // Keep the id stable so a retried save targets the same record
        self.record_id = Some(record.id().to_string());
        Ok(record)
    }

    /// Finalize and persist. A failed save leaves the session untouched
    /// so it can be retried; after a successful one the next save creates
    /// a new record.
    pub fn save<S: EvaluationStore>(&mut self, store: &mut S) -> Result<EvaluationRecord> {
        let record = self.finalize()?;
        store.save(&record)?;
        self.record_id = None;
        tracing::info!(
            "Saved evaluation {} for {}",
            record.id(),
            record.student_name()
        );
        Ok(record)
    }
}
