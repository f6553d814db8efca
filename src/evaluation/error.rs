use std::fmt;

/// Reasons an evaluation cannot be turned into a record.
/// Checked in declaration order; only the first violation is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    MissingStudentName,
    MissingCourse,
    IncompleteScoring,
    GradeNotComputed,
    FeedbackNotGenerated,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingStudentName => write!(f, "Student name is required."),
            ValidationError::MissingCourse => write!(f, "A valid course is required."),
            ValidationError::IncompleteScoring => {
                write!(f, "Every indicator must be scored before continuing.")
            }
            ValidationError::GradeNotComputed => {
                write!(f, "Calculate the final grade first.")
            }
            ValidationError::FeedbackNotGenerated => {
                write!(f, "Generate the feedback first.")
            }
        }
    }
}

impl std::error::Error for ValidationError {}
