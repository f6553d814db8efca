pub mod reference;
pub mod types;

pub use reference::{reference_rubric, REFERENCE_COURSES};
pub use types::{
    parse_score_assignment, InvalidScore, Rubric, RubricIndicator, ScoreLevel, ScorePoints,
    ScoreSet,
};
