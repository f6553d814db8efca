pub mod config;
pub mod engine;
pub mod scale;
pub mod validation;

pub use config::*;
pub use engine::{all_indicators_scored, compute_total_score, GradeResult, ScoringEngine};
pub use scale::GradingScale;
pub use validation::validate_config;
