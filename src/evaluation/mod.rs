pub mod builder;
pub mod error;
pub mod record;

pub use builder::{BuildMode, RecordBuilder, RecordDraft};
pub use error::ValidationError;
pub use record::{EvaluationRecord, GroundingMetadata, SourceAttribution};
