//! Core data structures for task querying.

mod config;
mod query;
mod task;

pub use config::{
    DueDateScores, ExpansionConfig, ModelSettings, PriorityScores, QueryConfig, ScoringConfig,
    StatusCategoryConfig, StatusScores, UserTerms,
};
pub use query::{ExpansionMetadata, ParseSource, ParsedQuery};
pub use task::{normalize_tag, StatusCategory, Task};
