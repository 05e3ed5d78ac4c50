#![warn(clippy::pedantic)]
// Allow common pedantic lints that don't affect correctness
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::map_unwrap_or)]

//! # Task Query
//!
//! Natural-language query understanding and ranking for task lists.
//!
//! This crate provides:
//! - Date expression resolution (`today`, `overdue`, `2w`, `next friday`, ...)
//! - Multilingual property vocabularies for priority, due date and status
//! - Query parsing: template fast path, language-model path, keyword fallback
//! - Recovery of structured results from imperfect model output
//! - Filtering and weighted, activation-gated ranking of tasks
//!
//! ## Example
//!
//! ```rust,ignore
//! use task_query::{QueryConfig, QueryParser, rank_tasks};
//!
//! let config = QueryConfig::default();
//! let parser = QueryParser::new(config.clone(), None);
//! let query = parser.parse("urgent bugs due this week").await;
//! let ranked = rank_tasks(
//!     &tasks,
//!     &query,
//!     parser.registry(),
//!     &config.scoring,
//!     &[],
//!     parser.today(),
//! );
//! ```

// Core entities
pub mod entities;

// Error types
pub mod errors;

// Configuration loading
pub mod config;

// Date expressions
pub mod dates;

// Property vocabularies
pub mod terms;

// Keyword normalization
pub mod keywords;

// Query parsing
pub mod parser;

// Filtering and ranking
pub mod ranking;

// Task sources
pub mod source;

// Terminal UI helpers
pub mod ui;

// AI integration
pub mod ai;

// Re-export key types for convenience
pub use dates::{resolve_date_expression, DateFilter, DateRange, DateResolver};
pub use entities::{ParseSource, ParsedQuery, QueryConfig, StatusCategory, Task};
pub use errors::{QueryError, QueryResult};
pub use parser::QueryParser;
pub use ranking::{filter_tasks, rank_tasks, ScoreBreakdown, SortField};
pub use source::{JsonFileSource, TaskSource};
pub use terms::TermRegistry;

// Re-export AI types
pub use ai::{create_provider, AIMessage, AIProvider, AIResponse, AIRole, GenerateOptions};
