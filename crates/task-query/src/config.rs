//! Configuration loading.

use std::collections::HashSet;
use std::path::Path;

use tokio::fs;

use crate::entities::QueryConfig;
use crate::errors::{QueryError, QueryResult};

/// Load configuration from a JSON file.
///
/// A missing file yields the default configuration.
pub async fn load_config(path: impl AsRef<Path>) -> QueryResult<QueryConfig> {
    let path = path.as_ref();
    let config = match fs::read_to_string(path).await {
        Ok(content) => serde_json::from_str(&content).map_err(|e| QueryError::ConfigError {
            reason: format!("{}: {e}", path.display()),
        })?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            QueryConfig::default()
        }
        Err(e) => {
            return Err(QueryError::FileReadError {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
        }
    };

    validate(&config)?;
    Ok(config)
}

/// Reject configurations the engine cannot use.
pub fn validate(config: &QueryConfig) -> QueryResult<()> {
    if let Some(value) = config.priority_mapping.keys().find(|p| !(1..=4).contains(*p)) {
        return Err(QueryError::InvalidPriority {
            priority: value.to_string(),
        });
    }

    let mut keys = HashSet::new();
    for category in &config.status_categories {
        if category.key.trim().is_empty() {
            return Err(QueryError::ConfigError {
                reason: "status category with empty key".to_string(),
            });
        }
        if !keys.insert(category.key.to_lowercase()) {
            return Err(QueryError::ConfigError {
                reason: format!("duplicate status category '{}'", category.key),
            });
        }
    }

    let scoring = &config.scoring;
    let coefficients = [
        ("relevanceCoefficient", scoring.relevance_coefficient),
        ("dueDateCoefficient", scoring.due_date_coefficient),
        ("priorityCoefficient", scoring.priority_coefficient),
        ("statusCoefficient", scoring.status_coefficient),
        ("coreKeywordWeight", scoring.core_keyword_weight),
    ];
    if let Some((name, _)) = coefficients.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
        return Err(QueryError::ConfigError {
            reason: format!("scoring.{name} must be a non-negative number"),
        });
    }

    Ok(())
}
