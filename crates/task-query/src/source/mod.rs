//! Task sources.
//!
//! The engine only reads tasks; where they come from is behind
//! [`TaskSource`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::fs;

use crate::entities::{QueryConfig, Task};
use crate::errors::{QueryError, QueryResult};
use crate::terms::TermRegistry;

/// Anything that can supply the task collection for a query
#[async_trait]
pub trait TaskSource: Send + Sync {
    async fn load_tasks(&self) -> QueryResult<Vec<Task>>;
}

/// Accepted file layouts
#[derive(Deserialize)]
#[serde(untagged)]
enum TaskFile {
    List(Vec<Task>),
    Wrapped { tasks: Vec<Task> },
}

/// Tasks stored as JSON, either a bare array or `{"tasks": [...]}`
pub struct JsonFileSource {
    path: PathBuf,
    registry: TermRegistry,
}

impl JsonFileSource {
    /// Create a source for `path`, deriving missing status categories from
    /// the configured status symbols.
    pub fn new(path: impl AsRef<Path>, config: &QueryConfig) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            registry: TermRegistry::from_config(config),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&self, content: &str) -> QueryResult<Vec<Task>> {
        let file: TaskFile = serde_json::from_str(content).map_err(|e| QueryError::JsonParseError {
            reason: format!("{}: {e}", self.path.display()),
        })?;
        let tasks = match file {
            TaskFile::List(tasks) | TaskFile::Wrapped { tasks } => tasks,
        };

        Ok(tasks
            .into_iter()
            .enumerate()
            .map(|(index, mut task)| {
                if task.status_category.is_none() {
                    task.status_category = Some(self.registry.category_for_symbol(&task.status));
                }
                if task.id.is_empty() {
                    task.id = (index + 1).to_string();
                }
                task
            })
            .collect())
    }
}

#[async_trait]
impl TaskSource for JsonFileSource {
    async fn load_tasks(&self) -> QueryResult<Vec<Task>> {
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| QueryError::FileReadError {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;

        let tasks = self.parse(&content)?;
        tracing::debug!(path = %self.path.display(), count = tasks.len(), "Loaded tasks");
        Ok(tasks)
    }
}

/// In-memory source, mostly for embedding and tests
#[async_trait]
impl TaskSource for Vec<Task> {
    async fn load_tasks(&self) -> QueryResult<Vec<Task>> {
        Ok(self.clone())
    }
}
