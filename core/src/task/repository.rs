//! Task repository trait
//!
//! Defines the interface for task storage operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::model::{NewTask, Task, TaskPatch};
use super::query::QueryPlan;
use crate::Result;

/// Repository interface for the authoritative task collection
///
/// The store is the only writer of ids and timestamps.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// List tasks filtered and ordered by the plan
    async fn list(&self, plan: &QueryPlan) -> Result<Vec<Task>>;

    /// Get a task by ID
    async fn get(&self, id: Uuid) -> Result<Option<Task>>;

    /// Persist a new task, assigning its id and timestamps
    async fn create(&self, task: NewTask) -> Result<Task>;

    /// Apply a partial update; `Error::NotFound` if no row matched
    async fn update(&self, id: Uuid, patch: TaskPatch) -> Result<Task>;

    /// Delete a task; `Error::NotFound` if no row matched
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// The store's own clock
    async fn now(&self) -> Result<DateTime<Utc>>;
}
