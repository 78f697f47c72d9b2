//! In-memory task storage implementation
//!
//! Keeps tasks in insertion order behind a lock. Used by tests and by the
//! server when no database is configured.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::model::{NewTask, Task, TaskPatch};
use super::query::QueryPlan;
use super::repository::TaskRepository;
use crate::{Error, Result};

/// Task store backed by a `Vec`
#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<Vec<Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with already-persisted records
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: RwLock::new(tasks),
        }
    }
}

#[async_trait]
impl TaskRepository for MemoryTaskStore {
    async fn list(&self, plan: &QueryPlan) -> Result<Vec<Task>> {
        let tasks = self.tasks.read().await;
        Ok(plan.apply(tasks.iter()))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn create(&self, new: NewTask) -> Result<Task> {
        let task = Task::from_new(Uuid::new_v4(), new, Utc::now());
        let mut tasks = self.tasks.write().await;
        tasks.push(task.clone());
        debug!("Stored task {} ({} total)", task.id, tasks.len());
        Ok(task)
    }

    async fn update(&self, id: Uuid, patch: TaskPatch) -> Result<Task> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        patch.apply(task, Utc::now());
        Ok(task.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Err(Error::NotFound(id.to_string()));
        }
        debug!("Removed task {}", id);
        Ok(())
    }

    async fn now(&self) -> Result<DateTime<Utc>> {
        Ok(Utc::now())
    }
}
