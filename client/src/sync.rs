//! Client mirror of the task collection
//!
//! [`TaskSync`] is the only writer of [`SyncState`]. Every operation talks to
//! the server first and touches the mirror only once the server has
//! confirmed, so a failed call leaves `items` exactly as it was. Operations
//! may overlap; when two of them resolve for the same task, the one that
//! resolves last is what the mirror shows.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use board_core::task::{ListParams, NewTaskRequest, Task, TaskPatchRequest};
use board_core::view::{derive_view, DerivedView, ViewParams};

use crate::api::TaskApi;
use crate::config::{ClientConfig, DEFAULT_REQUEST_TIMEOUT};
use crate::error::{ClientError, Result};

/// What the presentation layer sees of the collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncState {
    pub items: Vec<Task>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Owner of the client mirror
pub struct TaskSync<A> {
    api: Arc<A>,
    state: Arc<RwLock<SyncState>>,
    timeout: Duration,
}

impl<A> Clone for TaskSync<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            state: Arc::clone(&self.state),
            timeout: self.timeout,
        }
    }
}

impl<A: TaskApi> TaskSync<A> {
    pub fn new(api: A) -> Self {
        Self::with_timeout(api, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Bound every operation by `config.request_timeout`.
    pub fn from_config(api: A, config: &ClientConfig) -> Self {
        Self::with_timeout(api, config.request_timeout)
    }

    pub fn with_timeout(api: A, timeout: Duration) -> Self {
        Self {
            api: Arc::new(api),
            state: Arc::new(RwLock::new(SyncState::default())),
            timeout,
        }
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> SyncState {
        self.state.read().await.clone()
    }

    /// Run the board view over the current mirror.
    pub async fn view(&self, params: &ViewParams, now: DateTime<Utc>) -> DerivedView {
        let state = self.state.read().await;
        derive_view(&state.items, params, now)
    }

    async fn call<T>(&self, request: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| ClientError::Timeout)?
    }

    async fn record_failure(&self, operation: &str, err: &ClientError) {
        warn!("Task {} failed: {}", operation, err);
        self.state.write().await.error = Some(err.to_string());
    }

    /// Replace the mirror with the server's ordered collection.
    pub async fn fetch_all(&self, params: &ListParams) -> Result<()> {
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }

        let result = self.call(self.api.list(params)).await;

        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(tasks) => {
                debug!("Refreshed mirror with {} tasks", tasks.len());
                state.items = tasks;
                state.error = None;
                Ok(())
            }
            Err(err) => {
                warn!("Task fetch failed: {}", err);
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Create on the server, then put the confirmed task at the head.
    ///
    /// A fetch that resolved in between may already hold the task; that entry
    /// is replaced in place so ids stay unique.
    pub async fn create(&self, request: NewTaskRequest) -> Result<Task> {
        match self.call(self.api.create(&request)).await {
            Ok(task) => {
                let mut state = self.state.write().await;
                match state.items.iter_mut().find(|t| t.id == task.id) {
                    Some(slot) => *slot = task.clone(),
                    None => state.items.insert(0, task.clone()),
                }
                Ok(task)
            }
            Err(err) => {
                self.record_failure("create", &err).await;
                Err(err)
            }
        }
    }

    pub async fn set_completion(&self, id: Uuid, completed: bool) -> Result<Task> {
        self.update(id, TaskPatchRequest::completion(completed)).await
    }

    pub async fn edit_title(&self, id: Uuid, title: impl Into<String>) -> Result<Task> {
        self.update(id, TaskPatchRequest::title(title)).await
    }

    /// Patch on the server and swap the confirmed record in place.
    ///
    /// A task the mirror does not hold is not inserted.
    pub async fn update(&self, id: Uuid, patch: TaskPatchRequest) -> Result<Task> {
        match self.call(self.api.update(id, &patch)).await {
            Ok(task) => {
                let mut state = self.state.write().await;
                if let Some(slot) = state.items.iter_mut().find(|t| t.id == id) {
                    *slot = task.clone();
                }
                Ok(task)
            }
            Err(err) => {
                self.record_failure("update", &err).await;
                Err(err)
            }
        }
    }

    pub async fn remove(&self, id: Uuid) -> Result<()> {
        match self.call(self.api.delete(id)).await {
            Ok(()) => {
                self.state.write().await.items.retain(|t| t.id != id);
                Ok(())
            }
            Err(err) => {
                self.record_failure("delete", &err).await;
                Err(err)
            }
        }
    }
}
