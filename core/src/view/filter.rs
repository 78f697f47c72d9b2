//! Board filters: free-text search, status and priority

use std::str::FromStr;

use crate::task::{Task, TaskPriority, TaskStatus};

use super::sort::SortKey;

/// A filter that is either off (`all`) or pinned to one value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter<T> {
    All,
    Only(T),
}

impl<T> Default for Filter<T> {
    fn default() -> Self {
        Self::All
    }
}

impl<T: FromStr + PartialEq> Filter<T> {
    /// Parse a UI token. `all` and tokens that name no value turn the filter off.
    pub fn from_token(token: &str) -> Self {
        if token == "all" {
            return Self::All;
        }
        token.parse().map(Self::Only).unwrap_or(Self::All)
    }

    pub fn accepts(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == value,
        }
    }
}

/// The user's current board selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewParams {
    pub search: String,
    pub status_filter: Filter<TaskStatus>,
    pub priority_filter: Filter<TaskPriority>,
    /// `None` keeps the collection order
    pub sort_key: Option<SortKey>,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            search: String::new(),
            status_filter: Filter::All,
            priority_filter: Filter::All,
            sort_key: Some(SortKey::DueDate),
        }
    }
}

impl ViewParams {
    /// Build from the raw UI tokens
    pub fn from_tokens(search: &str, status: &str, priority: &str, sort_key: &str) -> Self {
        Self {
            search: search.to_string(),
            status_filter: Filter::from_token(status),
            priority_filter: Filter::from_token(priority),
            sort_key: SortKey::from_token(sort_key),
        }
    }
}

/// Case-insensitive substring match on title, description or any tag.
pub fn matches_search(task: &Task, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let needle = needle.to_lowercase();
    task.title.to_lowercase().contains(&needle)
        || task.description.to_lowercase().contains(&needle)
        || task.tags.iter().any(|tag| tag.to_lowercase().contains(&needle))
}

/// Apply search, then status, then priority; input order is kept.
pub fn filter_tasks(tasks: &[Task], params: &ViewParams) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| matches_search(task, &params.search))
        .filter(|task| params.status_filter.accepts(&task.status))
        .filter(|task| params.priority_filter.accepts(&task.priority))
        .cloned()
        .collect()
}
