//! List query planning
//!
//! Turns the untrusted `sortBy` / `order` / `status` parameters of the list
//! endpoint into a [`QueryPlan`]. Every token is resolved through a closed
//! table; raw input never reaches the SQL text, which is assembled only from
//! `'static` fragments plus positional bind values.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::model::{compare_titles, Task, TaskStatus};

/// Raw list parameters, exactly as received from (or sent by) a client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ListParams {
    pub fn with_sort_by(mut self, sort_by: impl Into<String>) -> Self {
        self.sort_by = Some(sort_by.into());
        self
    }

    pub fn with_order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

/// Whitelisted sort columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    #[default]
    CreatedAt,
    UpdatedAt,
    Title,
    Status,
    Priority,
    DueDate,
}

impl SortColumn {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "created_at" | "createdAt" => Some(Self::CreatedAt),
            "updated_at" | "updatedAt" => Some(Self::UpdatedAt),
            "title" => Some(Self::Title),
            "status" => Some(Self::Status),
            "priority" => Some(Self::Priority),
            "due_date" | "dueDate" => Some(Self::DueDate),
            _ => None,
        }
    }

    /// SQL expressions sorted on, most significant first. Status and priority
    /// use their display ranks; titles fold case under the code-point
    /// collation so the database agrees with [`compare_titles`].
    pub fn sql(&self) -> &'static [&'static str] {
        match self {
            Self::CreatedAt => &["created_at"],
            Self::UpdatedAt => &["updated_at"],
            Self::Title => &["LOWER(title) COLLATE \"C\"", "title COLLATE \"C\""],
            Self::Status => &[
                "CASE status WHEN 'in-progress' THEN 0 WHEN 'review' THEN 1 WHEN 'todo' THEN 2 ELSE 3 END",
            ],
            Self::Priority => &["CASE priority WHEN 'high' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END"],
            Self::DueDate => &["due_date"],
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

/// Optional status predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Is(TaskStatus),
    /// Anything that is not yet completed (`status=pending`)
    IsNot(TaskStatus),
}

impl StatusFilter {
    /// `all` and unknown tokens yield no predicate.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "all" => None,
            "pending" => Some(Self::IsNot(TaskStatus::Completed)),
            other => TaskStatus::from_legacy(other).map(Self::Is),
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Self::Is(status) => task.status == *status,
            Self::IsNot(status) => task.status != *status,
        }
    }
}

/// SQL text plus its positional bind values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlQuery {
    pub text: String,
    pub binds: Vec<&'static str>,
}

pub const TASK_COLUMNS: &str = "id, title, description, status, priority, due_date, assignee, tags, progress, created_at, updated_at";

/// A safe, deterministic plan for listing tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryPlan {
    pub sort: SortColumn,
    pub order: SortOrder,
    pub status: Option<StatusFilter>,
}

impl QueryPlan {
    pub fn from_params(params: &ListParams) -> Self {
        Self {
            sort: params
                .sort_by
                .as_deref()
                .and_then(SortColumn::from_token)
                .unwrap_or_default(),
            order: params
                .order
                .as_deref()
                .and_then(SortOrder::from_token)
                .unwrap_or_default(),
            status: params.status.as_deref().and_then(StatusFilter::from_token),
        }
    }

    /// Render the plan as a PostgreSQL statement against `tasks`.
    pub fn to_sql(&self) -> SqlQuery {
        let mut text = format!("SELECT {} FROM tasks", TASK_COLUMNS);
        let mut binds = Vec::new();

        if let Some(filter) = self.status {
            let (op, status) = match filter {
                StatusFilter::Is(status) => ("=", status),
                StatusFilter::IsNot(status) => ("<>", status),
            };
            binds.push(status.as_str());
            text.push_str(&format!(" WHERE status {} ${}", op, binds.len()));
        }

        let terms: Vec<String> = self
            .sort
            .sql()
            .iter()
            .map(|expr| format!("{} {}", expr, self.order.sql()))
            .collect();
        text.push_str(" ORDER BY ");
        text.push_str(&terms.join(", "));
        if self.sort == SortColumn::DueDate {
            text.push_str(" NULLS LAST");
        }
        if self.sort != SortColumn::CreatedAt {
            text.push_str(", created_at ASC");
        }
        text.push_str(", id ASC");

        SqlQuery { text, binds }
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.status.map_or(true, |filter| filter.matches(task))
    }

    /// Same ordering as [`QueryPlan::to_sql`], for stores that sort in memory.
    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let primary = match self.sort {
            SortColumn::CreatedAt => self.order.apply(a.created_at.cmp(&b.created_at)),
            SortColumn::UpdatedAt => self.order.apply(a.updated_at.cmp(&b.updated_at)),
            SortColumn::Title => self.order.apply(compare_titles(&a.title, &b.title)),
            SortColumn::Status => self.order.apply(a.status.rank().cmp(&b.status.rank())),
            SortColumn::Priority => self
                .order
                .apply(a.priority.rank().cmp(&b.priority.rank())),
            SortColumn::DueDate => match (a.due_at(), b.due_at()) {
                (Some(x), Some(y)) => self.order.apply(x.cmp(&y)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        };

        primary
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    }

    /// Filter and order an in-memory collection.
    pub fn apply<'a>(&self, tasks: impl IntoIterator<Item = &'a Task>) -> Vec<Task> {
        let mut selected: Vec<Task> = tasks
            .into_iter()
            .filter(|task| self.matches(task))
            .cloned()
            .collect();
        selected.sort_by(|a, b| self.compare(a, b));
        selected
    }
}
