//! Display labels for board counters and task enums
//!
//! Label keys form a closed table; the text for each key comes from a string
//! table handed in by the caller, so the active locale is never ambient.

use std::collections::HashMap;

use crate::task::{TaskPriority, TaskStatus};

/// The counters shown above the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatKind {
    Total,
    Completed,
    InProgress,
    Overdue,
}

impl StatKind {
    pub const ALL: [StatKind; 4] = [
        StatKind::Total,
        StatKind::Completed,
        StatKind::InProgress,
        StatKind::Overdue,
    ];

    pub fn label_key(&self) -> &'static str {
        match self {
            Self::Total => "totalTasks",
            Self::Completed => "completed",
            Self::InProgress => "inProgress",
            Self::Overdue => "overdue",
        }
    }
}

pub fn status_label_key(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Todo => "toDo",
        TaskStatus::InProgress => "inProgress",
        TaskStatus::Review => "review",
        TaskStatus::Completed => "completed",
    }
}

pub fn priority_label_key(priority: TaskPriority) -> &'static str {
    priority.as_str()
}

/// A locale's string table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Labels {
    table: HashMap<String, String>,
}

impl Labels {
    pub fn new(table: HashMap<String, String>) -> Self {
        Self { table }
    }

    /// Built-in English table
    pub fn english() -> Self {
        let entries = [
            ("totalTasks", "Total Tasks"),
            ("completed", "Completed"),
            ("inProgress", "In Progress"),
            ("overdue", "Overdue"),
            ("toDo", "To Do"),
            ("review", "Review"),
            ("low", "Low"),
            ("medium", "Medium"),
            ("high", "High"),
        ];
        Self::new(
            entries
                .into_iter()
                .map(|(key, text)| (key.to_string(), text.to_string()))
                .collect(),
        )
    }

    /// Text for `key`, or the key itself when the table lacks it
    pub fn get<'a>(&'a self, key: &'a str) -> &'a str {
        self.table.get(key).map(String::as_str).unwrap_or(key)
    }

    pub fn stat(&self, kind: StatKind) -> &str {
        self.get(kind.label_key())
    }

    pub fn status(&self, status: TaskStatus) -> &str {
        self.get(status_label_key(status))
    }

    pub fn priority(&self, priority: TaskPriority) -> &str {
        self.get(priority_label_key(priority))
    }
}
