//! Board summary counters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskStatus};

use super::labels::StatKind;

/// Counters shown above the board, always over the full collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub overdue: usize,
}

impl TaskStats {
    pub fn compute(tasks: &[Task], now: DateTime<Utc>) -> Self {
        tasks.iter().fold(Self::default(), |mut stats, task| {
            stats.total += 1;
            match task.status {
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Todo | TaskStatus::Review => {}
            }
            if is_overdue(task, now) {
                stats.overdue += 1;
            }
            stats
        })
    }

    pub fn get(&self, kind: StatKind) -> usize {
        match kind {
            StatKind::Total => self.total,
            StatKind::Completed => self.completed,
            StatKind::InProgress => self.in_progress,
            StatKind::Overdue => self.overdue,
        }
    }

    /// Counters in display order
    pub fn entries(&self) -> [(StatKind, usize); 4] {
        StatKind::ALL.map(|kind| (kind, self.get(kind)))
    }
}

/// Open and past its due date. Tasks without a usable date are never overdue.
pub fn is_overdue(task: &Task, now: DateTime<Utc>) -> bool {
    !task.is_completed() && task.due_at().is_some_and(|due| due < now)
}
