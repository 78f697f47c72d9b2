//! Board sort keys

use std::cmp::Ordering;

use crate::task::{compare_titles, Task};

/// Sort selection offered by the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    DueDate,
    Priority,
    Status,
    Title,
}

impl SortKey {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "dueDate" => Some(Self::DueDate),
            "priority" => Some(Self::Priority),
            "status" => Some(Self::Status),
            "title" => Some(Self::Title),
            _ => None,
        }
    }

    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        match self {
            // Missing or unparsable dates sort last.
            Self::DueDate => match (a.due_at(), b.due_at()) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            Self::Priority => a.priority.rank().cmp(&b.priority.rank()),
            Self::Status => a.status.rank().cmp(&b.status.rank()),
            Self::Title => compare_titles(&a.title, &b.title),
        }
    }
}

/// Stable sort: equal keys keep their relative input order.
pub fn sort_tasks(tasks: &mut [Task], key: SortKey) {
    tasks.sort_by(|a, b| key.compare(a, b));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{NewTaskRequest, TaskPriority, TaskStatus};
    use chrono::Utc;
    use uuid::Uuid;

    fn task(title: &str) -> Task {
        let new = NewTaskRequest::new(title).validate().unwrap();
        Task::from_new(Uuid::new_v4(), new, Utc::now())
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn test_priority_sort_is_stable() {
        let mut one = task("1");
        one.priority = TaskPriority::Low;
        let mut two = task("2");
        two.priority = TaskPriority::High;
        let mut three = task("3");
        three.priority = TaskPriority::High;

        let mut tasks = vec![one, two, three];
        sort_tasks(&mut tasks, SortKey::Priority);
        assert_eq!(titles(&tasks), vec!["2", "3", "1"]);
    }

    #[test]
    fn test_status_rank_order() {
        let mut tasks: Vec<Task> = [
            TaskStatus::Completed,
            TaskStatus::Todo,
            TaskStatus::Review,
            TaskStatus::InProgress,
        ]
        .into_iter()
        .map(|status| {
            let mut t = task(status.as_str());
            t.status = status;
            t
        })
        .collect();

        sort_tasks(&mut tasks, SortKey::Status);
        assert_eq!(
            titles(&tasks),
            vec!["in-progress", "review", "todo", "completed"]
        );
    }

    #[test]
    fn test_due_date_missing_or_garbage_sorts_last() {
        let mut garbage = task("garbage");
        garbage.due_date = Some("soon".to_string());
        let missing = task("missing");
        let mut late = task("late");
        late.due_date = Some("2024-05-01".to_string());
        let mut early = task("early");
        early.due_date = Some("2024-01-05T00:00:00Z".to_string());

        let mut tasks = vec![garbage, missing, late, early];
        sort_tasks(&mut tasks, SortKey::DueDate);
        assert_eq!(titles(&tasks), vec!["early", "late", "garbage", "missing"]);
    }

    #[test]
    fn test_title_sort_folds_case() {
        let mut tasks = vec![task("cherry"), task("Banana"), task("apple")];
        sort_tasks(&mut tasks, SortKey::Title);
        assert_eq!(titles(&tasks), vec!["apple", "Banana", "cherry"]);
    }
}
