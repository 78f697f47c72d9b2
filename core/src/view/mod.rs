//! Derived board view
//!
//! A pure computation from a task collection plus the user's filter and sort
//! selection to the list shown on the board and its summary counters. The
//! engine reads no clock and holds no state: `now` is passed in, so identical
//! inputs always give identical output.

mod filter;
mod labels;
mod sort;
mod stats;

pub use filter::*;
pub use labels::*;
pub use sort::*;
pub use stats::*;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::task::Task;

/// Everything the board renders for one set of inputs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedView {
    pub visible: Vec<Task>,
    pub stats: TaskStats,
}

/// Filter, then stably sort; stats always cover the whole collection.
pub fn derive_view(tasks: &[Task], params: &ViewParams, now: DateTime<Utc>) -> DerivedView {
    let mut visible = filter_tasks(tasks, params);
    if let Some(key) = params.sort_key {
        sort_tasks(&mut visible, key);
    }

    DerivedView {
        visible,
        stats: TaskStats::compute(tasks, now),
    }
}
