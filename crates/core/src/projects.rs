//! Project and task status rules, plus progress arithmetic.

use serde::Serialize;

use crate::error::CoreError;
use crate::fields;
use crate::types::Timestamp;

pub const MAX_TITLE_LENGTH: usize = 200;
pub const MAX_DESCRIPTION_LENGTH: usize = 20_000;

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

pub const PROJECT_PLANNING: &str = "planning";
pub const PROJECT_ACTIVE: &str = "active";
pub const PROJECT_ON_HOLD: &str = "on_hold";
pub const PROJECT_COMPLETED: &str = "completed";
pub const PROJECT_CANCELLED: &str = "cancelled";

pub const PROJECT_STATUSES: &[&str] = &[
    PROJECT_PLANNING,
    PROJECT_ACTIVE,
    PROJECT_ON_HOLD,
    PROJECT_COMPLETED,
    PROJECT_CANCELLED,
];

pub fn validate_project_status(status: &str) -> Result<(), CoreError> {
    fields::one_of("project status", status, PROJECT_STATUSES)
}

/// Start and due dates are optional, but when both are set the due date may
/// not precede the start.
pub fn validate_date_range(
    start: Option<chrono::NaiveDate>,
    due: Option<chrono::NaiveDate>,
) -> Result<(), CoreError> {
    match (start, due) {
        (Some(s), Some(d)) if d < s => Err(CoreError::Validation(format!(
            "Due date {d} is before start date {s}"
        ))),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

pub const TASK_TODO: &str = "todo";
pub const TASK_IN_PROGRESS: &str = "in_progress";
pub const TASK_REVIEW: &str = "review";
pub const TASK_DONE: &str = "done";

pub const TASK_STATUSES: &[&str] = &[TASK_TODO, TASK_IN_PROGRESS, TASK_REVIEW, TASK_DONE];

pub const PRIORITY_LOW: &str = "low";
pub const PRIORITY_MEDIUM: &str = "medium";
pub const PRIORITY_HIGH: &str = "high";
pub const PRIORITY_URGENT: &str = "urgent";

pub const TASK_PRIORITIES: &[&str] = &[PRIORITY_LOW, PRIORITY_MEDIUM, PRIORITY_HIGH, PRIORITY_URGENT];

pub fn validate_task_status(status: &str) -> Result<(), CoreError> {
    fields::one_of("task status", status, TASK_STATUSES)
}

pub fn validate_task_priority(priority: &str) -> Result<(), CoreError> {
    fields::one_of("task priority", priority, TASK_PRIORITIES)
}

/// What to do with `completed_at` when a task's status changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionChange {
    /// Leave the column as it is.
    Keep,
    /// Stamp it with the given time.
    Set(Timestamp),
    /// Clear it.
    Clear,
}

/// Entering `done` stamps the completion time; leaving it clears the stamp.
pub fn completion_change(current: &str, next: &str, now: Timestamp) -> CompletionChange {
    match (current == TASK_DONE, next == TASK_DONE) {
        (false, true) => CompletionChange::Set(now),
        (true, false) => CompletionChange::Clear,
        _ => CompletionChange::Keep,
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Task counts for one project, keyed by status.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskCounts {
    pub todo: i64,
    pub in_progress: i64,
    pub review: i64,
    pub done: i64,
}

impl TaskCounts {
    /// Add `count` tasks of `status`. Unknown statuses are ignored.
    pub fn add(&mut self, status: &str, count: i64) {
        match status {
            TASK_TODO => self.todo += count,
            TASK_IN_PROGRESS => self.in_progress += count,
            TASK_REVIEW => self.review += count,
            TASK_DONE => self.done += count,
            _ => {}
        }
    }

    pub fn total(&self) -> i64 {
        self.todo + self.in_progress + self.review + self.done
    }

    /// Whole-number completion percentage; an empty project is 0%.
    pub fn completion_percent(&self) -> i32 {
        let total = self.total();
        if total == 0 {
            return 0;
        }
        ((self.done * 100) / total) as i32
    }
}
