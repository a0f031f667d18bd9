use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A task inside a project.
///
/// Access to a task is decided by the owner of `project_id`, never by `assigned_to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Unique identifier for the task.
    pub id: i32,
    /// The title of the task.
    pub title: String,
    pub description: String,
    /// The project this task belongs to.
    pub project_id: i32,
    /// The user the task is assigned to; `None` means unassigned.
    pub assigned_to: Option<i32>,
    /// Timestamp of when the task was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last update to the task.
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub project_id: i32,
    pub assigned_to: Option<i32>,
}
