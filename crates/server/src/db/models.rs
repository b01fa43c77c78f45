use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

/// A user as seen through a project's membership list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Member {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Status {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub description: String,
    pub assigned_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub priority: Option<i64>,
    pub status_id: String,
    pub created_at: String,
}

/// Task row joined with the display names of its assignee and status.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskSummary {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub description: String,
    pub assigned_id: String,
    pub assigned_username: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub priority: Option<i64>,
    pub status_id: String,
    pub status_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Journal {
    pub id: String,
    pub task_id: String,
    pub date: NaiveDate,
    pub author_id: String,
    pub entry: String,
    pub created_at: String,
}

/// Journal row joined with its author's username.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JournalEntry {
    pub id: String,
    pub task_id: String,
    pub date: NaiveDate,
    pub author_id: String,
    pub author_username: String,
    pub entry: String,
}

/// Validated input for inserting a task. The project comes from the URL,
/// never from the submitted form.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub name: String,
    pub description: String,
    pub assigned_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub priority: Option<i64>,
    pub status_id: String,
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub member_ids: Vec<String>,
}
