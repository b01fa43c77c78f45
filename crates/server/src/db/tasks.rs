//! Repository for the `tasks` table.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::models::{NewTask, Task, TaskSummary};

const COLUMNS: &str = "id, project_id, name, description, assigned_id, start_date, end_date, \
                       priority, status_id, created_at";

const SUMMARY_SELECT: &str = r#"
    SELECT t.id, t.project_id, t.name, t.description, t.assigned_id,
           u.username AS assigned_username, t.start_date, t.end_date, t.priority,
           t.status_id, s.name AS status_name
    FROM tasks t
    JOIN users u ON t.assigned_id = u.id
    JOIN statuses s ON t.status_id = s.id
"#;

pub struct TaskRepo;

impl TaskRepo {
    pub async fn create(
        pool: &SqlitePool,
        project_id: &str,
        input: &NewTask,
    ) -> Result<Task, sqlx::Error> {
        let task = Task {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            name: input.name.clone(),
            description: input.description.clone(),
            assigned_id: input.assigned_id.clone(),
            start_date: input.start_date,
            end_date: input.end_date,
            priority: input.priority,
            status_id: input.status_id.clone(),
            created_at: Utc::now().to_rfc3339(),
        };

        let query = format!("INSERT INTO tasks ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)");
        sqlx::query(&query)
            .bind(&task.id)
            .bind(&task.project_id)
            .bind(&task.name)
            .bind(&task.description)
            .bind(&task.assigned_id)
            .bind(task.start_date)
            .bind(task.end_date)
            .bind(task.priority)
            .bind(&task.status_id)
            .bind(&task.created_at)
            .execute(pool)
            .await?;

        Ok(task)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = ?");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_summary(
        pool: &SqlitePool,
        id: &str,
    ) -> Result<Option<TaskSummary>, sqlx::Error> {
        let query = format!("{SUMMARY_SELECT} WHERE t.id = ?");
        sqlx::query_as::<_, TaskSummary>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_project(
        pool: &SqlitePool,
        project_id: &str,
    ) -> Result<Vec<TaskSummary>, sqlx::Error> {
        let query = format!(
            "{SUMMARY_SELECT} WHERE t.project_id = ? ORDER BY t.start_date ASC, t.name ASC"
        );
        sqlx::query_as::<_, TaskSummary>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Overwrite the editable fields of a task. `project_id` is not part of
    /// the statement, so a task never moves between projects.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &SqlitePool,
        id: &str,
        input: &NewTask,
    ) -> Result<Option<Task>, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE tasks SET
                name = ?,
                description = ?,
                assigned_id = ?,
                start_date = ?,
                end_date = ?,
                priority = ?,
                status_id = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.assigned_id)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.priority)
        .bind(&input.status_id)
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Self::find_by_id(pool, id).await
    }

    /// Delete a task and its journals. Returns `false` if no such task exists.
    pub async fn delete_cascade(pool: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM journals WHERE task_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }
}
