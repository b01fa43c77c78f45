//! Repository for the `projects` and `project_members` tables.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::models::{Member, NewProject, Project};

pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a project together with its member set in one transaction.
    pub async fn create(pool: &SqlitePool, input: &NewProject) -> Result<Project, sqlx::Error> {
        let project = Project {
            id: Uuid::new_v4().to_string(),
            name: input.name.clone(),
            created_at: Utc::now().to_rfc3339(),
        };

        let mut tx = pool.begin().await?;

        sqlx::query("INSERT INTO projects (id, name, created_at) VALUES (?, ?, ?)")
            .bind(&project.id)
            .bind(&project.name)
            .bind(&project.created_at)
            .execute(&mut *tx)
            .await?;

        for user_id in &input.member_ids {
            sqlx::query("INSERT INTO project_members (project_id, user_id) VALUES (?, ?)")
                .bind(&project.id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(project)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>("SELECT id, name, created_at FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Projects the given user is a member of.
    pub async fn list_for_member(
        pool: &SqlitePool,
        user_id: &str,
    ) -> Result<Vec<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT p.id, p.name, p.created_at
            FROM projects p
            JOIN project_members pm ON p.id = pm.project_id
            WHERE pm.user_id = ?
            ORDER BY p.name ASC, p.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn members(pool: &SqlitePool, project_id: &str) -> Result<Vec<Member>, sqlx::Error> {
        sqlx::query_as::<_, Member>(
            r#"
            SELECT u.id, u.username
            FROM project_members pm
            JOIN users u ON pm.user_id = u.id
            WHERE pm.project_id = ?
            ORDER BY u.username ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Delete a project and everything hanging off it: journals of its tasks,
    /// the tasks, the membership rows, then the project itself.
    ///
    /// Returns `false` if no such project exists.
    pub async fn delete_cascade(pool: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "DELETE FROM journals WHERE task_id IN (SELECT id FROM tasks WHERE project_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM tasks WHERE project_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM project_members WHERE project_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }
}
