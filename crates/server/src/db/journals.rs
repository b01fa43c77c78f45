//! Repository for the `journals` table. Journals are append-only.

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::models::{Journal, JournalEntry};

pub struct JournalRepo;

impl JournalRepo {
    pub async fn create(
        pool: &SqlitePool,
        task_id: &str,
        author_id: &str,
        date: NaiveDate,
        entry: &str,
    ) -> Result<Journal, sqlx::Error> {
        let journal = Journal {
            id: Uuid::new_v4().to_string(),
            task_id: task_id.to_string(),
            date,
            author_id: author_id.to_string(),
            entry: entry.to_string(),
            created_at: Utc::now().to_rfc3339(),
        };

        sqlx::query(
            "INSERT INTO journals (id, task_id, date, author_id, entry, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&journal.id)
        .bind(&journal.task_id)
        .bind(journal.date)
        .bind(&journal.author_id)
        .bind(&journal.entry)
        .bind(&journal.created_at)
        .execute(pool)
        .await?;

        Ok(journal)
    }

    /// Journal entries of a task in chronological order.
    pub async fn list_for_task(
        pool: &SqlitePool,
        task_id: &str,
    ) -> Result<Vec<JournalEntry>, sqlx::Error> {
        sqlx::query_as::<_, JournalEntry>(
            r#"
            SELECT j.id, j.task_id, j.date, j.author_id, u.username AS author_username, j.entry
            FROM journals j
            JOIN users u ON j.author_id = u.id
            WHERE j.task_id = ?
            ORDER BY j.date ASC, j.rowid ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }
}
