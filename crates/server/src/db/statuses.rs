//! Repository for the `statuses` reference table.

use sqlx::SqlitePool;

use super::models::Status;

pub struct StatusRepo;

impl StatusRepo {
    pub async fn list(pool: &SqlitePool) -> Result<Vec<Status>, sqlx::Error> {
        sqlx::query_as::<_, Status>("SELECT id, name FROM statuses ORDER BY rowid ASC")
            .fetch_all(pool)
            .await
    }
}
