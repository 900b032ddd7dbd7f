use crate::models::target::{Target, TargetStatus};
use anyhow::{Context, Result};
use livewatch_core::Liveness;
use sqlx::SqlitePool;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TargetRepository {
    pool: SqlitePool,
}

impl TargetRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts or refreshes a target. The URL is fixed when the row is created,
    /// `UNKNOWN` never overwrites a stored status and a missing name never clears a stored one.
    pub async fn upsert(
        &self,
        id: &str,
        url: &str,
        display_name: Option<&str>,
        status: TargetStatus,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO targets (id, url, display_name, last_status, updated_at)
            VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(id) DO UPDATE SET
                display_name = COALESCE(excluded.display_name, targets.display_name),
                last_status = CASE
                    WHEN excluded.last_status = 'UNKNOWN' THEN targets.last_status
                    ELSE excluded.last_status
                END,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(id)
        .bind(url)
        .bind(display_name)
        .bind(status)
        .execute(&self.pool)
        .await
        .context("Failed to upsert target")?;
        Ok(())
    }

    /// Creates the row as `UNKNOWN` if it does not exist yet.
    pub async fn ensure(&self, id: &str, url: &str) -> Result<()> {
        self.upsert(id, url, None, TargetStatus::Unknown).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Target>> {
        sqlx::query_as::<_, Target>("SELECT * FROM targets WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch target")
    }

    pub async fn list_all(&self) -> Result<Vec<Target>> {
        sqlx::query_as::<_, Target>("SELECT * FROM targets ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch targets")
    }

    /// Stores a conclusive verdict and returns the status it replaced.
    ///
    /// Read and write happen in one transaction that starts with a write, so
    /// two concurrent callers for the same target serialize on the database
    /// lock and each observes the other's result. `None` means the target row
    /// does not exist.
    pub async fn record_resolution(
        &self,
        id: &str,
        status: Liveness,
        display_name: Option<&str>,
    ) -> Result<Option<TargetStatus>> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let previous: Option<TargetStatus> = sqlx::query_scalar(
            r#"
            UPDATE targets
            SET display_name = COALESCE(?, display_name), updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            RETURNING last_status
            "#,
        )
        .bind(display_name)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to touch target")?;

        let Some(previous) = previous else {
            tx.rollback().await.context("Failed to roll back")?;
            return Ok(None);
        };

        let next = TargetStatus::from(status);
        if previous != next {
            sqlx::query("UPDATE targets SET last_status = ? WHERE id = ?")
                .bind(next)
                .bind(id)
                .execute(&mut *tx)
                .await
                .context("Failed to update target status")?;
            debug!("{} stored {} -> {}", id, previous, next);
        }

        tx.commit().await.context("Failed to commit status")?;
        Ok(Some(previous))
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM targets WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete target")?;
        Ok(result.rows_affected() > 0)
    }
}
