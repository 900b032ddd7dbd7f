use crate::models::subscription::{Subscription, WatchedTarget};
use anyhow::{Context, Result};
use livewatch_core::TargetKind;
use sqlx::SqlitePool;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct SubscriptionRepository {
    pool: SqlitePool,
}

impl SubscriptionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Adds a subscription, or refreshes the labels of an existing one.
    /// Labels passed as `None` keep their stored value.
    pub async fn record(
        &self,
        watcher_id: i64,
        target_id: &str,
        annotation: Option<&str>,
        owner_label: Option<&str>,
        kind: TargetKind,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (watcher_id, target_id, annotation, owner_label, kind)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(watcher_id, target_id) DO UPDATE SET
                annotation = COALESCE(excluded.annotation, subscriptions.annotation),
                owner_label = COALESCE(excluded.owner_label, subscriptions.owner_label),
                kind = excluded.kind
            "#,
        )
        .bind(watcher_id)
        .bind(target_id)
        .bind(annotation)
        .bind(owner_label)
        .bind(kind.as_str())
        .execute(&self.pool)
        .await
        .context("Failed to record subscription")?;
        Ok(())
    }

    /// Drops one subscription. A target nobody watches any more is deleted
    /// in the same transaction. Returns `false` if there was nothing to drop.
    pub async fn remove(&self, watcher_id: i64, target_id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let removed =
            sqlx::query("DELETE FROM subscriptions WHERE watcher_id = ? AND target_id = ?")
                .bind(watcher_id)
                .bind(target_id)
                .execute(&mut *tx)
                .await
                .context("Failed to delete subscription")?
                .rows_affected();

        if removed == 0 {
            tx.rollback().await.context("Failed to roll back")?;
            return Ok(false);
        }

        let orphaned = sqlx::query(
            r#"
            DELETE FROM targets
            WHERE id = ? AND NOT EXISTS (SELECT 1 FROM subscriptions WHERE target_id = ?)
            "#,
        )
        .bind(target_id)
        .bind(target_id)
        .execute(&mut *tx)
        .await
        .context("Failed to prune target")?
        .rows_affected();

        tx.commit().await.context("Failed to commit removal")?;
        if orphaned > 0 {
            debug!("{} has no watchers left, dropped", target_id);
        }
        Ok(true)
    }

    pub async fn list_for_watcher(&self, watcher_id: i64) -> Result<Vec<WatchedTarget>> {
        sqlx::query_as::<_, WatchedTarget>(
            r#"
            SELECT s.target_id, t.url, t.display_name, t.last_status,
                   s.annotation, s.owner_label, s.kind
            FROM subscriptions s
            JOIN targets t ON t.id = s.target_id
            WHERE s.watcher_id = ?
            ORDER BY s.created_at ASC, s.target_id ASC
            "#,
        )
        .bind(watcher_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch watcher subscriptions")
    }

    pub async fn subscribers_of(&self, target_id: &str) -> Result<Vec<Subscription>> {
        sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE target_id = ? ORDER BY watcher_id ASC",
        )
        .bind(target_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch target subscribers")
    }
}
