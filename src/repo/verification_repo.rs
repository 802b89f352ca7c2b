use anyhow::Result;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Clone)]
pub struct VerificationRepo {
    pub pool: PgPool,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct VerificationRow {
    pub contribution_id: Uuid,
    pub gateway: String,
    pub next_check_at: chrono::DateTime<chrono::Utc>,
    pub attempts: i32,
    pub status: String,
    pub last_response: Option<serde_json::Value>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl VerificationRepo {
    /// Upsert keeps the attempt count; re-enqueueing an already-tracked
    /// contribution only moves its next check forward.
    pub async fn enqueue(
        &self,
        contribution_id: Uuid,
        gateway: &str,
        next_check_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO contribution_verification (contribution_id, gateway, next_check_at, attempts, status, updated_at)
            VALUES ($1, $2, $3, 0, 'PENDING', now())
            ON CONFLICT (contribution_id) DO UPDATE SET
                gateway = EXCLUDED.gateway,
                next_check_at = EXCLUDED.next_check_at,
                status = 'PENDING',
                updated_at = now()
            "#,
        )
        .bind(contribution_id)
        .bind(gateway)
        .bind(next_check_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn due_items(&self, limit: i64) -> Result<Vec<VerificationRow>> {
        let rows = sqlx::query(
            r#"
            SELECT contribution_id, gateway, next_check_at, attempts, status, last_response, updated_at
            FROM contribution_verification
            WHERE status = 'PENDING' AND next_check_at <= now()
            ORDER BY next_check_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(map_row).collect())
    }

    pub async fn mark(
        &self,
        contribution_id: Uuid,
        status: &str,
        attempts: i32,
        last_response: serde_json::Value,
        next_check_at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE contribution_verification
            SET status = $2, attempts = $3, last_response = $4,
                next_check_at = COALESCE($5, next_check_at), updated_at = now()
            WHERE contribution_id = $1
            "#,
        )
        .bind(contribution_id)
        .bind(status)
        .bind(attempts)
        .bind(last_response)
        .bind(next_check_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Closes a tracked item after a terminal verification; attempts are
    /// left as-is. A no-op for contributions that never entered the queue.
    pub async fn mark_confirmed(
        &self,
        contribution_id: Uuid,
        last_response: serde_json::Value,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE contribution_verification
            SET status = 'CONFIRMED', last_response = $2, updated_at = now()
            WHERE contribution_id = $1
            "#,
        )
        .bind(contribution_id)
        .bind(last_response)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, contribution_id: Uuid) -> Result<Option<VerificationRow>> {
        let row = sqlx::query(
            r#"
            SELECT contribution_id, gateway, next_check_at, attempts, status, last_response, updated_at
            FROM contribution_verification
            WHERE contribution_id = $1
            "#,
        )
        .bind(contribution_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(map_row))
    }
}

fn map_row(row: sqlx::postgres::PgRow) -> VerificationRow {
    VerificationRow {
        contribution_id: row.get("contribution_id"),
        gateway: row.get("gateway"),
        next_check_at: row.get("next_check_at"),
        attempts: row.get("attempts"),
        status: row.get("status"),
        last_response: row.get("last_response"),
        updated_at: row.get("updated_at"),
    }
}
