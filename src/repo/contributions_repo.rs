use crate::domain::contribution::{ContributionStatus, Gateway, PaymentIntent};
use anyhow::Result;
use sqlx::{PgPool, Row};
use uuid::Uuid;

pub struct ContributionRecordInput {
    pub contribution_id: Uuid,
    pub intent: PaymentIntent,
    pub gateway: Gateway,
    pub gateway_ref: Option<String>,
}

#[derive(Clone)]
pub struct ContributionsRepo {
    pub pool: PgPool,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct StoredContribution {
    pub contribution_id: Uuid,
    pub creator_id: String,
    pub supporter_id: String,
    pub amount_paisa: i64,
    pub gateway: String,
    pub gateway_ref: Option<String>,
    pub status: String,
    pub needs_review: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ContributionsRepo {
    pub async fn insert(&self, data: &ContributionRecordInput) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO contributions (
                contribution_id, creator_id, supporter_id, amount_paisa, message,
                tier_level, gateway, gateway_ref, status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(data.contribution_id)
        .bind(data.intent.creator_id.clone())
        .bind(data.intent.supporter_id.clone())
        .bind(data.intent.amount_paisa)
        .bind(data.intent.message.clone())
        .bind(data.intent.tier_level)
        .bind(data.gateway.as_str())
        .bind(data.gateway_ref.clone())
        .bind(ContributionStatus::Initiated.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find(&self, contribution_id: Uuid) -> Result<Option<StoredContribution>> {
        let row = sqlx::query(
            r#"
            SELECT contribution_id, creator_id, supporter_id, amount_paisa, gateway,
                   gateway_ref, status, needs_review, created_at
            FROM contributions
            WHERE contribution_id = $1
            "#,
        )
        .bind(contribution_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(map_row))
    }

    /// Records a non-credit transition. A credited row is never downgraded
    /// by a late or out-of-order verification result.
    pub async fn mark_status(
        &self,
        contribution_id: Uuid,
        status: ContributionStatus,
        gateway_ref: Option<&str>,
        last_verification: serde_json::Value,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE contributions
            SET status = $2,
                gateway_ref = COALESCE($3, gateway_ref),
                last_verification = $4,
                updated_at = now()
            WHERE contribution_id = $1 AND status <> 'COMPLETED'
            "#,
        )
        .bind(contribution_id)
        .bind(status.as_str())
        .bind(gateway_ref)
        .bind(last_verification)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// The COMPLETED transition fires at most once per contribution; the
    /// returned bool says whether this call was the one that credited.
    pub async fn credit_if_uncredited(
        &self,
        contribution_id: Uuid,
        reference_id: Option<&str>,
        last_verification: serde_json::Value,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE contributions
            SET status = 'COMPLETED',
                gateway_ref = COALESCE($2, gateway_ref),
                last_verification = $3,
                credited_at = now(),
                updated_at = now()
            WHERE contribution_id = $1 AND status <> 'COMPLETED'
            "#,
        )
        .bind(contribution_id)
        .bind(reference_id)
        .bind(last_verification)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_needs_review(
        &self,
        contribution_id: Uuid,
        detail: serde_json::Value,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE contributions
            SET needs_review = TRUE, last_verification = $2, updated_at = now()
            WHERE contribution_id = $1
            "#,
        )
        .bind(contribution_id)
        .bind(detail)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn map_row(row: sqlx::postgres::PgRow) -> StoredContribution {
    StoredContribution {
        contribution_id: row.get("contribution_id"),
        creator_id: row.get("creator_id"),
        supporter_id: row.get("supporter_id"),
        amount_paisa: row.get("amount_paisa"),
        gateway: row.get("gateway"),
        gateway_ref: row.get("gateway_ref"),
        status: row.get("status"),
        needs_review: row.get("needs_review"),
        created_at: row.get("created_at"),
    }
}
