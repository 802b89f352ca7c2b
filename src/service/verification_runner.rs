use crate::error::PaymentError;
use crate::repo::verification_repo::{VerificationRepo, VerificationRow};
use crate::service::payment_service::PaymentService;
use anyhow::Result;
use chrono::Utc;

pub struct VerificationRunner {
    pub service: PaymentService,
    pub verification_repo: VerificationRepo,
    pub poll_interval: std::time::Duration,
    pub batch_size: i64,
    pub max_attempts: i32,
}

/// Doubling delay from two minutes, capped at thirty.
pub fn next_backoff(attempts: i32) -> chrono::Duration {
    let minutes = (2i64 << attempts.clamp(0, 8) as u32).min(30);
    chrono::Duration::minutes(minutes)
}

impl VerificationRunner {
    pub async fn run(self) {
        loop {
            match self.tick().await {
                Ok(n) if n > 0 => tracing::info!(processed = n, "verification pass complete"),
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "verification pass failed"),
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    pub async fn tick(&self) -> Result<usize> {
        let due = self.verification_repo.due_items(self.batch_size).await?;
        let count = due.len();
        for row in due {
            if let Err(e) = self.process(row).await {
                tracing::error!(error = %e, "verification item failed");
            }
        }
        Ok(count)
    }

    async fn process(&self, row: VerificationRow) -> Result<()> {
        let attempts = row.attempts + 1;

        match self.service.confirm_inner(row.contribution_id).await {
            // Terminal outcomes are marked CONFIRMED by the confirm flow.
            Ok(outcome) if outcome.status.is_terminal() => Ok(()),
            Ok(outcome) => {
                self.reschedule(&row, attempts, serde_json::to_value(&outcome)?)
                    .await
            }
            Err(PaymentError::VerificationMismatch(detail)) => {
                self.verification_repo
                    .mark(
                        row.contribution_id,
                        "REVIEW",
                        attempts,
                        serde_json::json!({ "mismatch": detail }),
                        None,
                    )
                    .await
            }
            Err(e) => {
                self.reschedule(&row, attempts, serde_json::json!({ "error": e.to_string() }))
                    .await
            }
        }
    }

    async fn reschedule(
        &self,
        row: &VerificationRow,
        attempts: i32,
        last_response: serde_json::Value,
    ) -> Result<()> {
        let (status, next) = if attempts >= self.max_attempts {
            ("EXHAUSTED", None)
        } else {
            ("PENDING", Some(Utc::now() + next_backoff(attempts)))
        };

        self.verification_repo
            .mark(row.contribution_id, status, attempts, last_response, next)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        assert_eq!(next_backoff(0).num_minutes(), 2);
        assert_eq!(next_backoff(1).num_minutes(), 4);
        assert_eq!(next_backoff(2).num_minutes(), 8);
        assert_eq!(next_backoff(3).num_minutes(), 16);
        assert_eq!(next_backoff(4).num_minutes(), 30);
        assert_eq!(next_backoff(12).num_minutes(), 30);
    }
}
