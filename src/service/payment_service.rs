use crate::domain::contribution::{
    ConfirmOutcome, ContributionStatus, CreateContributionRequest, Gateway,
    InitiateContributionResponse, validate_intent,
};
use crate::error::PaymentError;
use crate::gateways::{SupportGateway, VerificationRef};
use crate::ratelimit::RateLimitStore;
use crate::repo::contributions_repo::{ContributionRecordInput, ContributionsRepo, StoredContribution};
use crate::repo::verification_repo::VerificationRepo;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

const INITIATE_WINDOW_MS: i64 = 60_000;
const RECHECK_DELAY_MINUTES: i64 = 2;

#[derive(Clone)]
pub struct PaymentService {
    pub pool: PgPool,
    pub contributions_repo: ContributionsRepo,
    pub verification_repo: VerificationRepo,
    pub esewa: Arc<dyn SupportGateway>,
    pub khalti: Arc<dyn SupportGateway>,
    pub rate_limiter: Arc<dyn RateLimitStore>,
    pub initiate_max_per_minute: i64,
}

impl PaymentService {
    fn gateway_for(&self, gateway: Gateway) -> Arc<dyn SupportGateway> {
        match gateway {
            Gateway::Esewa => Arc::clone(&self.esewa),
            Gateway::Khalti => Arc::clone(&self.khalti),
        }
    }

    pub async fn initiate(
        &self,
        req: CreateContributionRequest,
    ) -> Result<InitiateContributionResponse, PaymentError> {
        let gateway_kind = req.gateway;
        let intent = req.into_intent();
        validate_intent(&intent)?;

        let key = format!("initiate:{}", intent.supporter_id);
        match self
            .rate_limiter
            .allow(&key, self.initiate_max_per_minute, INITIATE_WINDOW_MS)
            .await
        {
            Ok(true) => {}
            Ok(false) => return Err(PaymentError::RateLimitExceeded),
            Err(e) => {
                tracing::warn!(error = %e, "rate-limit store unavailable, allowing request")
            }
        }

        let contribution_id = Uuid::new_v4();
        let outcome = self
            .gateway_for(gateway_kind)
            .initiate(&intent, contribution_id)
            .await?;

        self.contributions_repo
            .insert(&ContributionRecordInput {
                contribution_id,
                intent,
                gateway: gateway_kind,
                gateway_ref: outcome.gateway_ref.clone(),
            })
            .await
            .map_err(PaymentError::Internal)?;

        tracing::info!(%contribution_id, gateway = gateway_kind.as_str(), "contribution initiated");

        Ok(InitiateContributionResponse {
            contribution_id,
            gateway: gateway_kind,
            status: ContributionStatus::Initiated,
            redirect: outcome.redirect,
        })
    }

    /// Runs the verification in a spawned task: if the caller's request is
    /// aborted mid-flight, the gateway call still completes and its outcome
    /// is persisted, so a retry sees the recorded result instead of
    /// re-charging ambiguity.
    pub async fn confirm(&self, contribution_id: Uuid) -> Result<ConfirmOutcome, PaymentError> {
        let service = self.clone();
        tokio::spawn(async move { service.confirm_inner(contribution_id).await })
            .await
            .map_err(|e| {
                PaymentError::Internal(anyhow::anyhow!("verification task failed: {e}"))
            })?
    }

    pub async fn confirm_inner(
        &self,
        contribution_id: Uuid,
    ) -> Result<ConfirmOutcome, PaymentError> {
        let row = self
            .contributions_repo
            .find(contribution_id)
            .await
            .map_err(PaymentError::Internal)?
            .ok_or_else(|| PaymentError::validation("unknown contribution"))?;

        let gateway_kind = Gateway::parse(&row.gateway).ok_or_else(|| {
            PaymentError::Internal(anyhow::anyhow!("ledger row has unknown gateway {}", row.gateway))
        })?;
        let reference = verification_ref(&row, gateway_kind)?;

        let result = match self.gateway_for(gateway_kind).verify(&reference).await {
            Ok(result) => result,
            Err(e) => {
                // No response is never success; the queue retries with backoff.
                self.enqueue_recheck(&row).await?;
                return Err(e);
            }
        };

        let detail =
            serde_json::to_value(&result).map_err(|e| PaymentError::Internal(e.into()))?;

        if result.success && result.amount_paisa != row.amount_paisa {
            self.contributions_repo
                .mark_needs_review(contribution_id, detail)
                .await
                .map_err(PaymentError::Internal)?;
            tracing::warn!(%contribution_id, reported = result.amount_paisa, expected = row.amount_paisa,
                "amount mismatch, contribution flagged for review");
            return Err(PaymentError::VerificationMismatch(format!(
                "gateway reported {} paisa, ledger holds {}",
                result.amount_paisa, row.amount_paisa
            )));
        }

        let credited = match result.status {
            ContributionStatus::Completed => {
                let credited = self
                    .contributions_repo
                    .credit_if_uncredited(contribution_id, result.reference_id.as_deref(), detail)
                    .await
                    .map_err(PaymentError::Internal)?;
                self.verification_repo
                    .mark_confirmed(contribution_id, serde_json::to_value(&result).unwrap_or_default())
                    .await
                    .map_err(PaymentError::Internal)?;
                if credited {
                    tracing::info!(%contribution_id, supporter = %row.supporter_id,
                        creator = %row.creator_id, "contribution credited");
                }
                credited
            }
            ContributionStatus::Pending | ContributionStatus::Initiated => {
                self.contributions_repo
                    .mark_status(contribution_id, ContributionStatus::Pending, None, detail)
                    .await
                    .map_err(PaymentError::Internal)?;
                self.enqueue_recheck(&row).await?;
                false
            }
            status => {
                self.contributions_repo
                    .mark_status(contribution_id, status, result.reference_id.as_deref(), detail)
                    .await
                    .map_err(PaymentError::Internal)?;
                self.verification_repo
                    .mark_confirmed(contribution_id, serde_json::to_value(&result).unwrap_or_default())
                    .await
                    .map_err(PaymentError::Internal)?;
                tracing::info!(%contribution_id, status = status.as_str(), "contribution closed without credit");
                false
            }
        };

        Ok(ConfirmOutcome {
            contribution_id,
            status: result.status,
            credited,
            reference_id: result.reference_id,
        })
    }

    async fn enqueue_recheck(&self, row: &StoredContribution) -> Result<(), PaymentError> {
        self.verification_repo
            .enqueue(
                row.contribution_id,
                &row.gateway,
                chrono::Utc::now() + chrono::Duration::minutes(RECHECK_DELAY_MINUTES),
            )
            .await
            .map_err(PaymentError::Internal)
    }
}

fn verification_ref(
    row: &StoredContribution,
    gateway: Gateway,
) -> Result<VerificationRef, PaymentError> {
    match gateway {
        Gateway::Esewa => Ok(VerificationRef::Esewa {
            transaction_uuid: row.contribution_id.to_string(),
            total_amount_paisa: row.amount_paisa,
        }),
        Gateway::Khalti => row
            .gateway_ref
            .clone()
            .map(|pidx| VerificationRef::Khalti { pidx })
            .ok_or_else(|| PaymentError::gateway("khalti contribution has no pidx recorded")),
    }
}
