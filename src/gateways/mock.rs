use crate::domain::contribution::{ContributionStatus, PaymentIntent};
use crate::domain::verification::VerificationResult;
use crate::error::PaymentError;
use crate::gateways::{InitiationOutcome, RedirectInstruction, SupportGateway, VerificationRef};
use uuid::Uuid;

/// Behavior-scripted gateway for tests.
pub struct MockGateway {
    pub behavior: String,
}

#[async_trait::async_trait]
impl SupportGateway for MockGateway {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn initiate(
        &self,
        _intent: &PaymentIntent,
        contribution_id: Uuid,
    ) -> Result<InitiationOutcome, PaymentError> {
        if self.behavior == "INITIATE_UNAVAILABLE" {
            return Err(PaymentError::gateway("mock gateway unavailable"));
        }

        Ok(InitiationOutcome {
            redirect: RedirectInstruction::Url {
                payment_url: format!("mock://pay/{contribution_id}"),
            },
            gateway_ref: Some(format!("mock_{contribution_id}")),
        })
    }

    async fn verify(
        &self,
        reference: &VerificationRef,
    ) -> Result<VerificationResult, PaymentError> {
        let amount_paisa = match reference {
            VerificationRef::Esewa {
                total_amount_paisa, ..
            } => *total_amount_paisa,
            VerificationRef::Khalti { .. } => 0,
        };

        let status = match self.behavior.as_str() {
            "ALWAYS_CANCELED" => ContributionStatus::Canceled,
            "ALWAYS_PENDING" => ContributionStatus::Pending,
            "LOOKUP_UNAVAILABLE" => {
                return Err(PaymentError::gateway("mock lookup unavailable"))
            }
            _ => ContributionStatus::Completed,
        };

        Ok(VerificationResult::from_status(
            status,
            Some("mock_ref".to_string()),
            amount_paisa,
            None,
        ))
    }
}
