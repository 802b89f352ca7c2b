use crate::domain::contribution::PaymentIntent;
use crate::domain::verification::VerificationResult;
use crate::error::PaymentError;
use serde::Serialize;
use uuid::Uuid;

pub mod esewa;
pub mod khalti;
pub mod mock;
pub mod signature;

#[derive(Debug, Clone, Serialize)]
pub struct FormField {
    pub name: String,
    pub value: String,
}

/// How the supporter's browser reaches the gateway: a signed form post
/// (eSewa) or a hosted payment page (Khalti).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RedirectInstruction {
    Form {
        action_url: String,
        fields: Vec<FormField>,
    },
    Url {
        payment_url: String,
    },
}

#[derive(Debug, Clone)]
pub struct InitiationOutcome {
    pub redirect: RedirectInstruction,
    /// Gateway-issued correlation handle (Khalti's `pidx`); eSewa correlates
    /// purely on our transaction uuid.
    pub gateway_ref: Option<String>,
}

/// Everything needed to ask a gateway about one transaction.
#[derive(Debug, Clone)]
pub enum VerificationRef {
    Esewa {
        transaction_uuid: String,
        total_amount_paisa: i64,
    },
    Khalti {
        pidx: String,
    },
}

#[async_trait::async_trait]
pub trait SupportGateway: Send + Sync {
    fn name(&self) -> &'static str;

    async fn initiate(
        &self,
        intent: &PaymentIntent,
        contribution_id: Uuid,
    ) -> Result<InitiationOutcome, PaymentError>;

    async fn verify(&self, reference: &VerificationRef)
        -> Result<VerificationResult, PaymentError>;
}
