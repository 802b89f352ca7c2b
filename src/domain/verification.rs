use crate::domain::contribution::ContributionStatus;
use serde::Serialize;

/// Gateway-reported outcome normalized into the internal vocabulary.
/// `success` is derived from the status at construction so a non-completed
/// status can never read as success.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationResult {
    pub success: bool,
    pub status: ContributionStatus,
    pub reference_id: Option<String>,
    pub amount_paisa: i64,
    pub fee_paisa: Option<i64>,
    pub refunded: bool,
}

impl VerificationResult {
    pub fn from_status(
        status: ContributionStatus,
        reference_id: Option<String>,
        amount_paisa: i64,
        fee_paisa: Option<i64>,
    ) -> Self {
        Self {
            success: status == ContributionStatus::Completed,
            status,
            reference_id,
            amount_paisa,
            fee_paisa,
            refunded: status == ContributionStatus::Refunded,
        }
    }
}
