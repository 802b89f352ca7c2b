use crate::error::PaymentError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gateway {
    Esewa,
    Khalti,
}

impl Gateway {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Esewa => "esewa",
            Self::Khalti => "khalti",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "esewa" => Some(Self::Esewa),
            "khalti" => Some(Self::Khalti),
            _ => None,
        }
    }
}

/// A supporter's intended contribution, immutable once handed to a gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub amount_paisa: i64,
    pub creator_id: String,
    pub supporter_id: String,
    pub message: Option<String>,
    pub tier_level: Option<i32>,
}

pub fn validate_intent(intent: &PaymentIntent) -> Result<(), PaymentError> {
    if intent.amount_paisa <= 0 {
        return Err(PaymentError::validation("amount_paisa must be > 0"));
    }
    if intent.creator_id.trim().is_empty() {
        return Err(PaymentError::validation("creator_id is required"));
    }
    if intent.supporter_id.trim().is_empty() {
        return Err(PaymentError::validation("supporter_id is required"));
    }
    Ok(())
}

/// Initiated -> Pending -> { Completed | Refunded | Expired | Canceled }.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContributionStatus {
    Initiated,
    Pending,
    Completed,
    Refunded,
    Expired,
    Canceled,
}

impl ContributionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initiated => "INITIATED",
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Refunded => "REFUNDED",
            Self::Expired => "EXPIRED",
            Self::Canceled => "CANCELED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "INITIATED" => Some(Self::Initiated),
            "PENDING" => Some(Self::Pending),
            "COMPLETED" => Some(Self::Completed),
            "REFUNDED" => Some(Self::Refunded),
            "EXPIRED" => Some(Self::Expired),
            "CANCELED" => Some(Self::Canceled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Initiated | Self::Pending)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateContributionRequest {
    pub gateway: Gateway,
    pub amount_paisa: i64,
    pub creator_id: String,
    pub supporter_id: String,
    pub message: Option<String>,
    pub tier_level: Option<i32>,
}

impl CreateContributionRequest {
    pub fn into_intent(self) -> PaymentIntent {
        PaymentIntent {
            amount_paisa: self.amount_paisa,
            creator_id: self.creator_id,
            supporter_id: self.supporter_id,
            message: self.message,
            tier_level: self.tier_level,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InitiateContributionResponse {
    pub contribution_id: Uuid,
    pub gateway: Gateway,
    pub status: ContributionStatus,
    pub redirect: crate::gateways::RedirectInstruction,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfirmOutcome {
    pub contribution_id: Uuid,
    pub status: ContributionStatus,
    pub credited: bool,
    pub reference_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(amount_paisa: i64) -> PaymentIntent {
        PaymentIntent {
            amount_paisa,
            creator_id: "c1".to_string(),
            supporter_id: "s1".to_string(),
            message: None,
            tier_level: None,
        }
    }

    #[test]
    fn rejects_non_positive_amounts() {
        assert!(validate_intent(&intent(0)).is_err());
        assert!(validate_intent(&intent(-500)).is_err());
        assert!(validate_intent(&intent(1)).is_ok());
    }

    #[test]
    fn rejects_blank_identifiers() {
        let mut i = intent(100);
        i.creator_id = "  ".to_string();
        assert!(validate_intent(&i).is_err());

        let mut i = intent(100);
        i.supporter_id = String::new();
        assert!(validate_intent(&i).is_err());
    }

    #[test]
    fn only_initiated_and_pending_are_non_terminal() {
        assert!(!ContributionStatus::Initiated.is_terminal());
        assert!(!ContributionStatus::Pending.is_terminal());
        for s in [
            ContributionStatus::Completed,
            ContributionStatus::Refunded,
            ContributionStatus::Expired,
            ContributionStatus::Canceled,
        ] {
            assert!(s.is_terminal());
        }
    }

    #[test]
    fn status_round_trips_through_storage_string() {
        for s in [
            ContributionStatus::Initiated,
            ContributionStatus::Pending,
            ContributionStatus::Completed,
            ContributionStatus::Refunded,
            ContributionStatus::Expired,
            ContributionStatus::Canceled,
        ] {
            assert_eq!(ContributionStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(ContributionStatus::parse("NEEDS_REVIEW"), None);
    }
}
