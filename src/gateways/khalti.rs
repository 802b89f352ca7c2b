use crate::config::KhaltiConfig;
use crate::domain::contribution::{ContributionStatus, PaymentIntent};
use crate::domain::verification::VerificationResult;
use crate::error::PaymentError;
use crate::gateways::{InitiationOutcome, RedirectInstruction, SupportGateway, VerificationRef};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

pub struct KhaltiGateway {
    pub config: KhaltiConfig,
    pub return_url: String,
    pub website_url: String,
    pub client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
pub struct KhaltiInitiateResponse {
    pub pidx: String,
    pub payment_url: String,
}

#[derive(Debug, Deserialize)]
pub struct KhaltiLookupResponse {
    pub pidx: String,
    pub total_amount: i64,
    pub status: String,
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub fee: i64,
    #[serde(default)]
    pub refunded: bool,
}

/// Khalti ePayment lookup vocabulary.
pub fn map_status(status: &str) -> Option<ContributionStatus> {
    match status {
        "Completed" => Some(ContributionStatus::Completed),
        "Pending" => Some(ContributionStatus::Pending),
        "Initiated" => Some(ContributionStatus::Initiated),
        "Refunded" | "Partially Refunded" => Some(ContributionStatus::Refunded),
        "Expired" => Some(ContributionStatus::Expired),
        "User canceled" => Some(ContributionStatus::Canceled),
        _ => None,
    }
}

impl KhaltiGateway {
    fn auth_header(&self) -> String {
        format!("Key {}", self.config.secret_key)
    }
}

#[async_trait::async_trait]
impl SupportGateway for KhaltiGateway {
    fn name(&self) -> &'static str {
        "khalti"
    }

    async fn initiate(
        &self,
        intent: &PaymentIntent,
        contribution_id: Uuid,
    ) -> Result<InitiationOutcome, PaymentError> {
        let body = json!({
            "return_url": format!("{}/{}", self.return_url, contribution_id),
            "website_url": self.website_url,
            "amount": intent.amount_paisa,
            "purchase_order_id": contribution_id.to_string(),
            "purchase_order_name": format!("support-{}", intent.creator_id),
        });

        let resp = self
            .client
            .post(format!("{}/epayment/initiate/", self.config.base_url))
            .header("Authorization", self.auth_header())
            .json(&body)
            .timeout(std::time::Duration::from_millis(self.config.timeout_ms))
            .send()
            .await;

        let resp = match resp {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                let status = r.status();
                let detail = r.text().await.unwrap_or_default();
                return Err(PaymentError::gateway(format!(
                    "khalti initiate returned HTTP_{}: {}",
                    status.as_u16(),
                    detail.chars().take(200).collect::<String>()
                )));
            }
            Err(e) if e.is_timeout() => {
                return Err(PaymentError::gateway("khalti initiate timed out"))
            }
            Err(e) => return Err(PaymentError::gateway(format!("khalti initiate: {e}"))),
        };

        let body: KhaltiInitiateResponse = resp
            .json()
            .await
            .map_err(|e| PaymentError::gateway(format!("malformed khalti initiate body: {e}")))?;

        Ok(InitiationOutcome {
            redirect: RedirectInstruction::Url {
                payment_url: body.payment_url,
            },
            gateway_ref: Some(body.pidx),
        })
    }

    async fn verify(
        &self,
        reference: &VerificationRef,
    ) -> Result<VerificationResult, PaymentError> {
        let pidx = match reference {
            VerificationRef::Khalti { pidx } => pidx,
            VerificationRef::Esewa { .. } => {
                return Err(PaymentError::gateway("esewa reference sent to khalti"))
            }
        };

        let resp = self
            .client
            .post(format!("{}/epayment/lookup/", self.config.base_url))
            .header("Authorization", self.auth_header())
            .json(&json!({ "pidx": pidx }))
            .timeout(std::time::Duration::from_millis(self.config.timeout_ms))
            .send()
            .await;

        let resp = match resp {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                return Err(PaymentError::gateway(format!(
                    "khalti lookup returned HTTP_{}",
                    r.status().as_u16()
                )))
            }
            Err(e) if e.is_timeout() => {
                return Err(PaymentError::gateway("khalti lookup timed out"))
            }
            Err(e) => return Err(PaymentError::gateway(format!("khalti lookup: {e}"))),
        };

        let body: KhaltiLookupResponse = resp
            .json()
            .await
            .map_err(|e| PaymentError::gateway(format!("malformed khalti lookup body: {e}")))?;

        let status = map_status(&body.status).ok_or_else(|| {
            PaymentError::gateway(format!("unknown khalti status {}", body.status))
        })?;

        Ok(VerificationResult::from_status(
            status,
            body.transaction_id.or(Some(body.pidx)),
            body.total_amount,
            Some(body.fee),
        ))
    }
}
