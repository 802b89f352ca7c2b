use crate::config::EsewaConfig;
use crate::domain::contribution::{ContributionStatus, PaymentIntent};
use crate::domain::verification::VerificationResult;
use crate::error::PaymentError;
use crate::gateways::signature::{sign, SignatureMaterial};
use crate::gateways::{
    FormField, InitiationOutcome, RedirectInstruction, SupportGateway, VerificationRef,
};
use crate::money::format_rupees;
use serde::Deserialize;
use uuid::Uuid;

pub struct EsewaGateway {
    pub config: EsewaConfig,
    pub success_url: String,
    pub failure_url: String,
    pub client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
pub struct EsewaStatusResponse {
    pub product_code: String,
    pub transaction_uuid: String,
    pub total_amount: f64,
    pub status: String,
    pub ref_id: Option<String>,
}

/// eSewa's transaction-status vocabulary. `AMBIGUOUS` stays pending and is
/// re-checked; `NOT_FOUND` means the transaction lapsed before the gateway
/// recorded it.
pub fn map_status(status: &str) -> Option<ContributionStatus> {
    match status {
        "COMPLETE" => Some(ContributionStatus::Completed),
        "PENDING" | "AMBIGUOUS" => Some(ContributionStatus::Pending),
        "FULL_REFUND" | "PARTIAL_REFUND" => Some(ContributionStatus::Refunded),
        "NOT_FOUND" => Some(ContributionStatus::Expired),
        "CANCELED" => Some(ContributionStatus::Canceled),
        _ => None,
    }
}

impl EsewaGateway {
    /// ePay v2 form construction. The signed message covers exactly
    /// `total_amount,transaction_uuid,product_code`, in that order, using
    /// the same strings that go into the form.
    pub fn build_form(
        &self,
        intent: &PaymentIntent,
        contribution_id: Uuid,
    ) -> Result<(String, Vec<FormField>), PaymentError> {
        let total_amount = format_rupees(intent.amount_paisa);
        let transaction_uuid = contribution_id.to_string();

        let mut material = SignatureMaterial::new();
        material.push("total_amount", total_amount.clone());
        material.push("transaction_uuid", transaction_uuid.clone());
        material.push("product_code", self.config.product_code.clone());
        let signature = sign(&self.config.secret_key, &material.message())?;

        let fields = vec![
            field("amount", total_amount.clone()),
            field("tax_amount", "0"),
            field("total_amount", total_amount),
            field("transaction_uuid", transaction_uuid),
            field("product_code", self.config.product_code.clone()),
            field("product_service_charge", "0"),
            field("product_delivery_charge", "0"),
            // The gateway appends its own query string on redirect, so the
            // correlation id rides in the path.
            field("success_url", format!("{}/{}", self.success_url, contribution_id)),
            field("failure_url", format!("{}/{}", self.failure_url, contribution_id)),
            field("signed_field_names", material.field_names()),
            field("signature", signature),
        ];

        Ok((self.config.form_url.clone(), fields))
    }
}

fn field(name: &str, value: impl Into<String>) -> FormField {
    FormField {
        name: name.to_string(),
        value: value.into(),
    }
}

#[async_trait::async_trait]
impl SupportGateway for EsewaGateway {
    fn name(&self) -> &'static str {
        "esewa"
    }

    async fn initiate(
        &self,
        intent: &PaymentIntent,
        contribution_id: Uuid,
    ) -> Result<InitiationOutcome, PaymentError> {
        let (action_url, fields) = self.build_form(intent, contribution_id)?;
        Ok(InitiationOutcome {
            redirect: RedirectInstruction::Form { action_url, fields },
            gateway_ref: None,
        })
    }

    async fn verify(
        &self,
        reference: &VerificationRef,
    ) -> Result<VerificationResult, PaymentError> {
        let (transaction_uuid, total_amount_paisa) = match reference {
            VerificationRef::Esewa {
                transaction_uuid,
                total_amount_paisa,
            } => (transaction_uuid, *total_amount_paisa),
            VerificationRef::Khalti { .. } => {
                return Err(PaymentError::gateway("khalti reference sent to esewa"))
            }
        };

        let total_amount = format_rupees(total_amount_paisa);
        let resp = self
            .client
            .get(&self.config.status_url)
            .query(&[
                ("product_code", self.config.product_code.as_str()),
                ("total_amount", total_amount.as_str()),
                ("transaction_uuid", transaction_uuid.as_str()),
            ])
            .timeout(std::time::Duration::from_millis(self.config.timeout_ms))
            .send()
            .await;

        let resp = match resp {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                return Err(PaymentError::gateway(format!(
                    "esewa status check returned HTTP_{}",
                    r.status().as_u16()
                )))
            }
            Err(e) if e.is_timeout() => {
                return Err(PaymentError::gateway("esewa status check timed out"))
            }
            Err(e) => return Err(PaymentError::gateway(format!("esewa status check: {e}"))),
        };

        let body: EsewaStatusResponse = resp
            .json()
            .await
            .map_err(|e| PaymentError::gateway(format!("malformed esewa status body: {e}")))?;

        let status = map_status(&body.status)
            .ok_or_else(|| PaymentError::gateway(format!("unknown esewa status {}", body.status)))?;

        Ok(VerificationResult::from_status(
            status,
            body.ref_id,
            (body.total_amount * 100.0).round() as i64,
            None,
        ))
    }
}
