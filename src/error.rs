use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {var}: {value}")]
    InvalidVar { var: &'static str, value: String },
    #[error("secret key for {0} is empty")]
    EmptySecret(&'static str),
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),
    #[error("{0}")]
    Validation(String),
    #[error("gateway error: {0}")]
    Gateway(String),
    #[error("verification mismatch: {0}")]
    VerificationMismatch(String),
    #[error("rate limit exceeded")]
    RateLimitExceeded,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PaymentError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn gateway(msg: impl Into<String>) -> Self {
        Self::Gateway(msg.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIG_ERROR",
            Self::Validation(_) => "INVALID_REQUEST",
            Self::Gateway(_) => "GATEWAY_ERROR",
            Self::VerificationMismatch(_) => "VERIFICATION_MISMATCH",
            Self::RateLimitExceeded => "RATE_LIMITED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Configuration(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Gateway(_) => StatusCode::BAD_GATEWAY,
            Self::VerificationMismatch(_) => StatusCode::CONFLICT,
            Self::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            error: ErrorPayload {
                code: code.to_string(),
                message: message.to_string(),
                details: None,
            },
        }
    }
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        let envelope = ErrorEnvelope::new(self.code(), &self.to_string());
        (self.status(), Json(envelope)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_taxonomy_to_status_codes() {
        assert_eq!(PaymentError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(PaymentError::gateway("x").status(), StatusCode::BAD_GATEWAY);
        assert_eq!(PaymentError::RateLimitExceeded.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            PaymentError::VerificationMismatch("amount".to_string()).status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn gateway_errors_never_read_as_success_codes() {
        let err = PaymentError::gateway("lookup failed");
        assert!(!err.status().is_success());
        assert_eq!(err.code(), "GATEWAY_ERROR");
    }
}
