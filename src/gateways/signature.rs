use crate::error::{ConfigError, PaymentError};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Ordered field set for a gateway signature. Field order and the exact
/// value strings are part of the gateway contract.
#[derive(Debug, Clone, Default)]
pub struct SignatureMaterial {
    fields: Vec<(&'static str, String)>,
}

impl SignatureMaterial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &'static str, value: impl Into<String>) {
        self.fields.push((name, value.into()));
    }

    /// Renders `"a=1,b=2,c=3"`, the string the digest is computed over.
    pub fn message(&self) -> String {
        self.fields
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Renders `"a,b,c"` for the `signed_field_names` declaration.
    pub fn field_names(&self) -> String {
        self.fields
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// HMAC-SHA256 over `message`, base64-encoded. Deterministic for a given
/// key/message pair. An empty secret is a configuration error, never an
/// empty-keyed digest.
pub fn sign(secret: &str, message: &str) -> Result<String, PaymentError> {
    if secret.is_empty() {
        return Err(ConfigError::EmptySecret("signature").into());
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| ConfigError::EmptySecret("signature"))?;
    mac.update(message.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}
