use std::collections::HashSet;

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use engine_core::{CredentialClaims, CredentialDecoder};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

// without a secret the payload is read unverified; the issuing API checks it
pub struct JwtDecoder {
    secret: Option<String>,
}

impl JwtDecoder {
    pub fn unverified() -> Self {
        Self { secret: None }
    }

    pub fn hs256(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(secret.into()),
        }
    }

    pub fn from_secret(secret: Option<&str>) -> Self {
        match secret {
            Some(s) if !s.is_empty() => Self::hs256(s),
            _ => Self::unverified(),
        }
    }

    fn decode_payload(token: &str) -> Result<CredentialClaims> {
        let parts: Vec<&str> = token.trim().split('.').collect();
        if parts.len() != 3 {
            return Err(anyhow!("expected 3 segments, got {}", parts.len()));
        }
        let payload = URL_SAFE_NO_PAD
            .decode(parts[1].trim_end_matches('='))
            .context("payload is not base64url")?;
        serde_json::from_slice(&payload).context("payload is not a claims object")
    }

    fn decode_verified(secret: &str, token: &str) -> Result<CredentialClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = true;
        let data = decode::<CredentialClaims>(
            token.trim(),
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .context("credential signature")?;
        Ok(data.claims)
    }
}

impl CredentialDecoder for JwtDecoder {
    fn decode(&self, token: &str) -> Result<CredentialClaims> {
        match &self.secret {
            Some(secret) => Self::decode_verified(secret, token),
            None => Self::decode_payload(token),
        }
    }
}
