//! JWT Claims Inspection
//!
//! Reads the claims of a bearer token without verifying its signature. The
//! client never validates tokens itself; the backend does. Claims are only
//! used to describe a session locally (who, and until when).

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::models::ProviderUser;

/// Claims carried by the access tokens the backend issues
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// User unique identifier
    pub sub: String,
    /// User email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Token issued at timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Token expiration timestamp
    pub exp: i64,
}

impl Claims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    pub fn user(&self) -> ProviderUser {
        ProviderUser {
            id: self.sub.clone(),
            email: self.email.clone(),
        }
    }
}

/// Decode claims from a token without checking signature or expiry
pub fn peek_claims(token: &str) -> Result<Claims> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .context("Failed to decode access token claims")?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    #[test]
    fn peek_ignores_signature_and_expiry() {
        let claims = Claims {
            sub: "5b1c1f55-4ad4-4c5e-9a51-2a3f0b9d6c11".to_string(),
            email: Some("test@example.com".to_string()),
            iat: Some(1_600_000_000),
            exp: 1_600_003_600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"someone_elses_secret"),
        )
        .unwrap();

        let peeked = peek_claims(&token).unwrap();

        assert_eq!(peeked, claims);
        assert_eq!(peeked.expires_at().unwrap().timestamp(), 1_600_003_600);
        assert_eq!(peeked.user().email.as_deref(), Some("test@example.com"));
    }

    #[test]
    fn opaque_token_is_rejected() {
        assert!(peek_claims("not-a-jwt").is_err());
    }
}
