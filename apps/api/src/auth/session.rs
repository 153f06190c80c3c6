//! Clerk session token verification.

use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::user::UserProfile;

/// Claims read from a Clerk session token. Clerk only includes `email` and `name`
/// when the instance's session template adds them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub exp: i64,
}

impl SessionClaims {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            clerk_id: self.sub.clone(),
            email: self.email.clone().unwrap_or_default(),
            name: self.name.clone().filter(|n| !n.trim().is_empty()),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid session verification key: {0}")]
    InvalidKey(jsonwebtoken::errors::Error),

    #[error("session token expired")]
    Expired,

    #[error("invalid session token: {0}")]
    Invalid(String),
}

pub struct SessionVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl SessionVerifier {
    /// A PEM block selects RS256 (Clerk's JWKS public key); anything else is treated
    /// as an HS256 shared secret.
    pub fn from_config_key(key: &str) -> Result<Self, SessionError> {
        let key = key.trim();
        let (key, algorithm) = if key.starts_with("-----BEGIN") {
            // .env files often carry the PEM on one line with literal "\n".
            let pem = key.replace("\\n", "\n");
            let decoded =
                DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(SessionError::InvalidKey)?;
            (decoded, Algorithm::RS256)
        } else {
            (DecodingKey::from_secret(key.as_bytes()), Algorithm::HS256)
        };

        let mut validation = Validation::new(algorithm);
        // Clerk session tokens carry `azp`, not `aud`.
        validation.validate_aud = false;

        Ok(Self { key, validation })
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, SessionError> {
        let data = decode::<SessionClaims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => SessionError::Expired,
                _ => SessionError::Invalid(e.to_string()),
            }
        })?;

        if data.claims.sub.trim().is_empty() {
            return Err(SessionError::Invalid("missing subject".to_string()));
        }
        Ok(data.claims)
    }
}
