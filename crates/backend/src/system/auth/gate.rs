use anyhow::Result;
use contracts::system::auth::{LoginResponse, TokenClaims};
use sha2::{Digest, Sha256};

use super::{jwt, password};
use crate::shared::config::AuthConfig;

enum Credential {
    /// SHA-256 of the plain shared password
    Plain([u8; 32]),
    /// Argon2 PHC string
    Hashed(String),
}

/// Single shared password in front of the dashboard
///
/// A correct password yields a bearer token signed with a per-process secret.
pub struct PasswordGate {
    credential: Credential,
    secret: String,
    session_hours: i64,
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}

impl PasswordGate {
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let credential = match (&config.password_hash, &config.password) {
            (Some(hash), _) if !hash.trim().is_empty() => Credential::Hashed(hash.trim().to_string()),
            (_, Some(plain)) if !plain.is_empty() => Credential::Plain(digest(plain)),
            _ => {
                return Err(anyhow::anyhow!(
                    "No dashboard password configured: set auth.password, auth.password_hash or DASHBOARD_PASSWORD"
                ))
            }
        };

        Ok(Self {
            credential,
            secret: jwt::generate_jwt_secret(),
            session_hours: config.session_hours,
        })
    }

    pub fn verify(&self, candidate: &str) -> bool {
        match &self.credential {
            Credential::Plain(expected) => digest(candidate) == *expected,
            Credential::Hashed(hash) => match password::verify_password(candidate, hash) {
                Ok(matches) => matches,
                Err(e) => {
                    tracing::error!("Configured password hash is unusable: {}", e);
                    false
                }
            },
        }
    }

    /// Check the password and open a session; `None` on a wrong password
    pub fn login(&self, candidate: &str) -> Result<Option<LoginResponse>> {
        if !self.verify(candidate) {
            return Ok(None);
        }
        let (access_token, expires_at) = jwt::generate_access_token(&self.secret, self.session_hours)?;
        Ok(Some(LoginResponse {
            access_token,
            expires_at,
        }))
    }

    pub fn validate(&self, token: &str) -> Result<TokenClaims> {
        jwt::validate_token(token, &self.secret)
    }
}
