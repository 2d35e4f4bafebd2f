//! Signed identity token verification.
//!
//! Accepts HS256 tokens signed with a shared secret, or RS256 tokens signed by
//! an identity provider whose public key is configured in PEM form. `exp` is
//! always enforced; `iss` and `aud` are enforced when configured.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use parlor_core::error::AuthError;
use parlor_core::identity::{IdentityVerifier, VerifiedUser};
use serde::Deserialize;
use tracing::debug;

/// Claims read from an identity token.
#[derive(Debug, Deserialize)]
pub struct IdentityClaims {
    #[serde(default)]
    pub sub: Option<String>,
    /// Some identity providers carry the stable uid here instead of `sub`.
    #[serde(default)]
    pub user_id: Option<String>,
    pub exp: u64,
    #[serde(default)]
    pub email: Option<String>,
}

impl IdentityClaims {
    fn subject(&self) -> Option<&str> {
        self.user_id
            .as_deref()
            .or(self.sub.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}

/// Verifies signed identity tokens with a fixed key.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// HS256 verifier with a shared secret.
    pub fn hs256(secret: &str) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::Misconfigured("JWT secret is empty".into()));
        }
        Ok(Self::with_key(
            DecodingKey::from_secret(secret.as_bytes()),
            Algorithm::HS256,
        ))
    }

    /// RS256 verifier from a PEM-encoded public key.
    pub fn rs256_pem(pem: &[u8]) -> Result<Self, AuthError> {
        let key = DecodingKey::from_rsa_pem(pem)
            .map_err(|e| AuthError::Misconfigured(format!("Invalid RSA public key: {e}")))?;
        Ok(Self::with_key(key, Algorithm::RS256))
    }

    fn with_key(key: DecodingKey, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        validation.validate_aud = false;
        Self { key, validation }
    }

    /// Require the `iss` claim to match.
    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.validation.set_issuer(&[issuer]);
        self
    }

    /// Require the `aud` claim to match.
    pub fn with_audience(mut self, audience: &str) -> Self {
        self.validation.set_audience(&[audience]);
        self.validation.validate_aud = true;
        self
    }

    /// Decode and validate a token, returning its claims.
    pub fn validate(&self, token: &str) -> Result<IdentityClaims, AuthError> {
        let data = decode::<IdentityClaims>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Ok(data.claims)
    }
}

#[async_trait]
impl IdentityVerifier for JwtVerifier {
    fn name(&self) -> &str {
        "jwt"
    }

    async fn verify(&self, token: &str) -> Result<VerifiedUser, AuthError> {
        let claims = self.validate(token)?;
        let Some(subject) = claims.subject() else {
            return Err(AuthError::InvalidToken("token carries no subject".into()));
        };

        debug!(owner = subject, "Identity token verified");
        Ok(VerifiedUser {
            email: claims.email.clone(),
            ..VerifiedUser::new(subject)
        })
    }
}
