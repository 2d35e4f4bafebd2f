//! Identity Verifier trait — maps an opaque bearer token to a stable user id.
//!
//! Implementations: signed JWT verification, static token table (dev/tests).
//! Callers must never learn *why* a token was rejected; every failure is
//! reported to the client the same way.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Stable identifier of a verified caller, as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The result of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedUser {
    pub user_id: OwnerId,
    /// Email claim, when the identity provider supplies one
    pub email: Option<String>,
}

impl VerifiedUser {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: OwnerId(user_id.into()),
            email: None,
        }
    }
}

/// The core IdentityVerifier trait.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// A human-readable name for this verifier (e.g., "jwt", "static").
    fn name(&self) -> &str;

    /// Verify a bearer token and return the caller's identity.
    async fn verify(&self, token: &str) -> std::result::Result<VerifiedUser, AuthError>;
}
