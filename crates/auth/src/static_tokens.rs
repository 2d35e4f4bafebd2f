//! Fixed token table, for local development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use parlor_core::error::AuthError;
use parlor_core::identity::{IdentityVerifier, VerifiedUser};

/// Maps opaque bearer tokens to user ids.
pub struct StaticTokenVerifier {
    tokens: HashMap<String, String>,
}

impl StaticTokenVerifier {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }

    /// Add a single token (builder style).
    pub fn with_token(mut self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), user_id.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl IdentityVerifier for StaticTokenVerifier {
    fn name(&self) -> &str {
        "static"
    }

    async fn verify(&self, token: &str) -> Result<VerifiedUser, AuthError> {
        self.tokens
            .get(token)
            .map(VerifiedUser::new)
            .ok_or_else(|| AuthError::InvalidToken("unknown token".into()))
    }
}
