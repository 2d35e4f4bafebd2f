//! Identity verification for Parlor.
//!
//! Provides:
//! - **JWT**: signed identity tokens (HS256 secret or RS256 public key)
//! - **Static tokens**: a fixed token table for development and tests

pub mod jwt;
pub mod static_tokens;

use std::sync::Arc;

use parlor_config::AuthConfig;
use parlor_core::error::AuthError;
use parlor_core::identity::IdentityVerifier;
use tracing::info;

pub use jwt::{IdentityClaims, JwtVerifier};
pub use static_tokens::StaticTokenVerifier;

/// Build the verifier named by `config.mode`.
pub fn build_from_config(config: &AuthConfig) -> Result<Arc<dyn IdentityVerifier>, AuthError> {
    let verifier: Arc<dyn IdentityVerifier> = match config.mode.as_str() {
        "static" => {
            if config.tokens.is_empty() {
                return Err(AuthError::Misconfigured(
                    "auth.mode = \"static\" requires at least one entry in auth.tokens".into(),
                ));
            }
            Arc::new(StaticTokenVerifier::new(config.tokens.clone()))
        }
        "jwt" => {
            let mut verifier = if let Some(path) = &config.public_key_pem {
                let pem = std::fs::read(path).map_err(|e| {
                    AuthError::Misconfigured(format!("Cannot read public key {path}: {e}"))
                })?;
                JwtVerifier::rs256_pem(&pem)?
            } else if let Some(secret) = &config.jwt_secret {
                JwtVerifier::hs256(secret)?
            } else {
                return Err(AuthError::Misconfigured(
                    "auth.mode = \"jwt\" requires auth.jwt_secret or auth.public_key_pem".into(),
                ));
            };

            if let Some(issuer) = &config.issuer {
                verifier = verifier.with_issuer(issuer);
            }
            if let Some(audience) = &config.audience {
                verifier = verifier.with_audience(audience);
            }
            Arc::new(verifier)
        }
        other => {
            return Err(AuthError::Misconfigured(format!(
                "Unknown auth mode '{other}'"
            )));
        }
    };

    info!(verifier = verifier.name(), "Identity verifier ready");
    Ok(verifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn jwt_mode_with_secret() {
        let config = AuthConfig {
            jwt_secret: Some("s3cret".into()),
            ..AuthConfig::default()
        };
        assert_eq!(build_from_config(&config).unwrap().name(), "jwt");
    }

    #[test]
    fn jwt_mode_without_key_fails() {
        assert!(matches!(
            build_from_config(&AuthConfig::default()),
            Err(AuthError::Misconfigured(_))
        ));
    }

    #[test]
    fn static_mode_requires_tokens() {
        let mut config = AuthConfig {
            mode: "static".into(),
            ..AuthConfig::default()
        };
        assert!(build_from_config(&config).is_err());

        config.tokens.insert("dev-token".into(), "dev-user".into());
        assert_eq!(build_from_config(&config).unwrap().name(), "static");
    }

    #[test]
    fn unreadable_public_key_fails() {
        let config = AuthConfig {
            public_key_pem: Some("/nonexistent/parlor/key.pem".into()),
            ..AuthConfig::default()
        };
        assert!(build_from_config(&config).is_err());
    }

    #[test]
    fn malformed_public_key_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not a key").unwrap();
        let config = AuthConfig {
            public_key_pem: Some(file.path().display().to_string()),
            ..AuthConfig::default()
        };
        assert!(matches!(
            build_from_config(&config),
            Err(AuthError::Misconfigured(_))
        ));
    }

    #[test]
    fn unknown_mode_fails() {
        let config = AuthConfig {
            mode: "saml".into(),
            ..AuthConfig::default()
        };
        assert!(build_from_config(&config).is_err());
    }
}
