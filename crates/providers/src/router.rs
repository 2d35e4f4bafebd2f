//! Provider selection — builds the configured text-generation backend.

use std::sync::Arc;

use parlor_config::ProviderConfig;
use parlor_core::provider::Provider;
use tracing::info;

use crate::gemini::{DEFAULT_BASE_URL, GeminiProvider};
use crate::openai_compat::OpenAiCompatProvider;

/// Build the provider named by `config.kind`.
pub fn build_from_config(config: &ProviderConfig) -> Arc<dyn Provider> {
    let api_key = config.api_key.clone().unwrap_or_default();

    let provider: Arc<dyn Provider> = match config.kind.as_str() {
        "openai" => {
            let base_url = config
                .api_url
                .clone()
                .unwrap_or_else(|| "https://api.openai.com/v1".into());
            Arc::new(OpenAiCompatProvider::new(
                "openai",
                base_url,
                api_key,
                config.timeout_secs,
            ))
        }
        _ => {
            let base_url = config
                .api_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.into());
            Arc::new(GeminiProvider::with_base_url(
                base_url,
                api_key,
                config.timeout_secs,
            ))
        }
    };

    info!(provider = provider.name(), model = %config.model, "Text-generation provider ready");
    provider
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_gemini() {
        let provider = build_from_config(&ProviderConfig::default());
        assert_eq!(provider.name(), "gemini");
    }

    #[test]
    fn openai_kind_builds_compat_provider() {
        let config = ProviderConfig {
            kind: "openai".into(),
            ..ProviderConfig::default()
        };
        assert_eq!(build_from_config(&config).name(), "openai");
    }
}
