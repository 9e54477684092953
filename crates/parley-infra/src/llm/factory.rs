//! Provider construction from bot configuration.

use secrecy::SecretString;
use tracing::debug;

use parley_core::agent::invoker::ProviderFactory;
use parley_core::llm::box_provider::BoxLlmProvider;
use parley_types::bot::{BotConfig, ProviderSettings};
use parley_types::error::BotError;

use super::anthropic::AnthropicProvider;
use super::azure::{AzureOpenAiProvider, AzureSettings};
use super::openai_compat::config::OpenAiCompatConfig;
use super::openai_compat::OpenAiCompatibleProvider;

/// Constructs the right provider backend for a bot's typed settings.
///
/// This is the single dispatch point from configuration to client:
/// adding a provider means adding a [`ProviderSettings`] variant and an
/// arm here.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultProviderFactory;

impl ProviderFactory for DefaultProviderFactory {
    fn construct(&self, config: &BotConfig) -> Result<BoxLlmProvider, BotError> {
        let settings = config.provider_settings()?;
        debug!(bot = %config.name, provider = %config.provider, "Constructing provider");

        let provider = match settings {
            ProviderSettings::OpenAi { api_key, base_url } => match base_url {
                Some(base_url) => BoxLlmProvider::new(OpenAiCompatibleProvider::new(
                    OpenAiCompatConfig {
                        provider_name: "openai".into(),
                        base_url,
                        api_key,
                        model: config.model.clone(),
                    },
                )),
                None => {
                    BoxLlmProvider::new(OpenAiCompatibleProvider::openai(&api_key, &config.model))
                }
            },
            ProviderSettings::Deepseek { api_key, base_url } => match base_url {
                Some(base_url) => BoxLlmProvider::new(OpenAiCompatibleProvider::new(
                    OpenAiCompatConfig {
                        provider_name: "deepseek".into(),
                        base_url,
                        api_key,
                        model: config.model.clone(),
                    },
                )),
                None => {
                    BoxLlmProvider::new(OpenAiCompatibleProvider::deepseek(&api_key, &config.model))
                }
            },
            ProviderSettings::Azure {
                api_key,
                endpoint,
                api_version,
                deployment,
            } => BoxLlmProvider::new(AzureOpenAiProvider::new(AzureSettings {
                endpoint,
                api_version,
                deployment,
                api_key,
            })),
            ProviderSettings::Anthropic { api_key } => BoxLlmProvider::new(AnthropicProvider::new(
                SecretString::from(api_key),
                config.model.clone(),
            )),
        };

        Ok(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::bot::ProviderKind;
    use parley_types::id::BotId;
    use serde_json::json;

    fn config(provider: ProviderKind) -> BotConfig {
        BotConfig {
            bot_id: BotId::new(),
            name: "assistant_bot".to_string(),
            display_name: "Assistant".to_string(),
            model: "gpt-4o-mini".to_string(),
            provider,
            system_prompt: None,
            temperature: 0.7,
            max_tokens: 1000,
            api_key: Some("sk-test".to_string()),
            api_base_url: None,
            extra: None,
        }
    }

    #[test]
    fn test_openai_construction() {
        let provider = DefaultProviderFactory.construct(&config(ProviderKind::OpenAi)).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_deepseek_construction() {
        let provider = DefaultProviderFactory
            .construct(&config(ProviderKind::Deepseek))
            .unwrap();
        assert_eq!(provider.name(), "deepseek");
    }

    #[test]
    fn test_anthropic_construction() {
        let provider = DefaultProviderFactory
            .construct(&config(ProviderKind::Anthropic))
            .unwrap();
        assert_eq!(provider.name(), "anthropic");
    }

    #[test]
    fn test_azure_construction_needs_endpoint() {
        let err = DefaultProviderFactory
            .construct(&config(ProviderKind::Azure))
            .unwrap_err();
        assert!(matches!(err, BotError::InvalidProviderConfig(_)));

        let mut with_endpoint = config(ProviderKind::Azure);
        with_endpoint.extra = Some(json!({"azure_endpoint": "https://x.openai.azure.com"}));
        let provider = DefaultProviderFactory.construct(&with_endpoint).unwrap();
        assert_eq!(provider.name(), "azure");
    }

    #[test]
    fn test_missing_api_key_is_a_construction_error() {
        let mut config = config(ProviderKind::OpenAi);
        config.api_key = None;
        let err = DefaultProviderFactory.construct(&config).unwrap_err();
        assert!(matches!(err, BotError::MissingApiKey(ProviderKind::OpenAi)));
    }
}
