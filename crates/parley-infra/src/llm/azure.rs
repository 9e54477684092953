//! Azure OpenAI provider implementation.
//!
//! Azure is the "enterprise wiring" case: instead of a bare API key, the
//! client needs an explicit resource endpoint, API version, and
//! deployment id. The wire protocol is still OpenAI chat completions, so
//! request building and error mapping are shared with
//! [`super::openai_compat`].

use async_openai::config::AzureConfig;
use async_openai::Client;

use parley_core::llm::provider::LlmProvider;
use parley_types::llm::{CompletionRequest, CompletionResponse, LlmError};

use super::openai_compat::{build_chat_request, extract_response, map_openai_error};

/// Connection settings for an Azure OpenAI deployment.
pub struct AzureSettings {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    pub endpoint: String,
    /// API version, e.g. `2024-07-01-preview`.
    pub api_version: String,
    /// Deployment id serving the model.
    pub deployment: String,
    pub api_key: String,
}

/// Azure OpenAI provider.
///
/// Does NOT derive Debug: the API key lives inside the async-openai
/// client.
pub struct AzureOpenAiProvider {
    client: Client<AzureConfig>,
    deployment: String,
}

impl AzureOpenAiProvider {
    /// Create a new Azure provider with explicit client wiring.
    pub fn new(settings: AzureSettings) -> Self {
        let config = AzureConfig::new()
            .with_api_base(&settings.endpoint)
            .with_api_version(&settings.api_version)
            .with_deployment_id(&settings.deployment)
            .with_api_key(&settings.api_key);

        Self {
            client: Client::with_config(config),
            deployment: settings.deployment,
        }
    }
}

impl LlmProvider for AzureOpenAiProvider {
    fn name(&self) -> &str {
        "azure"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        // Azure routes by deployment id; the model field inside the body
        // is what the deployment serves.
        let oai_request = build_chat_request(self.deployment.clone(), request);

        let response = self
            .client
            .chat()
            .create(oai_request)
            .await
            .map_err(map_openai_error)?;

        Ok(extract_response(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_name_and_deployment() {
        let provider = AzureOpenAiProvider::new(AzureSettings {
            endpoint: "https://example.openai.azure.com".to_string(),
            api_version: "2024-07-01-preview".to_string(),
            deployment: "gpt-4o-mini-prod".to_string(),
            api_key: "azure-key".to_string(),
        });
        assert_eq!(provider.name(), "azure");
        assert_eq!(provider.deployment, "gpt-4o-mini-prod");
    }
}
