//! OpenAI chat-completions provider implementation.

use crate::client::ApiClient;
use crate::retry::RetryConfig;
use advisor_types::provider::{ChatProvider, CompletionFuture};
use advisor_types::{ApiError, ChatCompletionRequest};

/// OpenAI-compatible provider.
///
/// Wraps `ApiClient` and implements `ChatProvider`. Retry logic stays in
/// `ApiClient`.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: ApiClient,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, ApiError> {
        Ok(Self {
            client: ApiClient::new(api_key, base_url)?,
        })
    }

    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.client = self.client.with_retry_config(config);
        self
    }
}

impl ChatProvider for OpenAiProvider {
    fn complete<'a>(&'a self, request: &'a ChatCompletionRequest) -> CompletionFuture<'a> {
        Box::pin(self.client.complete(request))
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_provider_new() {
        let provider = OpenAiProvider::new("test-key", "https://api.example.com");
        assert!(provider.is_ok());
    }

    #[test]
    fn openai_provider_name() {
        let provider = OpenAiProvider::new("test-key", "https://api.example.com")
            .unwrap()
            .with_retry_config(RetryConfig::with_max_retries(2));
        assert_eq!(provider.name(), "openai");
    }
}
