use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};

use super::AzureOpenAiError;
use super::types::{
    ApiErrorBody, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, DEFAULT_API_VERSION,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Clone)]
pub struct AzureOpenAiClient {
    client: reqwest::Client,
    endpoint: String,
    deployment: String,
    api_version: String,
}

impl AzureOpenAiClient {
    pub fn new(
        endpoint: String,
        api_key: String,
        deployment: String,
    ) -> Result<Self, AzureOpenAiError> {
        Self::builder(endpoint, api_key, deployment).build()
    }

    pub fn builder(
        endpoint: String,
        api_key: String,
        deployment: String,
    ) -> AzureOpenAiClientBuilder {
        AzureOpenAiClientBuilder {
            endpoint,
            api_key,
            deployment,
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }

    /// Sends one chat-completion request and returns the first choice's content.
    pub async fn chat_completion(
        &self,
        messages: &[ChatMessage],
    ) -> Result<String, AzureOpenAiError> {
        let request = ChatCompletionRequest {
            messages,
            temperature: 0.0,
        };

        let response = self
            .client
            .post(self.completions_url())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|body| body.error.message)
                .unwrap_or_else(|_| {
                    if text.trim().is_empty() {
                        status.canonical_reason().unwrap_or("Unknown error").to_string()
                    } else {
                        text
                    }
                });

            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    AzureOpenAiError::Auth { message }
                }
                _ => AzureOpenAiError::Api {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let body: ChatCompletionResponse =
            response
                .json()
                .await
                .map_err(|e| AzureOpenAiError::MalformedResponse {
                    message: format!("Failed to parse response: {}", e),
                })?;

        body.into_content()
            .ok_or_else(|| AzureOpenAiError::MalformedResponse {
                message: "response has no choices[0].message.content".to_string(),
            })
    }
}

impl std::fmt::Debug for AzureOpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureOpenAiClient")
            .field("endpoint", &self.endpoint)
            .field("deployment", &self.deployment)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

pub struct AzureOpenAiClientBuilder {
    endpoint: String,
    api_key: String,
    deployment: String,
    api_version: String,
    timeout: Duration,
}

impl AzureOpenAiClientBuilder {
    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<AzureOpenAiClient, AzureOpenAiError> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(&self.api_key).map_err(|_| AzureOpenAiError::Auth {
            message: "Invalid API key format".to_string(),
        })?;
        key.set_sensitive(true);
        headers.insert("api-key", key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(self.timeout)
            .build()
            .map_err(AzureOpenAiError::Network)?;

        Ok(AzureOpenAiClient {
            client,
            endpoint: self.endpoint.trim_end_matches('/').to_string(),
            deployment: self.deployment,
            api_version: self.api_version,
        })
    }
}
