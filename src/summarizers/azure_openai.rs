mod client;
mod error;
mod types;

pub use client::{AzureOpenAiClient, AzureOpenAiClientBuilder};
pub use error::AzureOpenAiError;
pub use types::{ChatMessage, DEFAULT_API_VERSION, Role};

use async_trait::async_trait;

use super::{ChunkRequest, Summarizer, SummarizerConfig, SummarizerError};

const SYSTEM_PROMPT: &str = "You summarise Terraform plan output for a change report. \
Reply only with HTML table rows, one <tr> per changed resource, each with exactly seven <td> cells in this order: \
Stage, Environment, Location, Resource Name, Change (create, update, delete or no-op), Tags Only (Yes or No), Details. \
Use the stage and environment you are given. Use uksouth when the plan shows no location. \
Resource Name is the last segment of the resource address, or its for_each key when it has one. \
Tags Only is Yes only for updates whose sole changes are tags; Details is then exactly \"tags updated\". \
Keep Details under 200 characters. Never repeat a resource listed as already reported.";

pub fn build_messages(request: &ChunkRequest<'_>) -> Vec<ChatMessage> {
    let already = if request.already_emitted.is_empty() {
        "(none)".to_string()
    } else {
        request.already_emitted.join(", ")
    };

    let user = format!(
        "Stage: {}\nEnvironment: {}\nAlready reported resources: {}\n\nPlan output:\n{}",
        request.stage, request.environment, already, request.chunk
    );

    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)]
}

#[derive(Debug)]
pub struct AzureOpenAiSummarizer {
    client: AzureOpenAiClient,
}

impl AzureOpenAiSummarizer {
    pub fn new(config: &SummarizerConfig) -> Result<Self, SummarizerError> {
        let endpoint = config.endpoint.clone().ok_or_else(|| {
            SummarizerError::NotConfigured(
                "No endpoint provided. Set AZURE_OPENAI_ENDPOINT or use --azure-openai-endpoint"
                    .to_string(),
            )
        })?;
        let api_key = config.api_key.clone().ok_or_else(|| {
            SummarizerError::Auth(
                "No API key provided. Set AZURE_OPENAI_API_KEY or use --azure-openai-api-key"
                    .to_string(),
            )
        })?;
        let deployment = config.deployment.clone().ok_or_else(|| {
            SummarizerError::NotConfigured(
                "No deployment provided. Set AZURE_OPENAI_DEPLOYMENT or use --azure-openai-deployment"
                    .to_string(),
            )
        })?;

        let mut builder = AzureOpenAiClient::builder(endpoint, api_key, deployment);
        if let Some(version) = &config.api_version {
            builder = builder.api_version(version.clone());
        }
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    pub fn with_client(client: AzureOpenAiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Summarizer for AzureOpenAiSummarizer {
    fn name(&self) -> &str {
        "azure-openai"
    }

    async fn summarize(&self, request: &ChunkRequest<'_>) -> Result<String, SummarizerError> {
        let messages = build_messages(request);

        tracing::debug!(
            stage = request.stage,
            environment = request.environment,
            chunk_chars = request.chunk.chars().count(),
            "requesting plan summary"
        );

        Ok(self.client.chat_completion(&messages).await?)
    }
}
