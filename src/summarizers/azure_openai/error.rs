use thiserror::Error;

use crate::summarizers::SummarizerError;

/// Errors raised while talking to an Azure OpenAI deployment.
///
/// SECURITY: Error messages must NEVER contain the API key.
#[derive(Debug, Error)]
pub enum AzureOpenAiError {
    /// Key rejected or missing permissions on the deployment
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// Non-success HTTP response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Connection failure, timeout, or undecodable body
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Success status but no usable completion in the body
    #[error("malformed response: {message}")]
    MalformedResponse { message: String },
}

impl From<AzureOpenAiError> for SummarizerError {
    fn from(err: AzureOpenAiError) -> Self {
        match err {
            AzureOpenAiError::Auth { message } => SummarizerError::Auth(message),
            other => SummarizerError::AzureOpenAi(other.to_string()),
        }
    }
}
