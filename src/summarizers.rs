pub mod azure_openai;

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use thiserror::Error;

use crate::report::OutputRow;

pub const DEFAULT_CHUNK_CHARS: usize = 12_000;

#[derive(Debug, Error)]
pub enum SummarizerError {
    #[error("unknown summarizer: {0}")]
    UnknownSummarizer(String),
    #[error("summarizer not configured: {0}")]
    NotConfigured(String),
    #[error("authentication error: {0}")]
    Auth(String),
    #[error("azure openai error: {0}")]
    AzureOpenAi(String),
}

/// Connection settings for a chat-completion backend.
#[derive(Debug, Clone, Default)]
pub struct SummarizerConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub deployment: Option<String>,
    pub api_version: Option<String>,
    pub timeout: Option<Duration>,
}

/// One fragment of rendered plan text plus what has already been reported.
#[derive(Debug, Clone, Copy)]
pub struct ChunkRequest<'a> {
    pub stage: &'a str,
    pub environment: &'a str,
    pub already_emitted: &'a [String],
    pub chunk: &'a str,
}

/// Turns rendered plan text into `<tr>` rows with the report's seven columns.
///
/// Returned markup is untrusted: rows are re-parsed and deduplicated by the caller.
#[async_trait]
pub trait Summarizer: Send + Sync {
    fn name(&self) -> &str;
    async fn summarize(&self, request: &ChunkRequest<'_>) -> Result<String, SummarizerError>;
}

pub fn get_summarizer(
    name: &str,
    config: &SummarizerConfig,
) -> Result<Box<dyn Summarizer>, SummarizerError> {
    match name {
        "azure-openai" => Ok(Box::new(azure_openai::AzureOpenAiSummarizer::new(config)?)),
        other => Err(SummarizerError::UnknownSummarizer(other.to_string())),
    }
}

/// Splits text on line boundaries into chunks of at most `max_chars`
/// characters. A single longer line becomes its own chunk.
pub fn chunk_plan_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for line in text.split_inclusive('\n') {
        let line_chars = line.chars().count();
        if current_chars > 0 && current_chars + line_chars > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        current.push_str(line);
        current_chars += line_chars;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks.retain(|c| !c.trim().is_empty());
    chunks
}

static ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr>").expect("Invalid row regex"));
static CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<td\b[^>]*>(.*?)</td>").expect("Invalid cell regex"));
static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("Invalid tag regex"));

/// Extracts rows from summarizer markup. Rows with fewer than four cells
/// (no resource name) are dropped; missing trailing cells become empty.
pub fn parse_summarizer_rows(html: &str) -> Vec<OutputRow> {
    ROW.captures_iter(html)
        .filter_map(|row| {
            let mut cells = CELL
                .captures_iter(&row[1])
                .map(|cell| TAG.replace_all(&cell[1], "").trim().to_string());

            let mut next = || cells.next().unwrap_or_default();
            let parsed = OutputRow {
                stage: next(),
                environment: next(),
                location: next(),
                resource_name: next(),
                change_type: next(),
                tags_only: next(),
                details: next(),
            };

            if parsed.resource_name.is_empty() {
                tracing::debug!(row = &row[0], "skipping summarizer row without resource name");
                return None;
            }
            Some(parsed)
        })
        .collect()
}
