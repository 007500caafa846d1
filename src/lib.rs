//! tfplan-report - Terraform plan change report
//!
//! A library for turning Terraform plan artifacts into a deduplicated HTML change table.

pub mod output;
pub mod plan;
pub mod report;
pub mod resource;
pub mod summarizers;

mod error;

pub use error::ReportError;
pub use report::{OutputRow, ReportConfig, RowCollector, generate_report};
pub use resource::{ChangeSummary, ChangeType, ResourceChange};
pub use summarizers::azure_openai::{AzureOpenAiClient, AzureOpenAiError};
pub use summarizers::{Summarizer, SummarizerConfig, SummarizerError};
