use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use tfplan_report::ReportConfig;
use tfplan_report::report::DEFAULT_LOCATION;
use tfplan_report::summarizers::{DEFAULT_CHUNK_CHARS, SummarizerConfig};

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render plan files into an HTML change report
    Render(RenderArgs),
    /// Print every resource change found in the plan files
    Inspect(InspectArgs),
}

#[derive(clap::Args, Debug)]
pub struct RenderArgs {
    /// Directory containing terraform plan files (JSON or rendered text)
    #[arg(long, alias = "plansDir")]
    pub plans_dir: PathBuf,

    /// Directory to write plan.html into
    #[arg(long, alias = "outputDir")]
    pub output_dir: PathBuf,

    /// HTML template with a single <tbody> section (built-in template if omitted)
    #[arg(long, alias = "templateFile")]
    pub template_file: Option<PathBuf>,

    /// Location reported when a resource change carries none
    #[arg(long, default_value = DEFAULT_LOCATION)]
    pub location: String,

    /// Maximum characters of plan text sent to the summarizer per request
    #[arg(long, default_value_t = DEFAULT_CHUNK_CHARS)]
    pub chunk_chars: usize,

    #[command(flatten)]
    pub summarizer: SummarizerArgs,
}

impl RenderArgs {
    pub fn report_config(&self) -> ReportConfig {
        ReportConfig {
            plans_dir: self.plans_dir.clone(),
            output_dir: self.output_dir.clone(),
            template_file: self.template_file.clone(),
            default_location: self.location.clone(),
            chunk_chars: self.chunk_chars,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct SummarizerArgs {
    /// Summarize rendered (non-JSON) plan text with this backend
    #[arg(long, value_parser = ["azure-openai"])]
    pub summarizer: Option<String>,

    #[arg(long, env = "AZURE_OPENAI_ENDPOINT")]
    pub azure_openai_endpoint: Option<String>,

    #[arg(long, env = "AZURE_OPENAI_API_KEY", hide_env_values = true)]
    pub azure_openai_api_key: Option<String>,

    #[arg(long, env = "AZURE_OPENAI_DEPLOYMENT")]
    pub azure_openai_deployment: Option<String>,

    #[arg(long, env = "AZURE_OPENAI_API_VERSION")]
    pub azure_openai_api_version: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 120)]
    pub summarizer_timeout: u64,
}

impl SummarizerArgs {
    pub fn config(&self) -> SummarizerConfig {
        SummarizerConfig {
            endpoint: self.azure_openai_endpoint.clone(),
            api_key: self.azure_openai_api_key.clone(),
            deployment: self.azure_openai_deployment.clone(),
            api_version: self.azure_openai_api_version.clone(),
            timeout: Some(Duration::from_secs(self.summarizer_timeout)),
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct InspectArgs {
    /// Directory containing terraform plan files
    #[arg(long, alias = "plansDir")]
    pub plans_dir: PathBuf,
}
