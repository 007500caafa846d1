//! Plan-to-report pipeline.
//!
//! Plan files are read in file-name order, JSON artifacts are summarized
//! locally and text artifacts are handed to an optional [`Summarizer`].
//! Every candidate row passes through one [`RowCollector`] per run, so a
//! (stage, environment, resource) triple is reported at most once.

mod rows;
mod template;

pub use rows::{
    DEFAULT_LOCATION, DETAIL_LINES, EmittedRowKey, OutputRow, RowCollector, html_escape,
    resource_name_from_address,
};
pub use template::{DEFAULT_TEMPLATE, load_template, splice_rows};

use std::path::{Path, PathBuf};

use crate::error::ReportError;
use crate::plan::{self, PlanArtifact, PlanFile, StageLabel};
use crate::resource::ChangeSummary;
use crate::summarizers::{
    ChunkRequest, DEFAULT_CHUNK_CHARS, Summarizer, chunk_plan_text, parse_summarizer_rows,
};

pub const OUTPUT_FILE_NAME: &str = "plan.html";

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub plans_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Built-in template when unset.
    pub template_file: Option<PathBuf>,
    pub default_location: String,
    pub chunk_chars: usize,
}

impl ReportConfig {
    pub fn new(plans_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            plans_dir: plans_dir.into(),
            output_dir: output_dir.into(),
            template_file: None,
            default_location: DEFAULT_LOCATION.to_string(),
            chunk_chars: DEFAULT_CHUNK_CHARS,
        }
    }

    pub fn validate(&self) -> Result<(), ReportError> {
        if self.chunk_chars == 0 {
            return Err(ReportError::Config(
                "chunk size must be positive".to_string(),
            ));
        }
        if self.default_location.trim().is_empty() {
            return Err(ReportError::Config(
                "default location must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(OUTPUT_FILE_NAME)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub files: usize,
    pub resource_changes: usize,
    pub text_chunks: usize,
    pub skipped_text_files: usize,
}

/// State owned by a single report run.
#[derive(Debug, Default)]
pub struct RunContext {
    pub collector: RowCollector,
    pub stats: RunStats,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers summaries in order; returns how many produced rows.
    pub fn add_summaries(
        &mut self,
        label: &StageLabel,
        default_location: &str,
        summaries: &[ChangeSummary],
    ) -> usize {
        summaries
            .iter()
            .filter(|s| {
                self.collector
                    .push(OutputRow::from_summary(label, default_location, s))
            })
            .count()
    }

    /// Offers summarizer markup; the summarizer's own dedup is not trusted.
    pub fn add_summarizer_rows(&mut self, html: &str) -> usize {
        parse_summarizer_rows(html)
            .into_iter()
            .filter(|row| self.collector.push(row.clone()))
            .count()
    }

    async fn summarize_text(
        &mut self,
        label: &StageLabel,
        text: &str,
        chunk_chars: usize,
        summarizer: &dyn Summarizer,
    ) -> Result<usize, ReportError> {
        let mut added = 0;
        for chunk in chunk_plan_text(text, chunk_chars) {
            let already_emitted = self.collector.emitted_names(label);
            let request = ChunkRequest {
                stage: &label.stage,
                environment: &label.environment,
                already_emitted: &already_emitted,
                chunk: &chunk,
            };
            let html = summarizer.summarize(&request).await?;
            added += self.add_summarizer_rows(&html);
            self.stats.text_chunks += 1;
        }
        Ok(added)
    }

    pub async fn process_plan(
        &mut self,
        plan: PlanFile,
        config: &ReportConfig,
        summarizer: Option<&dyn Summarizer>,
    ) -> Result<(), ReportError> {
        self.stats.files += 1;

        match plan.artifact {
            PlanArtifact::Json(doc) => {
                let variant = doc.variant_name();
                let summaries: Vec<ChangeSummary> =
                    doc.into_changes().iter().map(plan::summarize).collect();
                self.stats.resource_changes += summaries.len();

                let added = self.add_summaries(&plan.label, &config.default_location, &summaries);
                tracing::info!(
                    file = %plan.file_name,
                    stage = %plan.label.stage,
                    environment = %plan.label.environment,
                    variant,
                    changes = summaries.len(),
                    rows = added,
                    "processed plan"
                );
            }
            PlanArtifact::Text(text) => match summarizer {
                Some(summarizer) => {
                    let added = self
                        .summarize_text(&plan.label, &text, config.chunk_chars, summarizer)
                        .await?;
                    tracing::info!(
                        file = %plan.file_name,
                        summarizer = summarizer.name(),
                        rows = added,
                        "summarized text plan"
                    );
                }
                None => {
                    self.stats.skipped_text_files += 1;
                    tracing::warn!(
                        file = %plan.file_name,
                        "plan is not JSON and no summarizer is configured, skipping"
                    );
                }
            },
        }
        Ok(())
    }
}

/// Runs ingestion, summarization and deduplication over every plan file.
pub async fn collect_rows(
    config: &ReportConfig,
    summarizer: Option<&dyn Summarizer>,
) -> Result<RunContext, ReportError> {
    config.validate()?;

    let mut ctx = RunContext::new();
    for path in plan::list_plan_files(&config.plans_dir)? {
        let plan = plan::load_plan_file(&path)?;
        ctx.process_plan(plan, config, summarizer).await?;
    }
    Ok(ctx)
}

#[derive(Debug)]
pub struct ReportOutcome {
    pub output_path: PathBuf,
    pub rows: Vec<OutputRow>,
    pub stats: RunStats,
}

/// Full run: collect rows, splice them into the template, write `plan.html`.
pub async fn generate_report(
    config: &ReportConfig,
    summarizer: Option<&dyn Summarizer>,
) -> Result<ReportOutcome, ReportError> {
    // Template problems are fatal; surface them before any summarizer calls.
    let template = load_template(config.template_file.as_deref())?;
    splice_rows(&template, &[])?;

    let ctx = collect_rows(config, summarizer).await?;
    if ctx.collector.is_empty() {
        tracing::warn!("no rows produced from plans");
    }

    let html = splice_rows(&template, ctx.collector.rows())?;
    let output_path = write_report(&config.output_dir, &html)?;

    tracing::info!(
        path = %output_path.display(),
        rows = ctx.collector.len(),
        "plan report written"
    );

    Ok(ReportOutcome {
        output_path,
        stats: ctx.stats,
        rows: ctx.collector.into_rows(),
    })
}

fn write_report(output_dir: &Path, html: &str) -> Result<PathBuf, ReportError> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(OUTPUT_FILE_NAME);
    std::fs::write(&path, html)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarizers::SummarizerError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ScriptedSummarizer {
        responses: Mutex<Vec<String>>,
        seen_emitted: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedSummarizer {
        fn new(responses: &[&str]) -> Self {
            Self {
                responses: Mutex::new(responses.iter().rev().map(|s| s.to_string()).collect()),
                seen_emitted: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Summarizer for ScriptedSummarizer {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn summarize(&self, request: &ChunkRequest<'_>) -> Result<String, SummarizerError> {
            self.seen_emitted
                .lock()
                .unwrap()
                .push(request.already_emitted.to_vec());
            Ok(self.responses.lock().unwrap().pop().unwrap_or_default())
        }
    }

    fn label() -> StageLabel {
        StageLabel {
            stage: "network".to_string(),
            environment: "aat".to_string(),
        }
    }

    fn text_plan(text: &str) -> PlanFile {
        PlanFile {
            file_name: "tfplan-aat-network.txt".to_string(),
            label: label(),
            artifact: PlanArtifact::Text(text.to_string()),
        }
    }

    #[test]
    fn test_config_validation() {
        let mut config = ReportConfig::new("plans", "out");
        assert!(config.validate().is_ok());
        config.chunk_chars = 0;
        assert!(matches!(config.validate(), Err(ReportError::Config(_))));
    }

    #[test]
    fn test_output_path() {
        let config = ReportConfig::new("plans", "out");
        assert_eq!(config.output_path(), PathBuf::from("out/plan.html"));
    }

    #[test]
    fn test_summarizer_rows_are_deduplicated() {
        let mut ctx = RunContext::new();
        let html = "<tr><td>network</td><td>aat</td><td>uksouth</td><td>a</td><td>create</td><td>No</td><td>create</td></tr>\
                    <tr><td>network</td><td>aat</td><td>uksouth</td><td>a</td><td>update</td><td>No</td><td>again</td></tr>";
        assert_eq!(ctx.add_summarizer_rows(html), 1);
        assert_eq!(ctx.add_summarizer_rows(html), 0);
        assert_eq!(ctx.collector.rows()[0].change_type, "create");
    }

    #[tokio::test]
    async fn test_text_plan_skipped_without_summarizer() {
        let mut ctx = RunContext::new();
        let config = ReportConfig::new("plans", "out");
        ctx.process_plan(text_plan("# some rendered plan"), &config, None)
            .await
            .unwrap();
        assert!(ctx.collector.is_empty());
        assert_eq!(ctx.stats.skipped_text_files, 1);
    }

    #[tokio::test]
    async fn test_text_plan_chunks_carry_emitted_names() {
        let summarizer = ScriptedSummarizer::new(&[
            "<tr><td>network</td><td>aat</td><td>uksouth</td><td>subnet-a</td><td>create</td><td>No</td><td>create</td></tr>",
            "<tr><td>network</td><td>aat</td><td>uksouth</td><td>subnet-a</td><td>create</td><td>No</td><td>dup</td></tr>\
             <tr><td>network</td><td>aat</td><td>uksouth</td><td>vnet</td><td>update</td><td>Yes</td><td>tags updated</td></tr>",
        ]);
        let mut config = ReportConfig::new("plans", "out");
        config.chunk_chars = 20;

        let mut ctx = RunContext::new();
        ctx.process_plan(
            text_plan("first chunk line\nsecond chunk line\n"),
            &config,
            Some(&summarizer),
        )
        .await
        .unwrap();

        let names: Vec<&str> = ctx
            .collector
            .rows()
            .iter()
            .map(|r| r.resource_name.as_str())
            .collect();
        assert_eq!(names, vec!["subnet-a", "vnet"]);
        assert_eq!(ctx.stats.text_chunks, 2);

        let seen = summarizer.seen_emitted.lock().unwrap();
        assert!(seen[0].is_empty());
        assert_eq!(seen[1], vec!["subnet-a".to_string()]);
    }

    #[tokio::test]
    async fn test_summarizer_failure_is_fatal() {
        struct Failing;

        #[async_trait]
        impl Summarizer for Failing {
            fn name(&self) -> &str {
                "failing"
            }

            async fn summarize(&self, _: &ChunkRequest<'_>) -> Result<String, SummarizerError> {
                Err(SummarizerError::AzureOpenAi("malformed response".to_string()))
            }
        }

        let mut ctx = RunContext::new();
        let config = ReportConfig::new("plans", "out");
        let result = ctx
            .process_plan(text_plan("plan text"), &config, Some(&Failing))
            .await;
        assert!(matches!(result, Err(ReportError::Summarizer(_))));
    }
}
