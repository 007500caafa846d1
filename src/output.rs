use std::path::Path;

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::error::ReportError;
use crate::plan::{self, PlanArtifact, PlanFile};

/// One line of the `inspect` table.
#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
pub struct SummaryRow {
    #[tabled(rename = "File")]
    pub file: String,
    #[tabled(rename = "Stage")]
    pub stage: String,
    #[tabled(rename = "Env")]
    pub environment: String,
    #[tabled(rename = "Address")]
    pub address: String,
    #[tabled(rename = "Change")]
    pub change: String,
    #[tabled(rename = "Tags Only")]
    pub tags_only: String,
    #[tabled(rename = "Diffs")]
    pub diffs: usize,
}

pub fn summary_rows(plan: &PlanFile) -> Vec<SummaryRow> {
    let row = |address: String, change: String, tags_only: bool, diffs: usize| SummaryRow {
        file: plan.file_name.clone(),
        stage: plan.label.stage.clone(),
        environment: plan.label.environment.clone(),
        address,
        change,
        tags_only: if tags_only { "Yes" } else { "No" }.to_string(),
        diffs,
    };

    match &plan.artifact {
        PlanArtifact::Json(doc) => doc
            .clone()
            .into_changes()
            .iter()
            .map(plan::summarize)
            .map(|s| {
                row(
                    s.address.clone(),
                    s.change_type.to_string(),
                    s.is_tags_only_update(),
                    s.diffs.len(),
                )
            })
            .collect(),
        PlanArtifact::Text(_) => vec![row(
            "(rendered plan text)".to_string(),
            "skipped".to_string(),
            false,
            0,
        )],
    }
}

/// Every plan under `dir`, in processing order, without deduplication.
pub fn inspect_plans(dir: &Path) -> Result<Vec<SummaryRow>, ReportError> {
    let mut rows = Vec::new();
    for path in plan::list_plan_files(dir)? {
        let plan = plan::load_plan_file(&path)?;
        rows.extend(summary_rows(&plan));
    }
    Ok(rows)
}

pub fn render_table(rows: &[SummaryRow]) -> String {
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}
