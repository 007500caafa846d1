use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::ReportError;
use crate::resource::ResourceChange;

static PLAN_FILE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^tfplan-([a-z0-9]+?)-(.+)$").expect("Invalid plan file name regex")
});

pub const UNKNOWN_ENVIRONMENT: &str = "unknown";

/// Pipeline labels taken from a plan file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StageLabel {
    pub stage: String,
    pub environment: String,
}

/// `tfplan-<env>-<stage>.<ext>` -> (`stage`, `env`); anything else keeps the
/// stem as the stage with an `unknown` environment.
pub fn derive_stage_and_env(file_name: &str) -> StageLabel {
    let base = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);

    match PLAN_FILE_NAME.captures(base) {
        Some(caps) => StageLabel {
            stage: caps[2].to_string(),
            environment: caps[1].to_string(),
        },
        None => StageLabel {
            stage: base.to_string(),
            environment: UNKNOWN_ENVIRONMENT.to_string(),
        },
    }
}

/// Shapes a JSON plan artifact can take.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanDocument {
    /// `terraform show -json` output with a top-level `resource_changes` array.
    FullPlanDocument(Vec<ResourceChange>),
    /// A document that is itself one resource-change record.
    SingleChangeRecord(ResourceChange),
    /// Several top-level objects concatenated without a wrapping array.
    ConcatenatedObjectStream(Vec<ResourceChange>),
}

impl PlanDocument {
    pub fn into_changes(self) -> Vec<ResourceChange> {
        match self {
            PlanDocument::FullPlanDocument(changes)
            | PlanDocument::ConcatenatedObjectStream(changes) => changes,
            PlanDocument::SingleChangeRecord(change) => vec![change],
        }
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            PlanDocument::FullPlanDocument(_) => "full-plan",
            PlanDocument::SingleChangeRecord(_) => "single-record",
            PlanDocument::ConcatenatedObjectStream(_) => "object-stream",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlanArtifact {
    Json(PlanDocument),
    /// Rendered plan output; only a summarizer can make sense of it.
    Text(String),
}

/// One plan file read from disk and classified.
#[derive(Debug, Clone)]
pub struct PlanFile {
    pub file_name: String,
    pub label: StageLabel,
    pub artifact: PlanArtifact,
}

fn looks_like_change_record(value: &Value) -> bool {
    value.is_object()
        && (value.get("address").is_some() || value.get("name").is_some())
        && value.get("change").is_some()
}

fn to_change(value: Value) -> Option<ResourceChange> {
    match serde_json::from_value(value) {
        Ok(change) => Some(change),
        Err(e) => {
            tracing::debug!(error = %e, "skipping malformed resource change");
            None
        }
    }
}

fn record_changes(values: impl IntoIterator<Item = Value>) -> Vec<ResourceChange> {
    values
        .into_iter()
        .filter(looks_like_change_record)
        .filter_map(to_change)
        .collect()
}

/// Recovers every balanced top-level `{...}` object from `raw`, skipping
/// buffers that do not parse. Braces inside string literals are ignored.
///
/// A buffer that fails to parse or never closes is skipped by resuming one
/// byte past its opening brace, so a stray quote cannot swallow the objects
/// after it.
pub fn scan_objects(raw: &str) -> Vec<Value> {
    let mut objects = Vec::new();
    let mut from = 0;
    while let Some(failed_at) = scan_from(raw, from, &mut objects) {
        from = failed_at + 1;
    }
    objects
}

/// Scans `raw[from..]`, returning the offset of the first object that does
/// not parse or is still open at end of input.
fn scan_from(raw: &str, from: usize, objects: &mut Vec<Value>) -> Option<usize> {
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[from..].char_indices() {
        let idx = from + offset;
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(idx);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0
                    && let Some(begin) = start.take()
                {
                    match serde_json::from_str::<Value>(&raw[begin..=idx]) {
                        Ok(value @ Value::Object(_)) => objects.push(value),
                        Ok(_) => {}
                        Err(e) => {
                            tracing::debug!(error = %e, "skipping unparsable JSON fragment");
                            return Some(begin);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    start
}

/// Classifies raw plan content. Empty input is an empty plan, not text.
pub fn classify(raw: &str) -> PlanArtifact {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return PlanArtifact::Json(PlanDocument::FullPlanDocument(Vec::new()));
    }

    let whole = serde_json::from_str::<Value>(trimmed).ok();

    if let Some(doc) = &whole
        && let Some(changes) = doc.get("resource_changes")
    {
        let changes = match changes {
            Value::Array(items) => record_changes(items.iter().cloned()),
            _ => Vec::new(),
        };
        return PlanArtifact::Json(PlanDocument::FullPlanDocument(changes));
    }

    if let Some(doc) = &whole
        && looks_like_change_record(doc)
        && let Some(change) = to_change(doc.clone())
    {
        return PlanArtifact::Json(PlanDocument::SingleChangeRecord(change));
    }

    let changes = record_changes(scan_objects(raw));
    if changes.is_empty() && whole.is_none() {
        return PlanArtifact::Text(raw.to_string());
    }
    PlanArtifact::Json(PlanDocument::ConcatenatedObjectStream(changes))
}

/// Regular files directly under `dir`, sorted by file name.
pub fn list_plan_files(dir: &Path) -> Result<Vec<PathBuf>, ReportError> {
    let entries = std::fs::read_dir(dir).map_err(|source| ReportError::PlansDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

pub fn load_plan_file(path: &Path) -> Result<PlanFile, ReportError> {
    let bytes = std::fs::read(path)?;
    let raw = String::from_utf8_lossy(&bytes);

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(PlanFile {
        label: derive_stage_and_env(&file_name),
        artifact: classify(&raw),
        file_name,
    })
}
