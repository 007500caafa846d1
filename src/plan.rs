//! Plan artifact ingestion and per-resource change summaries.

mod diff;
mod ingest;

pub use diff::{MAX_DIFF_LINES, MAX_VALUE_CHARS, diff_before_after, flatten, summarize};
pub use ingest::{
    PlanArtifact, PlanDocument, PlanFile, StageLabel, UNKNOWN_ENVIRONMENT, classify,
    derive_stage_and_env, list_plan_files, load_plan_file, scan_objects,
};
