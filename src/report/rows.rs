use std::collections::{BTreeSet, HashSet};

use crate::plan::StageLabel;
use crate::resource::ChangeSummary;

pub const DEFAULT_LOCATION: &str = "uksouth";
pub const DETAIL_LINES: usize = 3;
const TAGS_UPDATED: &str = "tags updated";

/// Short resource name from a Terraform address.
///
/// `module.foo.azurerm_storage_account.bar["baz"]` -> `baz`,
/// `azurerm_resource_group.main` -> `main`, `azurerm_subnet.s[0]` -> `s[0]`.
pub fn resource_name_from_address(address: &str) -> String {
    let bracket = address
        .strip_suffix(']')
        .and_then(|a| a.rfind('[').map(|open| (a, open)));
    let (base, suffix) = match bracket {
        Some((trimmed, open)) => (&trimmed[..open], Some(&trimmed[open + 1..])),
        None => (address, None),
    };

    let last = base.rsplit('.').next().unwrap_or(base);

    match suffix {
        Some(key) if key.starts_with('"') => key.replace('"', ""),
        Some(index) => format!("{last}[{index}]"),
        None => last.replace('"', ""),
    }
}

/// Escapes the angle brackets that would otherwise break table markup.
pub fn html_escape(s: &str) -> String {
    s.replace('<', "&lt;").replace('>', "&gt;")
}

/// Identifies a row already written during this run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmittedRowKey {
    pub stage: String,
    pub environment: String,
    pub resource_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    pub stage: String,
    pub environment: String,
    pub location: String,
    pub resource_name: String,
    pub change_type: String,
    pub tags_only: String,
    pub details: String,
}

impl OutputRow {
    pub fn from_summary(
        label: &StageLabel,
        default_location: &str,
        summary: &ChangeSummary,
    ) -> Self {
        let tags_only = summary.is_tags_only_update();

        let details = if tags_only {
            TAGS_UPDATED.to_string()
        } else if summary.diffs.is_empty() {
            summary.change_type.to_string()
        } else {
            summary
                .diffs
                .iter()
                .take(DETAIL_LINES)
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        };

        Self {
            stage: label.stage.clone(),
            environment: label.environment.clone(),
            location: summary
                .location
                .clone()
                .unwrap_or_else(|| default_location.to_string()),
            resource_name: resource_name_from_address(&summary.address),
            change_type: summary.change_type.to_string(),
            tags_only: if tags_only { "Yes" } else { "No" }.to_string(),
            details,
        }
    }

    pub fn key(&self) -> EmittedRowKey {
        EmittedRowKey {
            stage: self.stage.clone(),
            environment: self.environment.clone(),
            resource_name: self.resource_name.clone(),
        }
    }

    pub fn cells(&self) -> [&str; 7] {
        [
            &self.stage,
            &self.environment,
            &self.location,
            &self.resource_name,
            &self.change_type,
            &self.tags_only,
            &self.details,
        ]
    }

    pub fn to_html(&self) -> String {
        let cells: String = self
            .cells()
            .iter()
            .map(|cell| format!("<td>{}</td>", html_escape(cell)))
            .collect();
        format!("<tr>{cells}</tr>")
    }
}

/// Run-wide row accumulator enforcing at most one row per
/// (stage, environment, resource). First occurrence wins.
#[derive(Debug, Default)]
pub struct RowCollector {
    emitted: HashSet<EmittedRowKey>,
    rows: Vec<OutputRow>,
}

impl RowCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when a row for the same key was already accepted.
    pub fn push(&mut self, row: OutputRow) -> bool {
        if !self.emitted.insert(row.key()) {
            tracing::debug!(
                stage = %row.stage,
                environment = %row.environment,
                resource = %row.resource_name,
                "duplicate row suppressed"
            );
            return false;
        }
        self.rows.push(row);
        true
    }

    pub fn contains(&self, key: &EmittedRowKey) -> bool {
        self.emitted.contains(key)
    }

    /// Resource names already emitted for one stage/environment, sorted.
    pub fn emitted_names(&self, label: &StageLabel) -> Vec<String> {
        self.emitted
            .iter()
            .filter(|k| k.stage == label.stage && k.environment == label.environment)
            .map(|k| k.resource_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn emitted_keys(&self) -> &HashSet<EmittedRowKey> {
        &self.emitted
    }

    pub fn rows(&self) -> &[OutputRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<OutputRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
