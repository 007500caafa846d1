use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Raw action token from a Terraform plan's `change.actions` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    NoOp,
    #[serde(other)]
    Unknown,
}

/// Collapsed classification of an action sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeType {
    Create,
    Update,
    Delete,
    NoOp,
}

impl ChangeType {
    /// Exact-match mapping; replacements and anything unrecognised become `Update`.
    pub fn from_actions(actions: &[Action]) -> Self {
        match actions {
            [Action::Create] => ChangeType::Create,
            [Action::Delete] => ChangeType::Delete,
            [Action::Update] => ChangeType::Update,
            [Action::Delete, Action::Create] | [Action::Create, Action::Delete] => {
                ChangeType::Update
            }
            [Action::NoOp] => ChangeType::NoOp,
            _ => ChangeType::Update,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Create => "create",
            ChangeType::Update => "update",
            ChangeType::Delete => "delete",
            ChangeType::NoOp => "no-op",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads an explicit `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Change {
    #[serde(default, deserialize_with = "null_as_default")]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub before: Option<serde_json::Value>,
    #[serde(default)]
    pub after: Option<serde_json::Value>,
}

/// One entry of a plan's `resource_changes` array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResourceChange {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub change: Change,
}

impl ResourceChange {
    /// Full address, falling back to the bare `name` some tooling emits.
    pub fn address(&self) -> &str {
        self.address
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or_default()
    }

    /// Action tokens, never empty: a record without actions counts as an update.
    pub fn actions(&self) -> &[Action] {
        if self.change.actions.is_empty() {
            &[Action::Update]
        } else {
            &self.change.actions
        }
    }

    /// Top-level `location` attribute of the resulting state, else the prior state.
    pub fn location(&self) -> Option<&str> {
        [&self.change.after, &self.change.before]
            .into_iter()
            .flatten()
            .find_map(|state| state.get("location").and_then(|v| v.as_str()))
    }
}

/// A single `path: before -> after` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub path: String,
    pub before: String,
    pub after: String,
}

impl DiffLine {
    pub fn is_tag_path(&self) -> bool {
        self.path.starts_with("tags") || self.path.contains(".tags.")
    }
}

impl fmt::Display for DiffLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.path, self.before, self.after)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSummary {
    pub address: String,
    pub change_type: ChangeType,
    /// At most 25 lines; truncation is silent.
    pub diffs: Vec<DiffLine>,
    pub tags_only: bool,
    pub location: Option<String>,
}

impl ChangeSummary {
    /// `tags_only` as it may be reported: only ever true for updates.
    pub fn is_tags_only_update(&self) -> bool {
        self.tags_only && self.change_type == ChangeType::Update
    }
}
