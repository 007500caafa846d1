use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::resource::{ChangeSummary, ChangeType, DiffLine, ResourceChange};

pub const MAX_DIFF_LINES: usize = 25;
pub const MAX_VALUE_CHARS: usize = 60;

const ABSENT: &str = "<absent>";
const ELLIPSIS: char = '…';

/// Flattens nested objects/arrays into `a.b[0].c` paths. A nested empty
/// container is a leaf at its own path; an empty root contributes no paths,
/// the same as an absent state. A bare scalar is recorded under `value`.
pub fn flatten(value: Option<&Value>) -> BTreeMap<String, &Value> {
    let mut out = BTreeMap::new();
    match value {
        None => {}
        Some(v @ (Value::Object(_) | Value::Array(_))) => flatten_into(v, String::new(), &mut out),
        Some(scalar) => {
            out.insert("value".to_string(), scalar);
        }
    }
    out
}

fn flatten_into<'a>(value: &'a Value, prefix: String, out: &mut BTreeMap<String, &'a Value>) {
    let is_empty_container = match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    };
    if is_empty_container && !prefix.is_empty() {
        out.insert(prefix, value);
        return;
    }

    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(child, path, out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(child, format!("{prefix}[{index}]"), out);
            }
        }
        scalar => {
            out.insert(prefix, scalar);
        }
    }
}

fn render(value: Option<&Value>) -> String {
    match value {
        None => ABSENT.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn shorten(s: String) -> String {
    if s.chars().count() > MAX_VALUE_CHARS {
        let mut short: String = s.chars().take(MAX_VALUE_CHARS).collect();
        short.push(ELLIPSIS);
        short
    } else {
        s
    }
}

/// Path-sorted differences between two states, uncapped.
pub fn diff_before_after(before: Option<&Value>, after: Option<&Value>) -> Vec<DiffLine> {
    let flat_before = flatten(before);
    let flat_after = flatten(after);

    let paths: BTreeSet<&String> = flat_before.keys().chain(flat_after.keys()).collect();

    paths
        .into_iter()
        .filter_map(|path| {
            let b = flat_before.get(path).copied();
            let a = flat_after.get(path).copied();
            if b == a {
                return None;
            }
            Some(DiffLine {
                path: path.clone(),
                before: shorten(render(b)),
                after: shorten(render(a)),
            })
        })
        .collect()
}

pub fn summarize(change: &ResourceChange) -> ChangeSummary {
    let mut diffs = diff_before_after(change.change.before.as_ref(), change.change.after.as_ref());
    let tags_only = !diffs.is_empty() && diffs.iter().all(DiffLine::is_tag_path);
    diffs.truncate(MAX_DIFF_LINES);

    ChangeSummary {
        address: change.address().to_string(),
        change_type: ChangeType::from_actions(change.actions()),
        diffs,
        tags_only,
        location: change.location().map(str::to_string),
    }
}
