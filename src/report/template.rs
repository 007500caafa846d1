use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ReportError;
use crate::report::OutputRow;

pub const DEFAULT_TEMPLATE: &str = include_str!("../../templates/plan.html");

const GENERATED_MARKER: &str = "<!-- Generated rows -->";

static TBODY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)(<tbody[^>]*>)(.*?)(</tbody>)").expect("Invalid tbody regex")
});

pub fn load_template(path: Option<&Path>) -> Result<String, ReportError> {
    match path {
        None => Ok(DEFAULT_TEMPLATE.to_string()),
        Some(p) if !p.is_file() => Err(ReportError::TemplateNotFound {
            path: p.to_path_buf(),
        }),
        Some(p) => Ok(std::fs::read_to_string(p)?),
    }
}

/// Replaces the inner content of the first `<tbody>` with the rendered rows.
pub fn splice_rows(template: &str, rows: &[OutputRow]) -> Result<String, ReportError> {
    let caps = TBODY.captures(template).ok_or(ReportError::MissingTbody)?;
    let inner = caps.get(2).ok_or(ReportError::MissingTbody)?;

    let rendered = rows
        .iter()
        .map(OutputRow::to_html)
        .collect::<Vec<_>>()
        .join("\n");

    let mut html = String::with_capacity(template.len() + rendered.len() + 64);
    html.push_str(&template[..inner.start()]);
    html.push_str("\n      ");
    html.push_str(GENERATED_MARKER);
    html.push('\n');
    html.push_str(&rendered);
    html.push_str("\n    ");
    html.push_str(&template[inner.end()..]);
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str) -> OutputRow {
        OutputRow {
            stage: "network".to_string(),
            environment: "aat".to_string(),
            location: "uksouth".to_string(),
            resource_name: name.to_string(),
            change_type: "create".to_string(),
            tags_only: "No".to_string(),
            details: "create".to_string(),
        }
    }

    #[test]
    fn test_splice_replaces_tbody_content() {
        let template = "<table><TBODY class=\"rows\"><tr><td>old</td></tr></TBODY></table>";
        let html = splice_rows(template, &[row("a"), row("b")]).unwrap();

        assert!(html.starts_with("<table><TBODY class=\"rows\">\n      <!-- Generated rows -->\n"));
        assert!(html.ends_with("\n    </TBODY></table>"));
        assert!(!html.contains("old"));
        assert!(html.contains("<td>a</td>"));
        assert!(html.contains("<td>b</td>"));
    }

    #[test]
    fn test_splice_only_first_tbody() {
        let template = "<tbody>x</tbody><tbody>y</tbody>";
        let html = splice_rows(template, &[]).unwrap();
        assert!(!html.contains('x'));
        assert!(html.ends_with("</tbody><tbody>y</tbody>"));
    }

    #[test]
    fn test_splice_multiline_tbody() {
        let template = "<tbody>\n  <tr>\n    <td>old</td>\n  </tr>\n</tbody>";
        let html = splice_rows(template, &[row("a")]).unwrap();
        assert!(!html.contains("old"));
    }

    #[test]
    fn test_splice_missing_tbody_fails() {
        let result = splice_rows("<table></table>", &[row("a")]);
        assert!(matches!(result, Err(ReportError::MissingTbody)));
    }

    #[test]
    fn test_default_template_has_tbody() {
        assert!(splice_rows(DEFAULT_TEMPLATE, &[]).is_ok());
    }

    #[test]
    fn test_load_template_missing_file() {
        let result = load_template(Some(Path::new("/no/such/plan.html")));
        assert!(matches!(result, Err(ReportError::TemplateNotFound { .. })));
    }

    #[test]
    fn test_load_template_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.html");
        std::fs::write(&path, "<tbody></tbody>").unwrap();
        assert_eq!(load_template(Some(&path)).unwrap(), "<tbody></tbody>");
    }
}
