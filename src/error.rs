use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("cannot read plans directory {}: {source}", path.display())]
    PlansDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("template file not found: {}", path.display())]
    TemplateNotFound { path: PathBuf },

    #[error("could not locate <tbody>...</tbody> section in template")]
    MissingTbody,

    #[error(transparent)]
    Summarizer(#[from] crate::summarizers::SummarizerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}
