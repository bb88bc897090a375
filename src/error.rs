//! Document build errors
//!
//! Soft failures (missing optional includes, malformed YAML widgets, unknown
//! tags) never show up here: they are logged and recorded in the build report.
//! Everything in [`BuildError`] aborts the document.

use crate::fragment::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("invalid front matter: {0}")]
    FrontMatter(String),
    #[error("fragment #{position} (<{tag}>) is invalid: {source}")]
    InvalidFragment {
        position: usize,
        tag: String,
        #[source]
        source: ValidationError,
    },
    #[error("codex script {} cannot be read: {source}", path.display())]
    CodexScript {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("codex template {} cannot be read: {source}", path.display())]
    CodexTemplate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("codex block has no `script_path`")]
    CodexScriptPath,
    #[error("cannot serialize html: {0}")]
    Html(#[from] std::io::Error),
}

pub type BuildResult<T> = Result<T, BuildError>;
