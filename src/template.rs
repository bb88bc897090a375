//! Template rendering for HTML includes
//!
//! Included HTML files may pull in other templates with
//! `{% include "path" %}`. The builder only needs a `render_string` capability;
//! callers that render with a full template engine can plug their own
//! [`TemplateRenderer`] in.

use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;
use thiserror::Error;

static INCLUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{%-?\s*include\s+["']([^"']+)["']\s*-?%\}"#).unwrap()
});

const MAX_INCLUDE_DEPTH: usize = 8;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template `{0}` not found")]
    NotFound(String),
    #[error("include depth exceeded while rendering `{0}`")]
    TooDeep(String),
    #[error("failed to read template {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub trait TemplateRenderer: Send + Sync {
    fn render_string(&self, template: &str) -> Result<String, TemplateError>;
}

/// Returns the template text unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct RawTemplateRenderer;

impl TemplateRenderer for RawTemplateRenderer {
    fn render_string(&self, template: &str) -> Result<String, TemplateError> {
        Ok(template.to_string())
    }
}

/// Expands `{% include %}` tags from a list of template directories
#[derive(Debug, Clone)]
pub struct IncludeTemplateRenderer {
    search_path: Vec<PathBuf>,
}

impl IncludeTemplateRenderer {
    pub fn new(search_path: Vec<PathBuf>) -> Self {
        Self { search_path }
    }

    fn resolve(&self, name: &str) -> Result<String, TemplateError> {
        let relative = name.trim_start_matches('/');
        for dir in &self.search_path {
            let path = dir.join(relative);
            if path.is_file() {
                return std::fs::read_to_string(&path)
                    .map_err(|source| TemplateError::Io { path, source });
            }
        }
        Err(TemplateError::NotFound(name.to_string()))
    }

    fn expand(&self, template: &str, depth: usize, name: &str) -> Result<String, TemplateError> {
        if depth > MAX_INCLUDE_DEPTH {
            return Err(TemplateError::TooDeep(name.to_string()));
        }
        let mut out = String::with_capacity(template.len());
        let mut last = 0;
        for caps in INCLUDE.captures_iter(template) {
            let (Some(whole), Some(target)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&template[last..whole.start()]);
            let included = self.resolve(target.as_str())?;
            out.push_str(&self.expand(&included, depth + 1, target.as_str())?);
            last = whole.end();
        }
        out.push_str(&template[last..]);
        Ok(out)
    }
}

impl TemplateRenderer for IncludeTemplateRenderer {
    fn render_string(&self, template: &str) -> Result<String, TemplateError> {
        self.expand(template, 0, "<string>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_raw_renderer_is_identity() {
        let text = "<p>{% include \"x.html\" %}</p>";
        assert_eq!(RawTemplateRenderer.render_string(text).unwrap(), text);
    }

    #[test]
    fn test_nested_includes() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("parts")).unwrap();
        fs::write(dir.path().join("parts/a.html"), "<b>{% include 'parts/b.html' %}</b>").unwrap();
        fs::write(dir.path().join("parts/b.html"), "leaf").unwrap();

        let renderer = IncludeTemplateRenderer::new(vec![dir.path().to_path_buf()]);
        let html = renderer
            .render_string("<div>{% include \"parts/a.html\" %}</div>")
            .unwrap();
        assert_eq!(html, "<div><b>leaf</b></div>");
    }

    #[test]
    fn test_missing_include() {
        let renderer = IncludeTemplateRenderer::new(vec![]);
        let err = renderer.render_string("{% include \"nope.html\" %}").unwrap_err();
        assert!(matches!(err, TemplateError::NotFound(name) if name == "nope.html"));
    }

    #[test]
    fn test_recursive_include_is_bounded() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("loop.html"), "{% include \"loop.html\" %}").unwrap();
        let renderer = IncludeTemplateRenderer::new(vec![dir.path().to_path_buf()]);
        let err = renderer.render_string("{% include \"loop.html\" %}").unwrap_err();
        assert!(matches!(err, TemplateError::TooDeep(_)));
    }
}
