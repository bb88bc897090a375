//! PM documents and their builder
//!
//! [`PmBuilder`] runs the whole pipeline for one document:
//! markdown to HTML, HTML to DOM, each top-level element to a fragment (with
//! the heading counters threaded through in document order), and finally the
//! interaction positions.

use crate::builder::{BuildContext, FragmentBuilder, HeadingCounterState};
use crate::config::PmConfig;
use crate::dom;
use crate::error::{BuildError, BuildResult};
use crate::fragment::Fragment;
use crate::ftype::FType;
use crate::markdown::{markdown_to_html, MarkdownOutput};
use crate::report::{BuildReport, DiagnosticKind};
use crate::template::TemplateRenderer;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

const ORIGIN_PREFIX: &str = "../markdowns/";
const ORIGIN_SUFFIX: &str = ".md";

/// One built PM document
#[derive(Debug, Clone, Default, Serialize)]
pub struct Pm {
    pub origin: String,
    pub origin_fn: String,
    pub class_at_school: Option<String>,
    pub theme: Option<String>,
    pub theme_rdb: Option<String>,
    pub chapter: Option<String>,
    pub chapter_rdb: Option<String>,
    pub mode: Option<String>,
    pub b_type: Option<String>,
    pub metadata: Map<String, Value>,
    pub toc: Map<String, Value>,
    pub title: String,
    pub science: Map<String, Value>,
    pub interaction_count: usize,
    pub answerable_interaction_count: usize,
    pub fragments: Vec<Fragment>,
    pub html_content: Option<String>,
    pub js_dependencies: Vec<String>,
    pub css_dependencies: Vec<String>,
}

impl Pm {
    pub fn to_dict(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn fragments_of(&self, f_type: FType) -> impl Iterator<Item = &Fragment> {
        self.fragments.iter().filter(move |f| f.f_type() == f_type)
    }
}

/// A built document and the report of its build
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub pm: Pm,
    pub report: BuildReport,
}

/// `../markdowns/algebra/fractions.md` -> `algebra/fractions`
pub fn normalize_origin(origin: &str) -> String {
    let origin = origin.strip_prefix(ORIGIN_PREFIX).unwrap_or(origin);
    origin.strip_suffix(ORIGIN_SUFFIX).unwrap_or(origin).to_string()
}

fn origin_file_name(origin: &str) -> String {
    Path::new(origin)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| origin.to_string())
}

fn meta_string(metadata: &Map<String, Value>, key: &str) -> Option<String> {
    metadata.get(key).and_then(Value::as_str).map(str::to_string)
}

fn meta_strings(metadata: &Map<String, Value>, key: &str) -> Vec<String> {
    match metadata.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(single)) => vec![single.clone()],
        _ => Vec::new(),
    }
}

/// Builds [`Pm`] documents. Holds no per-document state, so one builder can
/// serve several threads.
#[derive(Debug, Clone)]
pub struct PmBuilder {
    ctx: BuildContext,
}

impl Default for PmBuilder {
    fn default() -> Self {
        Self::new(PmConfig::default())
    }
}

impl PmBuilder {
    pub fn new(config: PmConfig) -> Self {
        Self {
            ctx: BuildContext::new(config),
        }
    }

    pub fn with_renderer(config: PmConfig, renderer: Arc<dyn TemplateRenderer>) -> Self {
        Self {
            ctx: BuildContext::with_renderer(config, renderer),
        }
    }

    pub fn context(&self) -> &BuildContext {
        &self.ctx
    }

    pub fn from_markdown(&self, markdown: &str, origin: &str) -> BuildResult<Pm> {
        self.build(markdown, origin).map(|output| output.pm)
    }

    pub fn build(&self, markdown: &str, origin: &str) -> BuildResult<BuildOutput> {
        let start_time = Instant::now();
        let mut report = BuildReport::new(origin);

        let MarkdownOutput { html, metadata, .. } = markdown_to_html(markdown)?;
        let nodes = dom::parse_body_fragment(&html);

        let mut builder = FragmentBuilder::new(&self.ctx);
        let mut counters = HeadingCounterState::new();
        let mut fragments = Vec::new();
        let mut toc = Map::new();

        for (position, node) in nodes.iter().filter(|n| dom::is_element(n)).enumerate() {
            let (fields, next) = builder.from_tag(node, counters)?;
            counters = next;
            let fragment = Fragment::new(fields).map_err(|source| BuildError::InvalidFragment {
                position,
                tag: dom::tag_name(node).unwrap_or_default(),
                source,
            })?;
            report.statistics.increment_fragment(fragment.f_type().as_str());

            if fragment.f_type() == FType::Toc {
                if !toc.is_empty() {
                    log::warn!("{}: more than one table of contents, keeping the last", origin);
                    builder.warn(
                        DiagnosticKind::DuplicateToc,
                        "more than one table of contents, keeping the last".to_string(),
                    );
                }
                toc = fragment.to_dict();
            } else {
                fragments.push(fragment);
            }
        }

        let (fragments, interaction_count, answerable_interaction_count) =
            assign_interaction_positions(fragments)?;

        let title = meta_string(&metadata, "title")
            .or_else(|| {
                fragments
                    .first()
                    .map(|f| f.html().trim().to_string())
                    .filter(|html| !html.is_empty())
            })
            .unwrap_or_else(|| origin.to_string());

        let science = match metadata.get("science") {
            Some(Value::Object(science)) => science.clone(),
            _ => Map::new(),
        };

        let pm = Pm {
            origin: normalize_origin(origin),
            origin_fn: origin_file_name(origin),
            class_at_school: meta_string(&metadata, "class_at_school"),
            theme: meta_string(&metadata, "theme"),
            theme_rdb: meta_string(&metadata, "theme_rdb"),
            chapter: meta_string(&metadata, "chapter"),
            chapter_rdb: meta_string(&metadata, "chapter_rdb"),
            mode: meta_string(&metadata, "mode"),
            b_type: meta_string(&metadata, "b_type"),
            js_dependencies: meta_strings(&metadata, "js_dependencies"),
            css_dependencies: meta_strings(&metadata, "css_dependencies"),
            toc,
            title,
            science,
            interaction_count,
            answerable_interaction_count,
            fragments,
            html_content: Some(html),
            metadata,
        };

        for diagnostic in builder.take_diagnostics() {
            report.add_diagnostic(diagnostic);
        }
        report.statistics.interaction_count = interaction_count;
        report.statistics.answerable_interaction_count = answerable_interaction_count;
        report.duration_ms = start_time.elapsed().as_millis() as u64;

        log::info!(
            "built {}: {} fragments, {} interactions, {} warnings",
            origin,
            pm.fragments.len(),
            interaction_count,
            report.statistics.warning_count
        );
        Ok(BuildOutput { pm, report })
    }
}

/// Number interactive fragments (and, separately, answerable ones) in
/// document order
fn assign_interaction_positions(
    fragments: Vec<Fragment>,
) -> BuildResult<(Vec<Fragment>, usize, usize)> {
    let mut interactions = 0;
    let mut answerable = 0;
    let mut numbered = Vec::with_capacity(fragments.len());

    for (position, fragment) in fragments.into_iter().enumerate() {
        let f_type = fragment.f_type();
        if !f_type.is_interactive() {
            numbered.push(fragment);
            continue;
        }
        let answerable_pos = f_type.is_answerable().then(|| {
            answerable += 1;
            answerable - 1
        });
        let fragment = fragment
            .with_positions(Some(interactions), answerable_pos)
            .map_err(|source| BuildError::InvalidFragment {
                position,
                tag: f_type.as_str().to_string(),
                source,
            })?;
        interactions += 1;
        numbered.push(fragment);
    }
    Ok((numbered, interactions, answerable))
}
