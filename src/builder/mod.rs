//! Tag to fragment conversion
//!
//! [`FragmentBuilder::from_tag`] looks at one top-level element of the
//! converted document and returns the fields of the fragment it stands for.
//! Dispatch is on the tag name, in this order:
//!
//! 1. `ul`, `ol`: radio quiz, LBL list or plain list
//! 2. `h1`..`h4`: heading with slug and numbering
//! 3. `p`: layout directive, image/SVG/HTML include or paragraph
//! 4. `blockquote`
//! 5. `hr`: divider, possibly with a column layout
//! 6. `table`
//! 7. `pre`: code block or YAML widget
//! 8. `div.toc`: table of contents
//! 9. `script type="module"`
//!
//! Everything else is kept as a paragraph holding the element's inner HTML.

pub mod assets;
pub mod code;
pub mod codex;
pub mod heading;
pub mod layout;
pub mod list;
pub mod paragraph;
pub mod radio;
pub mod table;

use crate::config::PmConfig;
use crate::dom;
use crate::error::{BuildError, BuildResult};
use crate::fragment::{FragmentData, FragmentFields, HeadingData, ScriptModuleData};
use crate::ftype::FType;
use crate::report::{BuildDiagnostic, DiagnosticKind};
use crate::slug::SlugRegistry;
use crate::template::{IncludeTemplateRenderer, TemplateRenderer};
use assets::AssetResolver;
use code::YamlWidget;
use codex::CodexSections;
use markup5ever_rcdom::Handle;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::sync::Arc;

pub use heading::HeadingCounterState;
pub use radio::RadioSpec;

/// Everything the builder reads besides the document itself
#[derive(Clone)]
pub struct BuildContext {
    config: PmConfig,
    assets: AssetResolver,
    renderer: Arc<dyn TemplateRenderer>,
}

impl BuildContext {
    pub fn new(config: PmConfig) -> Self {
        let renderer = Arc::new(IncludeTemplateRenderer::new(config.template_dirs()));
        Self::with_renderer(config, renderer)
    }

    pub fn with_renderer(config: PmConfig, renderer: Arc<dyn TemplateRenderer>) -> Self {
        Self {
            assets: AssetResolver::new(&config),
            config,
            renderer,
        }
    }

    pub fn config(&self) -> &PmConfig {
        &self.config
    }

    pub fn assets(&self) -> &AssetResolver {
        &self.assets
    }

    pub fn renderer(&self) -> &dyn TemplateRenderer {
        self.renderer.as_ref()
    }

    fn codex_template(&self) -> BuildResult<Cow<'static, str>> {
        match &self.config.codex_template {
            Some(path) => std::fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|source| BuildError::CodexTemplate {
                    path: path.clone(),
                    source,
                }),
            None => Ok(Cow::Borrowed(codex::BUILTIN_TEMPLATE)),
        }
    }
}

impl std::fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Converts the top-level tags of one document, in order
pub struct FragmentBuilder<'c> {
    ctx: &'c BuildContext,
    slugs: SlugRegistry,
    diagnostics: Vec<BuildDiagnostic>,
    calls: usize,
    position: usize,
    tag: String,
}

impl<'c> FragmentBuilder<'c> {
    pub fn new(ctx: &'c BuildContext) -> Self {
        Self {
            ctx,
            slugs: SlugRegistry::new(),
            diagnostics: Vec::new(),
            calls: 0,
            position: 0,
            tag: String::new(),
        }
    }

    /// Fragment fields for `tag` and the heading counters after it
    pub fn from_tag(
        &mut self,
        tag: &Handle,
        counters: HeadingCounterState,
    ) -> BuildResult<(FragmentFields, HeadingCounterState)> {
        let name = dom::tag_name(tag).unwrap_or_default();
        self.position = self.calls;
        self.calls += 1;
        self.tag = name.clone();

        let fields = match name.as_str() {
            "ul" | "ol" => self.from_list(tag)?,
            "h1" | "h2" | "h3" | "h4" => return self.from_title(tag, counters),
            "p" => self.from_paragraph(tag)?,
            "blockquote" => self.from_blockquote(tag)?,
            "hr" => self.from_divider(tag),
            "table" => self.from_table(tag)?,
            "pre" => self.from_code(tag)?,
            "div" if dom::has_class(tag, "toc") => self.from_toc(tag)?,
            "script" if dom::attr(tag, "type").as_deref() == Some("module") => {
                self.from_script_module(tag)?
            }
            _ => {
                log::info!("<{}> not implemented, kept as a paragraph", name);
                self.warn(DiagnosticKind::UnknownTag, "not implemented, kept as a paragraph".to_string());
                FragmentFields::new(FType::Paragraph, dom::inner_html(tag)?, FragmentData::Empty)
            }
        };
        Ok((fields, counters))
    }

    /// Diagnostics recorded so far, leaving none behind
    pub fn take_diagnostics(&mut self) -> Vec<BuildDiagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn diagnostics(&self) -> &[BuildDiagnostic] {
        &self.diagnostics
    }

    pub(crate) fn warn(&mut self, kind: DiagnosticKind, message: String) {
        self.diagnostics.push(BuildDiagnostic {
            position: self.position,
            tag: self.tag.clone(),
            kind,
            message,
        });
    }

    fn from_title(
        &mut self,
        tag: &Handle,
        counters: HeadingCounterState,
    ) -> BuildResult<(FragmentFields, HeadingCounterState)> {
        let level = match dom::tag_name(tag).as_deref() {
            Some("h1") => 1,
            Some("h2") => 2,
            Some("h3") => 3,
            _ => 4,
        };
        let f_type = FType::from_heading_level(level).unwrap_or(FType::H4);
        let text = dom::text_content(tag).trim().to_string();
        let slug = match dom::attr(tag, "id").filter(|id| !id.is_empty()) {
            Some(id) => self.slugs.unique(id),
            None => self.slugs.slug_for(&text),
        };
        let (counters, h_lvl_count) = counters.advance(f_type);

        let fields = FragmentFields::new(
            f_type,
            dom::inner_html(tag)?,
            FragmentData::Heading(HeadingData { text, h_lvl_count }),
        )
        .with_classes(dom::classes(tag))
        .with_slug(slug);
        Ok((fields, counters))
    }

    fn from_blockquote(&mut self, tag: &Handle) -> BuildResult<FragmentFields> {
        Ok(
            FragmentFields::new(FType::Blockquote, dom::inner_html(tag)?.trim(), FragmentData::Empty)
                .with_classes(dom::classes(tag)),
        )
    }

    fn from_toc(&mut self, tag: &Handle) -> BuildResult<FragmentFields> {
        Ok(FragmentFields::new(FType::Toc, dom::outer_html(tag)?, FragmentData::Empty))
    }

    fn from_script_module(&mut self, tag: &Handle) -> BuildResult<FragmentFields> {
        let src = dom::attr(tag, "src").filter(|s| !s.is_empty());
        let content = match src {
            Some(_) => None,
            None => Some(dom::text_content(tag)),
        };
        let data = ScriptModuleData {
            content,
            src,
            module_type: dom::attr(tag, "type"),
            version: dom::attr(tag, "data-version"),
            f_type: dom::attr(tag, "data-f-type"),
        };
        Ok(
            FragmentFields::new(FType::ScriptModule, "", FragmentData::ScriptModule(data))
                .with_classes(dom::classes(tag)),
        )
    }

    fn from_code(&mut self, tag: &Handle) -> BuildResult<FragmentFields> {
        let code_el = dom::element_children(tag)
            .into_iter()
            .find(|c| dom::is_tag(c, "code"));
        let code_classes = code_el.as_ref().map(dom::classes).unwrap_or_default();
        let pre_classes = dom::classes(tag);
        let content = dom::text_content(code_el.as_ref().unwrap_or(tag));
        let language = code::language_of(&code_classes);

        let mut widget_classes = pre_classes.clone();
        widget_classes.extend(
            code_classes
                .into_iter()
                .filter(|c| !c.starts_with("language-")),
        );

        let fields = match language.as_str() {
            "yaml" => match code::classify_yaml(&content, &widget_classes) {
                Ok(YamlWidget::Plain) => {
                    FragmentFields::new(FType::Code, "", FragmentData::code(content, language))
                }
                Ok(YamlWidget::Codex(data)) => {
                    let data = self.compose_codex(data)?;
                    FragmentFields::new(FType::Codex, "", FragmentData::Widget(data))
                }
                Ok(widget) => {
                    let f_type = widget.f_type();
                    FragmentFields::new(f_type, "", FragmentData::Widget(widget.into_data()))
                }
                Err(diagnostic) => {
                    log::warn!("{}, kept as plain code", diagnostic);
                    self.warn(DiagnosticKind::YamlFallback, diagnostic.to_string());
                    FragmentFields::new(FType::Code, "", FragmentData::code(content, language))
                }
            },
            "html" => {
                let content = html_escape::decode_html_entities(&content).into_owned();
                FragmentFields::new(FType::Code, "", FragmentData::code(content, language))
            }
            _ => FragmentFields::new(FType::Code, "", FragmentData::code(content, language)),
        };
        Ok(fields.with_classes(pre_classes))
    }

    /// Load the script of a codex block and add its sections and the composed
    /// script to the block data
    fn compose_codex(&mut self, mut data: Map<String, Value>) -> BuildResult<Map<String, Value>> {
        let script_path = data
            .get("script_path")
            .and_then(Value::as_str)
            .ok_or(BuildError::CodexScriptPath)?;
        let path = self.ctx.config().files_dir().join(script_path.trim_start_matches('/'));
        let script = std::fs::read_to_string(&path)
            .map_err(|source| BuildError::CodexScript { path: path.clone(), source })?;
        log::debug!("codex script {}", path.display());

        let sections = CodexSections::split(&script);
        let composed = sections.compose(&self.ctx.codex_template()?);
        let CodexSections {
            foreground_script,
            background_script,
            public_checks,
            private_checks,
        } = sections;
        data.insert("foreground_script".to_string(), Value::String(foreground_script));
        data.insert("background_script".to_string(), Value::String(background_script));
        data.insert("public_checks".to_string(), Value::String(public_checks));
        data.insert("private_checks".to_string(), Value::String(private_checks));
        data.insert("composed_script".to_string(), Value::String(composed));
        Ok(data)
    }
}
