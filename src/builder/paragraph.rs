//! Paragraphs, includes and dividers

use super::assets::AssetKind;
use super::layout::{directive_tokens, layout_from_tokens};
use super::FragmentBuilder;
use crate::dom;
use crate::error::BuildResult;
use crate::fragment::{FragmentData, FragmentFields};
use crate::ftype::FType;
use crate::report::DiagnosticKind;
use markup5ever_rcdom::Handle;

fn has_extension(src: &str, extension: &str) -> bool {
    let path = src.split(['?', '#']).next().unwrap_or(src);
    path.to_ascii_lowercase().ends_with(extension)
}

impl FragmentBuilder<'_> {
    pub(crate) fn from_paragraph(&mut self, tag: &Handle) -> BuildResult<FragmentFields> {
        let class_list = dom::classes(tag);
        let text = dom::text_content(tag);
        let text = text.trim();

        if let Some(tokens) = directive_tokens(text) {
            return Ok(divider_from_tokens(&tokens));
        }

        let children = dom::significant_children(tag);
        if let [only] = children.as_slice() {
            if dom::is_tag(only, "img") {
                return Ok(self.from_image(only)?.with_classes(class_list));
            }
        }

        if children.iter().all(|c| dom::text_of(c).is_some())
            && !text.contains(char::is_whitespace)
            && has_extension(text, ".html")
        {
            if let Some(fields) = self.include_html(text) {
                return Ok(fields.with_classes(class_list));
            }
        }

        Ok(FragmentFields::new(FType::Paragraph, dom::inner_html(tag)?, FragmentData::Empty).with_classes(class_list))
    }

    fn from_image(&mut self, img: &Handle) -> BuildResult<FragmentFields> {
        let src = dom::attr(img, "src").unwrap_or_default();
        let alt = dom::attr(img, "alt").unwrap_or_default();

        if has_extension(&src, ".svg") {
            match self.ctx.assets().read(&src, AssetKind::Svg) {
                Some(asset) => {
                    return Ok(FragmentFields::new(
                        FType::Svg,
                        "",
                        FragmentData::Svg {
                            src,
                            content: asset.content,
                        },
                    ))
                }
                None => self.missing_include(&src),
            }
        } else if has_extension(&src, ".html") {
            if let Some(fields) = self.include_html(&src) {
                return Ok(fields);
            }
        }
        Ok(FragmentFields::new(FType::Image, alt, FragmentData::Image { src }))
    }

    /// HTML fragment for an included file, `None` when it cannot be read
    fn include_html(&mut self, src: &str) -> Option<FragmentFields> {
        let Some(asset) = self.ctx.assets().read(src, AssetKind::Html) else {
            self.missing_include(src);
            return None;
        };
        let html = match self.ctx.renderer().render_string(&asset.content) {
            Ok(rendered) => rendered,
            Err(e) => {
                log::warn!("rendering {} failed: {}", asset.path.display(), e);
                self.warn(
                    DiagnosticKind::TemplateFallback,
                    format!("{}: {}", asset.path.display(), e),
                );
                asset.content
            }
        };
        Some(FragmentFields::new(FType::Html, html, FragmentData::Empty))
    }

    fn missing_include(&mut self, src: &str) {
        log::warn!("cannot read include {}", src);
        self.warn(DiagnosticKind::MissingInclude, format!("cannot read {}", src));
    }

    pub(crate) fn from_divider(&mut self, tag: &Handle) -> FragmentFields {
        divider_from_tokens(&dom::classes(tag))
    }
}

/// Divider carrying a column layout when one of `tokens` declares it, plain
/// classes otherwise
fn divider_from_tokens<S: AsRef<str>>(tokens: &[S]) -> FragmentFields {
    let divider = FragmentFields::new(FType::Divider, "", FragmentData::Empty);
    match layout_from_tokens(tokens) {
        Some(layout) => divider.with_layout(layout),
        None => divider.with_classes(
            tokens
                .iter()
                .map(|t| t.as_ref().trim_start_matches('.').to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::super::{BuildContext, HeadingCounterState};
    use super::*;
    use crate::config::PmConfig;
    use crate::fragment::{Fragment, Layout};
    use crate::report::BuildDiagnostic;
    use crate::template::RawTemplateRenderer;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn build_with(ctx: &BuildContext, html: &str) -> (FragmentFields, Vec<BuildDiagnostic>) {
        let mut builder = FragmentBuilder::new(ctx);
        let nodes = dom::parse_body_fragment(html);
        let (fields, _) = builder.from_tag(&nodes[0], HeadingCounterState::new()).unwrap();
        (fields, builder.take_diagnostics())
    }

    fn build(html: &str) -> (FragmentFields, Vec<BuildDiagnostic>) {
        build_with(&BuildContext::new(PmConfig::with_base_dir("/nonexistent")), html)
    }

    #[test]
    fn test_plain_paragraph() {
        let (fields, diagnostics) = build("<p class=\"lead\">Some <strong>text</strong>.</p>");
        assert_eq!(fields.f_type, FType::Paragraph);
        assert_eq!(fields.html, "Some <strong>text</strong>.");
        assert_eq!(fields.class_list, vec!["lead"]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_layout_directive() {
        let (fields, _) = build("<p>--- {: .pm-cols-md-2 .gap-4}</p>");
        assert_eq!(fields.f_type, FType::Divider);
        assert_eq!(
            fields.layout,
            Some(Layout::columns(Some("md".to_string()), 2, vec!["gap-4".to_string()]))
        );
        assert!(fields.class_list.is_empty());
        assert!(Fragment::new(fields).is_ok());
    }

    #[test]
    fn test_directive_and_hr_give_same_layout() {
        let (from_directive, _) = build("<p>---{: .pm-cols-3 .wide}</p>");
        let (from_hr, _) = build("<hr class=\"pm-cols-3 wide\">");
        assert_eq!(from_directive, from_hr);
    }

    #[test]
    fn test_directive_without_layout() {
        let (fields, _) = build("<p>--- {: .separator}</p>");
        assert_eq!(fields.f_type, FType::Divider);
        assert!(fields.layout.is_none());
        assert_eq!(fields.class_list, vec!["separator"]);
    }

    #[test]
    fn test_bare_hr() {
        let (fields, _) = build("<hr>");
        assert_eq!(fields, FragmentFields::new(FType::Divider, "", FragmentData::Empty));
    }

    #[test]
    fn test_image() {
        let (fields, _) = build("<p><img src=\"/static/a.png\" alt=\"A plot\"></p>");
        assert_eq!(fields.f_type, FType::Image);
        assert_eq!(fields.html, "A plot");
        assert_eq!(fields.data, FragmentData::Image { src: "/static/a.png".to_string() });
    }

    #[test]
    fn test_svg_include() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("static/img")).unwrap();
        fs::write(dir.path().join("static/img/c.svg"), "<svg><circle/></svg>").unwrap();
        let ctx = BuildContext::new(PmConfig::with_base_dir(dir.path()));

        let (fields, _) = build_with(&ctx, "<p><img src=\"/static/img/c.svg\" alt=\"\"></p>");
        assert_eq!(fields.f_type, FType::Svg);
        assert_eq!(
            fields.data,
            FragmentData::Svg {
                src: "/static/img/c.svg".to_string(),
                content: "<svg><circle/></svg>".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_svg_falls_back_to_image() {
        let (fields, diagnostics) = build("<p><img src=\"/static/none.svg\" alt=\"x\"></p>");
        assert_eq!(fields.f_type, FType::Image);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::MissingInclude);
    }

    #[test]
    fn test_html_include_renders_templates() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("templates")).unwrap();
        fs::create_dir_all(dir.path().join("static/widgets")).unwrap();
        fs::write(dir.path().join("templates/btn.html"), "<button>Go</button>").unwrap();
        fs::write(
            dir.path().join("static/widgets/w.html"),
            "<div>{% include \"btn.html\" %}</div>",
        )
        .unwrap();
        let ctx = BuildContext::new(PmConfig::with_base_dir(dir.path()));

        let (fields, _) = build_with(&ctx, "<p><img src=\"/static/widgets/w.html\" alt=\"\"></p>");
        assert_eq!(fields.f_type, FType::Html);
        assert_eq!(fields.html, "<div><button>Go</button></div>");

        let (fields, _) = build_with(&ctx, "<p>static/widgets/w.html</p>");
        assert_eq!(fields.f_type, FType::Html);

        let raw = BuildContext::with_renderer(
            PmConfig::with_base_dir(dir.path()),
            Arc::new(RawTemplateRenderer),
        );
        let (fields, _) = build_with(&raw, "<p>/static/widgets/w.html</p>");
        assert_eq!(fields.html, "<div>{% include \"btn.html\" %}</div>");
    }

    #[test]
    fn test_failed_render_keeps_raw_text() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("w.html"), "<i>{% include \"gone.html\" %}</i>").unwrap();
        let ctx = BuildContext::new(PmConfig::with_base_dir(dir.path()));
        let (fields, diagnostics) = build_with(&ctx, "<p>w.html</p>");
        assert_eq!(fields.f_type, FType::Html);
        assert_eq!(fields.html, "<i>{% include \"gone.html\" %}</i>");
        assert_eq!(diagnostics[0].kind, DiagnosticKind::TemplateFallback);
    }

    #[test]
    fn test_missing_bare_html_path_is_a_paragraph() {
        let (fields, diagnostics) = build("<p>parts/none.html</p>");
        assert_eq!(fields.f_type, FType::Paragraph);
        assert_eq!(fields.html, "parts/none.html");
        assert_eq!(diagnostics[0].kind, DiagnosticKind::MissingInclude);
    }
}
