//! Markdown to HTML conversion for PM documents
//!
//! pulldown-cmark does the CommonMark parsing; the extensions PM content relies
//! on are layered around it:
//! - full YAML front matter (`frontmatter`)
//! - abbreviations (`abbr`)
//! - table of contents with `[TOC]` (`toc`)
//! - fenced code info strings carrying classes
//! - attribute lists on paragraphs, list items and headings (`attr_list`)

pub mod abbr;
pub mod attr_list;
pub mod frontmatter;
pub mod toc;

use crate::error::BuildResult;
use abbr::AbbreviationMatcher;
use pulldown_cmark::{CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use serde_json::{Map, Value};
use toc::TocEntry;

/// HTML body and the sidecar data collected while converting
#[derive(Debug, Clone, Default)]
pub struct MarkdownOutput {
    pub html: String,
    pub metadata: Map<String, Value>,
    pub toc: Vec<TocEntry>,
}

fn parser_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options
}

/// Convert a PM markdown document to HTML
pub fn markdown_to_html(markdown: &str) -> BuildResult<MarkdownOutput> {
    let (metadata, body) = frontmatter::split_front_matter(markdown)?;
    let (abbreviations, body) = abbr::extract_definitions(body);
    let matcher = AbbreviationMatcher::new(abbreviations);

    let options = parser_options();
    let entries = toc::collect_headings(&body, options);
    let body = if body.contains(toc::TOC_MARKER) {
        toc::insert_toc(&body, &toc::render_toc(&entries))
    } else {
        body
    };

    let events = PmEvents::new(Parser::new_ext(&body, options), matcher.as_ref(), &entries);
    let mut html = String::with_capacity(body.len() * 3 / 2);
    pulldown_cmark::html::push_html(&mut html, events);

    let html = attr_list::apply_attr_lists(&html)?;
    log::debug!(
        "converted markdown: {} bytes of html, {} metadata keys, {} toc entries",
        html.len(),
        metadata.len(),
        entries.len()
    );

    Ok(MarkdownOutput {
        html,
        metadata,
        toc: entries,
    })
}

/// Class and id information of a fenced code block
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CodeInfo {
    pub language: Option<String>,
    pub classes: Vec<String>,
    pub id: Option<String>,
}

impl CodeInfo {
    /// Parse `lang .cls`, `{.lang .cls #id}` or `lang {.cls}`
    pub fn parse(info: &str) -> Self {
        let mut code_info = CodeInfo::default();
        let mut braced_classes = Vec::new();

        let (bare, braced) = match info.find('{') {
            Some(start) => {
                let end = info[start..].find('}').map(|e| start + e).unwrap_or(info.len());
                (&info[..start], &info[start + 1..end])
            }
            None => (info, ""),
        };

        for token in bare.split_whitespace() {
            if let Some(class) = token.strip_prefix('.') {
                code_info.classes.push(class.to_string());
            } else if let Some(id) = token.strip_prefix('#') {
                code_info.id = Some(id.to_string());
            } else if code_info.language.is_none() {
                code_info.language = Some(token.to_string());
            }
        }
        for token in braced.split_whitespace() {
            if let Some(class) = token.strip_prefix('.') {
                braced_classes.push(class.to_string());
            } else if let Some(id) = token.strip_prefix('#') {
                code_info.id = Some(id.to_string());
            }
        }
        // in the braced form the first class names the language
        if code_info.language.is_none() && !braced_classes.is_empty() {
            code_info.language = Some(braced_classes.remove(0));
        }
        code_info.classes.extend(braced_classes);
        code_info
    }

    fn open_tags(&self) -> String {
        let mut pre = String::from("<pre");
        if let Some(id) = &self.id {
            pre.push_str(&format!(" id=\"{}\"", html_escape::encode_double_quoted_attribute(id)));
        }
        if !self.classes.is_empty() {
            pre.push_str(&format!(
                " class=\"{}\"",
                html_escape::encode_double_quoted_attribute(&self.classes.join(" "))
            ));
        }
        pre.push_str("><code");
        if let Some(lang) = &self.language {
            pre.push_str(&format!(
                " class=\"language-{}\"",
                html_escape::encode_double_quoted_attribute(lang)
            ));
        }
        pre.push('>');
        pre
    }
}

/// Event adapter adding heading anchors, code block classes and abbreviations
struct PmEvents<'a, 'm> {
    inner: Parser<'a>,
    abbreviations: Option<&'m AbbreviationMatcher>,
    anchors: std::slice::Iter<'m, TocEntry>,
    container_depth: usize,
    in_code_block: bool,
}

impl<'a, 'm> PmEvents<'a, 'm> {
    fn new(
        inner: Parser<'a>,
        abbreviations: Option<&'m AbbreviationMatcher>,
        entries: &'m [TocEntry],
    ) -> Self {
        Self {
            inner,
            abbreviations,
            anchors: entries.iter(),
            container_depth: 0,
            in_code_block: false,
        }
    }
}

impl<'a> Iterator for PmEvents<'a, '_> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Event<'a>> {
        let event = self.inner.next()?;
        Some(match event {
            Event::Start(Tag::BlockQuote(kind)) => {
                self.container_depth += 1;
                Event::Start(Tag::BlockQuote(kind))
            }
            Event::Start(Tag::List(start)) => {
                self.container_depth += 1;
                Event::Start(Tag::List(start))
            }
            Event::End(TagEnd::BlockQuote(kind)) => {
                self.container_depth = self.container_depth.saturating_sub(1);
                Event::End(TagEnd::BlockQuote(kind))
            }
            Event::End(TagEnd::List(ordered)) => {
                self.container_depth = self.container_depth.saturating_sub(1);
                Event::End(TagEnd::List(ordered))
            }
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                let anchored = self.container_depth == 0
                    && matches!(
                        level,
                        HeadingLevel::H1 | HeadingLevel::H2 | HeadingLevel::H3 | HeadingLevel::H4
                    );
                let id = match (id, anchored) {
                    (Some(id), _) => Some(id),
                    (None, true) => self.anchors.next().map(|e| CowStr::from(e.id.clone())),
                    (None, false) => None,
                };
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                })
            }
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                self.in_code_block = true;
                Event::Html(CowStr::from(CodeInfo::parse(&info).open_tags()))
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                self.in_code_block = true;
                Event::Start(Tag::CodeBlock(kind))
            }
            Event::End(TagEnd::CodeBlock) => {
                self.in_code_block = false;
                Event::Html(CowStr::from("</code></pre>\n"))
            }
            Event::Text(text) if !self.in_code_block => {
                match self.abbreviations.and_then(|m| m.wrap(&text)) {
                    Some(html) => Event::InlineHtml(CowStr::from(html)),
                    None => Event::Text(text),
                }
            }
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_code_info_forms() {
        assert_eq!(
            CodeInfo::parse("yaml .i-maths"),
            CodeInfo {
                language: Some("yaml".to_string()),
                classes: vec!["i-maths".to_string()],
                id: None,
            }
        );
        assert_eq!(
            CodeInfo::parse("{.python .graph #g1}"),
            CodeInfo {
                language: Some("python".to_string()),
                classes: vec!["graph".to_string()],
                id: Some("g1".to_string()),
            }
        );
        assert_eq!(
            CodeInfo::parse("yaml {.table-variations}").classes,
            vec!["table-variations"]
        );
        assert_eq!(CodeInfo::parse(""), CodeInfo::default());
    }

    #[test]
    fn test_fenced_code_classes() {
        let out = markdown_to_html("```yaml .i-maths\na: 1 < 2\n```\n").unwrap();
        assert_eq!(
            out.html.trim(),
            "<pre class=\"i-maths\"><code class=\"language-yaml\">a: 1 &lt; 2\n</code></pre>"
        );
    }

    #[test]
    fn test_indented_code_block() {
        let out = markdown_to_html("    x = 1\n").unwrap();
        assert_eq!(out.html.trim(), "<pre><code>x = 1\n</code></pre>");
    }

    #[test]
    fn test_front_matter_and_headings() {
        let md = "---\ntitle: Fractions\n---\n## Intro\n\nSome **text**.\n";
        let out = markdown_to_html(md).unwrap();
        assert_eq!(out.metadata["title"], json!("Fractions"));
        assert!(out.html.contains("<h2 id=\"intro\">Intro</h2>"));
        assert!(out.html.contains("<p>Some <strong>text</strong>.</p>"));
    }

    #[test]
    fn test_toc_marker() {
        let md = "[TOC]\n\n## Un\n\n### Deux\n";
        let out = markdown_to_html(md).unwrap();
        assert!(out.html.starts_with("<div class=\"toc\"><ul><li><a href=\"#un\">Un</a>"));
        assert_eq!(out.toc.len(), 2);
    }

    #[test]
    fn test_abbreviations_outside_code() {
        let md = "Le PGCD et `PGCD`.\n\n*[PGCD]: Plus Grand Commun Diviseur\n";
        let out = markdown_to_html(md).unwrap();
        assert_eq!(
            out.html.trim(),
            "<p>Le <abbr title=\"Plus Grand Commun Diviseur\">PGCD</abbr> et <code>PGCD</code>.</p>"
        );
    }

    #[test]
    fn test_list_attr_list() {
        let md = "- Paris{:20 .correct}\n- Lyon{:21 .wrong}\n{: .i-radio}\n";
        let out = markdown_to_html(md).unwrap();
        assert!(out.html.contains("Paris{:20 .correct}"));
        assert!(out.html.contains("<li class=\"i-radio\">Lyon{:21 .wrong}</li>"));
    }

    #[test]
    fn test_tables_enabled() {
        let out = markdown_to_html("| A | B |\n|---|---|\n| 1 | 2 |\n").unwrap();
        assert!(out.html.contains("<table>"));
        assert!(out.html.contains("<th>A</th>"));
    }
}
