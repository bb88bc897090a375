//! Table of contents
//!
//! Headings h1-h4 that sit at the top level of the document are collected with
//! their anchors; a `[TOC]` paragraph is replaced by a nested list of links to
//! them, wrapped in `<div class="toc">`.

use super::abbr::fence_marker;
use super::attr_list::split_heading_attrs;
use crate::slug::SlugRegistry;
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use serde::Serialize;

pub const TOC_MARKER: &str = "[TOC]";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub level: u8,
    pub text: String,
    pub id: String,
}

pub fn collect_headings(markdown: &str, options: Options) -> Vec<TocEntry> {
    let mut entries = Vec::new();
    let mut slugs = SlugRegistry::new();
    let mut container_depth: usize = 0;
    let mut current: Option<(u8, String)> = None;

    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Start(Tag::BlockQuote(_)) | Event::Start(Tag::List(_)) => container_depth += 1,
            Event::End(TagEnd::BlockQuote(_)) | Event::End(TagEnd::List(_)) => {
                container_depth = container_depth.saturating_sub(1)
            }
            Event::Start(Tag::Heading { level, .. }) if container_depth == 0 => {
                let level = match level {
                    HeadingLevel::H1 => 1,
                    HeadingLevel::H2 => 2,
                    HeadingLevel::H3 => 3,
                    HeadingLevel::H4 => 4,
                    _ => continue,
                };
                current = Some((level, String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, buffer)) = current.as_mut() {
                    buffer.push_str(&text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, text)) = current.take() {
                    // an explicit `{: #id}` is the anchor the heading ends up with
                    let (text, attrs) = split_heading_attrs(text.trim());
                    let text = text.trim().to_string();
                    let id = match attrs.and_then(|a| a.id) {
                        Some(id) => slugs.unique(id),
                        None => slugs.slug_for(&text),
                    };
                    entries.push(TocEntry { level, text, id });
                }
            }
            _ => {}
        }
    }
    entries
}

/// Nested `<ul>` of links, on a single line so it stays one HTML block
pub fn render_toc(entries: &[TocEntry]) -> String {
    let mut html = String::from("<div class=\"toc\">");
    let mut open: Vec<u8> = Vec::new();

    for entry in entries {
        if open.is_empty() {
            html.push_str("<ul>");
            open.push(entry.level);
        } else {
            let current = open.last().copied().unwrap_or(entry.level);
            if entry.level > current {
                html.push_str("<ul>");
                open.push(entry.level);
            } else {
                html.push_str("</li>");
                while open.len() > 1 && open.last().is_some_and(|l| *l > entry.level) {
                    open.pop();
                    html.push_str("</ul></li>");
                }
            }
        }
        html.push_str(&format!(
            "<li><a href=\"#{}\">{}</a>",
            html_escape::encode_double_quoted_attribute(&entry.id),
            html_escape::encode_text(&entry.text)
        ));
    }
    if !open.is_empty() {
        html.push_str("</li>");
        while open.len() > 1 {
            open.pop();
            html.push_str("</ul></li>");
        }
        html.push_str("</ul>");
    }
    html.push_str("</div>");
    html
}

/// Replace every `[TOC]` line (outside fenced code) with the rendered table
pub fn insert_toc(markdown: &str, toc_html: &str) -> String {
    let mut out = String::with_capacity(markdown.len() + toc_html.len());
    let mut fence: Option<String> = None;

    for line in markdown.split_inclusive('\n') {
        let trimmed = line.trim();
        if let Some(marker) = &fence {
            if trimmed.starts_with(marker.as_str()) {
                fence = None;
            }
            out.push_str(line);
            continue;
        }
        if let Some(marker) = fence_marker(trimmed) {
            fence = Some(marker);
            out.push_str(line);
            continue;
        }
        if trimmed == TOC_MARKER {
            out.push('\n');
            out.push_str(toc_html);
            out.push_str("\n\n");
        } else {
            out.push_str(line);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_top_level_headings() {
        let md = "# Cours\n\n## Intro {: .x}\n\n> ## quoted\n\n### Détails\n\n## Intro\n";
        let entries = collect_headings(md, Options::empty());
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["cours", "intro", "details", "intro_1"]);
        assert_eq!(entries[1].text, "Intro");
    }

    #[test]
    fn test_explicit_heading_id_is_the_anchor() {
        let md = "## Intro {: #start }\n\n## Start\n\n## Suite {: .x #fin}\n";
        let entries = collect_headings(md, Options::empty());
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["start", "start_1", "fin"]);
        assert_eq!(entries[0].text, "Intro");
    }

    #[test]
    fn test_render_nested_toc() {
        let entries = vec![
            TocEntry { level: 2, text: "A".into(), id: "a".into() },
            TocEntry { level: 3, text: "A.1".into(), id: "a1".into() },
            TocEntry { level: 2, text: "B".into(), id: "b".into() },
        ];
        assert_eq!(
            render_toc(&entries),
            "<div class=\"toc\"><ul><li><a href=\"#a\">A</a><ul><li><a href=\"#a1\">A.1</a></li></ul></li><li><a href=\"#b\">B</a></li></ul></div>"
        );
    }

    #[test]
    fn test_insert_toc_skips_fences() {
        let md = "[TOC]\n\n```\n[TOC]\n```\n";
        let out = insert_toc(md, "<div class=\"toc\"></div>");
        assert!(out.starts_with("\n<div class=\"toc\"></div>\n\n"));
        assert!(out.contains("```\n[TOC]\n```"));
    }
}
