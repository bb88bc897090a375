//! Abbreviations
//!
//! `*[HTML]: Hyper Text Markup Language` lines define abbreviations. The
//! definitions are removed from the text and every whole-word occurrence
//! outside code is wrapped in `<abbr title="...">`.

use regex::Regex;
use std::sync::LazyLock;

static DEFINITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\[([^\]]+)\]:[ \t]*(.*?)\s*$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abbreviation {
    pub abbr: String,
    pub title: String,
}

/// Remove abbreviation definitions (outside fenced code) from `markdown`
pub fn extract_definitions(markdown: &str) -> (Vec<Abbreviation>, String) {
    let mut abbreviations = Vec::new();
    let mut body = String::with_capacity(markdown.len());
    let mut fence: Option<String> = None;

    for line in markdown.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(marker) = &fence {
            if trimmed.starts_with(marker.as_str()) {
                fence = None;
            }
            body.push_str(line);
            continue;
        }
        if let Some(marker) = fence_marker(trimmed) {
            fence = Some(marker);
            body.push_str(line);
            continue;
        }
        if let Some(caps) = DEFINITION.captures(line) {
            abbreviations.push(Abbreviation {
                abbr: caps[1].to_string(),
                title: caps[2].to_string(),
            });
            continue;
        }
        body.push_str(line);
    }
    (abbreviations, body)
}

/// Opening fence marker (``` or ~~~, possibly longer) of a line
pub(crate) fn fence_marker(trimmed_line: &str) -> Option<String> {
    for ch in ['`', '~'] {
        let count = trimmed_line.chars().take_while(|c| *c == ch).count();
        if count >= 3 {
            return Some(std::iter::repeat(ch).take(count).collect());
        }
    }
    None
}

/// Matches any of the defined abbreviations as a whole word
pub struct AbbreviationMatcher {
    pattern: Regex,
    titles: Vec<Abbreviation>,
}

impl AbbreviationMatcher {
    pub fn new(abbreviations: Vec<Abbreviation>) -> Option<Self> {
        if abbreviations.is_empty() {
            return None;
        }
        let mut sorted = abbreviations;
        // longest first so that "HTML5" wins over "HTML"
        sorted.sort_by(|a, b| b.abbr.len().cmp(&a.abbr.len()));
        let alternatives: Vec<String> = sorted.iter().map(|a| regex::escape(&a.abbr)).collect();
        let pattern = Regex::new(&format!(r"\b(?:{})\b", alternatives.join("|"))).ok()?;
        Some(Self {
            pattern,
            titles: sorted,
        })
    }

    /// HTML for `text` with abbreviations wrapped, or `None` if nothing matched
    pub fn wrap(&self, text: &str) -> Option<String> {
        if !self.pattern.is_match(text) {
            return None;
        }
        let mut html = String::with_capacity(text.len() + 32);
        let mut last = 0;
        for m in self.pattern.find_iter(text) {
            html.push_str(&html_escape::encode_text(&text[last..m.start()]));
            let title = self
                .titles
                .iter()
                .find(|a| a.abbr == m.as_str())
                .map(|a| a.title.as_str())
                .unwrap_or_default();
            html.push_str(&format!(
                "<abbr title=\"{}\">{}</abbr>",
                html_escape::encode_double_quoted_attribute(title),
                html_escape::encode_text(m.as_str())
            ));
            last = m.end();
        }
        html.push_str(&html_escape::encode_text(&text[last..]));
        Some(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_definitions() {
        let md = "The PGCD is useful.\n\n*[PGCD]: Plus Grand Commun Diviseur\n";
        let (abbrs, body) = extract_definitions(md);
        assert_eq!(
            abbrs,
            vec![Abbreviation {
                abbr: "PGCD".to_string(),
                title: "Plus Grand Commun Diviseur".to_string(),
            }]
        );
        assert_eq!(body, "The PGCD is useful.\n\n");
    }

    #[test]
    fn test_definitions_inside_fences_are_kept() {
        let md = "```\n*[X]: not a definition\n```\n";
        let (abbrs, body) = extract_definitions(md);
        assert!(abbrs.is_empty());
        assert_eq!(body, md);
    }

    #[test]
    fn test_wrap_whole_words_only() {
        let matcher = AbbreviationMatcher::new(vec![Abbreviation {
            abbr: "PM".to_string(),
            title: "Pedagogical Markdown".to_string(),
        }])
        .unwrap();
        assert_eq!(
            matcher.wrap("A PM file & PMS").unwrap(),
            "A <abbr title=\"Pedagogical Markdown\">PM</abbr> file &amp; PMS"
        );
        assert!(matcher.wrap("nothing here").is_none());
    }
}
