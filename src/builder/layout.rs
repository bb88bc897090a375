//! Column layout directives (`pm-cols-2`, `pm-cols-md-3`, ...)

use crate::fragment::Layout;
use regex::Regex;
use std::sync::LazyLock;

static PM_COLS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^pm-cols-(?:(sm|md|lg)-)?(2|3)$").unwrap());

static DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^---\s*\{:?\s*([^}]*)\}$").unwrap());

/// Layout declared by a list of class tokens, the other tokens becoming utilities
pub fn layout_from_tokens<S: AsRef<str>>(tokens: &[S]) -> Option<Layout> {
    let mut declared = None;
    let mut utilities = Vec::new();
    for token in tokens {
        let token = token.as_ref().trim_start_matches('.');
        if token.is_empty() {
            continue;
        }
        if declared.is_none() {
            if let Some(caps) = PM_COLS.captures(token) {
                let breakpoint = caps.get(1).map(|m| m.as_str().to_string());
                let columns = if &caps[2] == "3" { 3 } else { 2 };
                declared = Some((breakpoint, columns));
                continue;
            }
        }
        utilities.push(token.to_string());
    }
    declared.map(|(breakpoint, columns)| Layout::columns(breakpoint, columns, utilities))
}

/// Tokens of a `--- {: ...}` directive paragraph
pub fn directive_tokens(text: &str) -> Option<Vec<String>> {
    let caps = DIRECTIVE.captures(text.trim())?;
    Some(caps[1].split_whitespace().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_with_breakpoint() {
        let layout = layout_from_tokens(&[".pm-cols-md-3", ".gap-2"]).unwrap();
        assert_eq!(layout.kind, "columns");
        assert_eq!(layout.breakpoint.as_deref(), Some("md"));
        assert_eq!(layout.columns, 3);
        assert_eq!(layout.utilities, vec!["gap-2"]);
    }

    #[test]
    fn test_layout_without_breakpoint() {
        let layout = layout_from_tokens(&["pm-cols-2"]).unwrap();
        assert_eq!(layout.breakpoint, None);
        assert_eq!(layout.columns, 2);
        assert!(layout.utilities.is_empty());
    }

    #[test]
    fn test_no_layout() {
        assert!(layout_from_tokens(&["pm-cols-4", "wide"]).is_none());
        assert!(layout_from_tokens::<&str>(&[]).is_none());
    }

    #[test]
    fn test_directive_tokens() {
        assert_eq!(
            directive_tokens("--- {: .pm-cols-2 .gap }"),
            Some(vec![".pm-cols-2".to_string(), ".gap".to_string()])
        );
        assert_eq!(directive_tokens("---{:.x}"), Some(vec![".x".to_string()]));
        assert!(directive_tokens("--- text").is_none());
    }
}
