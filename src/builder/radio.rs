//! Inline grammar of radio options
//!
//! An option is written `content{:flag classes | feedback}`:
//! - `flag` is an integer, `-1` marks a comment
//! - `classes` is a list of `.`-prefixed tokens
//! - `feedback` is optional text after a pipe
//!
//! Anything that does not match is a comment.

use regex::Regex;
use std::sync::LazyLock;

static OPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(.*?)\{:\s*(-?\d+)\s*([^|}]*?)\s*(?:\|\s*([^}]*?)\s*)?\}\s*$").unwrap()
});

pub const COMMENT_FLAG: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioSpec {
    Option {
        html: String,
        flag: i64,
        classes: String,
        feedback: Option<String>,
    },
    Comment(String),
}

impl RadioSpec {
    pub fn parse(item_html: &str) -> Self {
        let item_html = item_html.trim();
        let Some(caps) = OPTION.captures(item_html) else {
            return RadioSpec::Comment(item_html.to_string());
        };
        let html = strip_brackets(caps[1].trim()).to_string();
        let flag = match caps[2].parse::<i64>() {
            Ok(flag) if flag != COMMENT_FLAG => flag,
            _ => return RadioSpec::Comment(html),
        };
        let feedback = caps
            .get(4)
            .map(|m| m.as_str().to_string())
            .filter(|f| !f.is_empty());
        RadioSpec::Option {
            html,
            flag,
            classes: caps[3].trim().to_string(),
            feedback,
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, RadioSpec::Comment(_))
    }
}

/// `[Paris]` is the same option as `Paris`
fn strip_brackets(content: &str) -> &str {
    content
        .strip_prefix('[')
        .and_then(|c| c.strip_suffix(']'))
        .filter(|inner| !inner.contains('[') && !inner.contains(']'))
        .unwrap_or(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_without_feedback() {
        assert_eq!(
            RadioSpec::parse("Paris{:20 .correct}"),
            RadioSpec::Option {
                html: "Paris".to_string(),
                flag: 20,
                classes: ".correct".to_string(),
                feedback: None,
            }
        );
    }

    #[test]
    fn test_option_with_feedback() {
        assert_eq!(
            RadioSpec::parse("Lyon{:21 .wrong | Not quite}"),
            RadioSpec::Option {
                html: "Lyon".to_string(),
                flag: 21,
                classes: ".wrong".to_string(),
                feedback: Some("Not quite".to_string()),
            }
        );
    }

    #[test]
    fn test_bracketed_content() {
        match RadioSpec::parse("[Paris]{:20 .correct}") {
            RadioSpec::Option { html, .. } => assert_eq!(html, "Paris"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            RadioSpec::parse("Pick one city"),
            RadioSpec::Comment("Pick one city".to_string())
        );
        assert_eq!(
            RadioSpec::parse("Mind the trap{:-1}"),
            RadioSpec::Comment("Mind the trap".to_string())
        );
        assert!(RadioSpec::parse("text {: .cls}").is_comment());
    }

    #[test]
    fn test_flag_without_classes() {
        assert_eq!(
            RadioSpec::parse("<em>x</em>{:3}"),
            RadioSpec::Option {
                html: "<em>x</em>".to_string(),
                flag: 3,
                classes: String::new(),
                feedback: None,
            }
        );
    }
}
