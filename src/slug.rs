//! Heading anchors
//!
//! Same algorithm as the python-markdown toc extension, so anchors of
//! existing content keep resolving: NFKD-normalize, drop non-ASCII, drop
//! anything that is not a word character, whitespace or `-`, lowercase, and
//! collapse runs of `-`/whitespace into a single `-`.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());
static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-\s]+").unwrap());
static ID_COUNT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.*)_([0-9]+)$").unwrap());

const FALLBACK_SLUG: &str = "section";

fn slugify_with(value: &str, ascii: bool) -> String {
    let value: String = if ascii {
        value.nfkd().filter(char::is_ascii).collect()
    } else {
        value.nfkc().collect()
    };
    let value = NON_WORD.replace_all(&value, "");
    let value = value.trim().to_lowercase();
    SEPARATORS.replace_all(&value, "-").into_owned()
}

/// URL-safe anchor for a heading text
pub fn slugify(text: &str) -> String {
    let slug = slugify_with(text, true);
    if !slug.is_empty() {
        return slug;
    }
    // headings made only of non-latin text or symbols
    let slug = slugify_with(text, false);
    if !slug.is_empty() {
        return slug;
    }
    FALLBACK_SLUG.to_string()
}

/// Hands out anchors that are unique within one document
#[derive(Debug, Default, Clone)]
pub struct SlugRegistry {
    seen: HashSet<String>,
}

impl SlugRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unique(&mut self, slug: String) -> String {
        let mut id = slug;
        while id.is_empty() || self.seen.contains(&id) {
            id = match ID_COUNT.captures(&id) {
                Some(caps) => {
                    let count: u64 = caps[2].parse().unwrap_or(0);
                    format!("{}_{}", &caps[1], count + 1)
                }
                None => format!("{}_1", id),
            };
        }
        self.seen.insert(id.clone());
        id
    }

    pub fn slug_for(&mut self, text: &str) -> String {
        self.unique(slugify(text))
    }
}
