//! Attribute lists
//!
//! `{: .class #id key=value}` on the last line of a paragraph or list item, or
//! at the end of a heading line, sets attributes on that element. Applied on
//! the rendered HTML, after markdown parsing.
//!
//! Lists whose first token starts with a digit or `-` are not attribute lists:
//! `Paris{:20 .correct}` is radio-option syntax and is left alone.

use crate::dom;
use markup5ever_rcdom::Handle;
use regex::Regex;
use std::io;
use std::sync::LazyLock;

static BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\n[ ]*\{:?[ ]*([^:}\n \d-][^}\n]*)[ ]*\}[ ]*$").unwrap()
});
static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[ ]+\{:?[ ]*([^:}\n \d-][^}\n]*)[ ]*\}[ ]*$").unwrap()
});
static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\.([\w-]+)|#([\w-]+)|([\w-]+)=(?:"([^"]*)"|'([^']*)'|(\S+))"#).unwrap()
});

/// Parsed content of one attribute list
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AttrList {
    pub classes: Vec<String>,
    pub id: Option<String>,
    pub attrs: Vec<(String, String)>,
}

impl AttrList {
    pub fn parse(content: &str) -> Self {
        let mut list = AttrList::default();
        for caps in TOKEN.captures_iter(content) {
            if let Some(class) = caps.get(1) {
                list.classes.push(class.as_str().to_string());
            } else if let Some(id) = caps.get(2) {
                list.id = Some(id.as_str().to_string());
            } else if let Some(key) = caps.get(3) {
                let value = caps
                    .get(4)
                    .or_else(|| caps.get(5))
                    .or_else(|| caps.get(6))
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default();
                list.attrs.push((key.as_str().to_string(), value));
            }
        }
        list
    }

    fn apply(&self, handle: &Handle) {
        dom::add_classes(handle, &self.classes);
        if let Some(id) = &self.id {
            dom::set_attr(handle, "id", id);
        }
        for (key, value) in &self.attrs {
            if key == "class" {
                let extra: Vec<String> = value.split_whitespace().map(str::to_string).collect();
                dom::add_classes(handle, &extra);
            } else {
                dom::set_attr(handle, key, value);
            }
        }
    }
}

/// Split a trailing ` {: ...}` off a heading line
pub fn split_heading_attrs(text: &str) -> (&str, Option<AttrList>) {
    let Some(caps) = HEADER.captures(text) else {
        return (text, None);
    };
    match (caps.get(0), caps.get(1)) {
        (Some(whole), Some(content)) => (
            text[..whole.start()].trim_end(),
            Some(AttrList::parse(content.as_str())),
        ),
        _ => (text, None),
    }
}

/// Apply every attribute list found in `html` and return the rewritten HTML
pub fn apply_attr_lists(html: &str) -> io::Result<String> {
    let Some(root) = dom::parse_body_root(html) else {
        return Ok(html.to_string());
    };
    walk(&root);
    dom::inner_html(&root)
}

fn walk(handle: &Handle) {
    for child in handle.children.borrow().iter() {
        if dom::is_element(child) {
            apply_to(child);
            walk(child);
        }
    }
}

fn apply_to(handle: &Handle) {
    let Some(tag) = dom::tag_name(handle) else {
        return;
    };
    match tag.as_str() {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "dt" | "td" | "th" => {
            if let Some(text) = dom::last_text_child(handle) {
                consume(handle, &text, &HEADER);
            }
        }
        "li" => {
            if let Some(text) = text_before_sublist(handle) {
                consume(handle, &text, &BLOCK);
            }
        }
        "p" => {
            if let Some(text) = dom::last_text_child(handle) {
                consume(handle, &text, &BLOCK);
            }
        }
        _ => {}
    }
}

/// The text node holding the last line of a list item's own content
fn text_before_sublist(li: &Handle) -> Option<Handle> {
    let children = li.children.borrow();
    let sublist = children
        .iter()
        .position(|c| dom::is_tag(c, "ul") || dom::is_tag(c, "ol"));
    let own = match sublist {
        Some(pos) => &children[..pos],
        None => &children[..],
    };
    // skip the whitespace between the text and a nested list
    own.iter()
        .rev()
        .find(|c| !dom::text_of(c).is_some_and(|t| t.trim().is_empty()))
        .filter(|c| dom::text_of(c).is_some())
        .cloned()
}

fn consume(element: &Handle, text_node: &Handle, pattern: &Regex) {
    let Some(text) = dom::text_of(text_node) else {
        return;
    };
    let Some(caps) = pattern.captures(&text) else {
        return;
    };
    let (Some(whole), Some(content)) = (caps.get(0), caps.get(1)) else {
        return;
    };
    let list = AttrList::parse(content.as_str());
    let remaining = text[..whole.start()].trim_end().to_string();
    dom::set_text(text_node, &remaining);
    list.apply(element);
}
