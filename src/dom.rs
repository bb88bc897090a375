//! Thin helpers over the html5ever reference DOM
//!
//! The builder works on the HTML produced by the markdown pipeline, parsed as a
//! body fragment. These helpers cover the handful of queries and edits it
//! needs: tag names, classes, attributes, text content and (inner/outer) HTML.

use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{parse_fragment, Attribute, LocalName, Namespace, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use std::io;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Parse an HTML fragment in a `<body>` context; the returned element holds the
/// parsed nodes as its children
pub fn parse_body_root(html: &str) -> Option<Handle> {
    let context = QualName::new(
        None,
        Namespace::from(HTML_NAMESPACE),
        LocalName::from("body"),
    );
    let dom = parse_fragment(RcDom::default(), ParseOpts::default(), context, Vec::new()).one(html);

    // the fragment parser wraps everything in a single <html> element. A
    // dropped rcdom node empties every node below it, so the root is detached
    // from the document before `dom` goes away.
    let root = detach_children(&dom.document).into_iter().next();
    root
}

/// Parse an HTML fragment in a `<body>` context and return its top-level nodes
pub fn parse_body_fragment(html: &str) -> Vec<Handle> {
    match parse_body_root(html) {
        Some(root) => detach_children(&root),
        None => Vec::new(),
    }
}

/// Take the children out of `parent`, so they outlive it
fn detach_children(parent: &Handle) -> Vec<Handle> {
    let children = std::mem::take(&mut *parent.children.borrow_mut());
    for child in &children {
        child.parent.set(None);
    }
    children
}

pub fn tag_name(handle: &Handle) -> Option<String> {
    match &handle.data {
        NodeData::Element { name, .. } => Some(name.local.to_string()),
        _ => None,
    }
}

pub fn is_element(handle: &Handle) -> bool {
    matches!(handle.data, NodeData::Element { .. })
}

pub fn is_tag(handle: &Handle, tag: &str) -> bool {
    match &handle.data {
        NodeData::Element { name, .. } => name.local.as_ref() == tag,
        _ => false,
    }
}

/// Text node containing only whitespace
pub fn is_blank_text(handle: &Handle) -> bool {
    match &handle.data {
        NodeData::Text { contents } => contents.borrow().trim().is_empty(),
        NodeData::Comment { .. } => true,
        _ => false,
    }
}

pub fn attr(handle: &Handle, attr_name: &str) -> Option<String> {
    match &handle.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| a.name.local.as_ref() == attr_name)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

/// Set (or replace) an attribute on an element
pub fn set_attr(handle: &Handle, attr_name: &str, value: &str) {
    if let NodeData::Element { attrs, .. } = &handle.data {
        let mut attrs = attrs.borrow_mut();
        if let Some(existing) = attrs.iter_mut().find(|a| a.name.local.as_ref() == attr_name) {
            existing.value = StrTendril::from(value);
        } else {
            attrs.push(Attribute {
                name: QualName::new(None, Namespace::from(""), LocalName::from(attr_name)),
                value: StrTendril::from(value),
            });
        }
    }
}

pub fn remove_attr(handle: &Handle, attr_name: &str) {
    if let NodeData::Element { attrs, .. } = &handle.data {
        attrs
            .borrow_mut()
            .retain(|a| a.name.local.as_ref() != attr_name);
    }
}

pub fn classes(handle: &Handle) -> Vec<String> {
    attr(handle, "class")
        .map(|c| c.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

pub fn has_class(handle: &Handle, class: &str) -> bool {
    classes(handle).iter().any(|c| c == class)
}

pub fn add_classes(handle: &Handle, extra: &[String]) {
    if extra.is_empty() {
        return;
    }
    let mut all = classes(handle);
    for class in extra {
        if !all.contains(class) {
            all.push(class.clone());
        }
    }
    set_attr(handle, "class", &all.join(" "));
}

pub fn element_children(handle: &Handle) -> Vec<Handle> {
    handle
        .children
        .borrow()
        .iter()
        .filter(|c| is_element(c))
        .cloned()
        .collect()
}

/// Children that are neither comments nor whitespace-only text
pub fn significant_children(handle: &Handle) -> Vec<Handle> {
    handle
        .children
        .borrow()
        .iter()
        .filter(|c| !is_blank_text(c))
        .cloned()
        .collect()
}

/// Every element below `handle` (depth first, document order) with the given tag
pub fn descendants_by_tag(handle: &Handle, tag: &str) -> Vec<Handle> {
    let mut found = Vec::new();
    collect_by_tag(handle, tag, &mut found);
    found
}

fn collect_by_tag(handle: &Handle, tag: &str, found: &mut Vec<Handle>) {
    for child in handle.children.borrow().iter() {
        if is_tag(child, tag) {
            found.push(child.clone());
        }
        collect_by_tag(child, tag, found);
    }
}

pub fn text_content(handle: &Handle) -> String {
    let mut text = String::new();
    push_text(handle, &mut text);
    text
}

fn push_text(handle: &Handle, text: &mut String) {
    match &handle.data {
        NodeData::Text { contents } => text.push_str(&contents.borrow()),
        _ => {
            for child in handle.children.borrow().iter() {
                push_text(child, text);
            }
        }
    }
}

pub fn set_text(handle: &Handle, value: &str) {
    if let NodeData::Text { contents } = &handle.data {
        *contents.borrow_mut() = StrTendril::from(value);
    }
}

pub fn last_text_child(handle: &Handle) -> Option<Handle> {
    handle
        .children
        .borrow()
        .last()
        .filter(|c| matches!(c.data, NodeData::Text { .. }))
        .cloned()
}

pub fn text_of(handle: &Handle) -> Option<String> {
    match &handle.data {
        NodeData::Text { contents } => Some(contents.borrow().to_string()),
        _ => None,
    }
}

pub fn inner_html(handle: &Handle) -> io::Result<String> {
    to_html(handle, TraversalScope::ChildrenOnly(None))
}

pub fn outer_html(handle: &Handle) -> io::Result<String> {
    to_html(handle, TraversalScope::IncludeNode)
}

fn to_html(handle: &Handle, traversal_scope: TraversalScope) -> io::Result<String> {
    let mut out = Vec::new();
    let serializable: SerializableHandle = handle.clone().into();
    serialize(
        &mut out,
        &serializable,
        SerializeOpts {
            traversal_scope,
            ..Default::default()
        },
    )?;
    String::from_utf8(out).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_body_fragment_top_level_only() {
        let nodes = parse_body_fragment("<h2>Title</h2>\n<p>a <em>b</em></p>");
        let tags: Vec<String> = nodes.iter().filter_map(tag_name).collect();
        assert_eq!(tags, vec!["h2", "p"]);
    }

    #[test]
    fn test_parsed_nodes_outlive_the_dom() {
        let root = parse_body_root("<p>a</p><h2>b <em>c</em></h2>").unwrap();
        assert_eq!(tag_name(&root).as_deref(), Some("html"));
        assert_eq!(root.children.borrow().len(), 2);

        let nodes = parse_body_fragment("<p>a</p><h2>b <em>c</em></h2>");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].children.borrow().len(), 2);
        assert_eq!(text_content(&nodes[1]), "b c");
        assert!(parse_body_fragment("").is_empty());
    }

    #[test]
    fn test_inner_and_outer_html() {
        let nodes = parse_body_fragment("<p class=\"x\">a <em>b</em></p>");
        assert_eq!(inner_html(&nodes[0]).unwrap(), "a <em>b</em>");
        assert_eq!(outer_html(&nodes[0]).unwrap(), "<p class=\"x\">a <em>b</em></p>");
    }

    #[test]
    fn test_classes_and_attrs() {
        let nodes = parse_body_fragment("<ul class=\"lbl big\"><li>a</li></ul>");
        let ul = &nodes[0];
        assert!(has_class(ul, "lbl"));
        add_classes(ul, &["wide".to_string(), "lbl".to_string()]);
        assert_eq!(classes(ul), vec!["lbl", "big", "wide"]);
        remove_attr(ul, "class");
        assert!(classes(ul).is_empty());
        set_attr(ul, "id", "list");
        assert_eq!(attr(ul, "id").as_deref(), Some("list"));
    }

    #[test]
    fn test_text_content_and_descendants() {
        let nodes = parse_body_fragment("<table><tr><th>A</th><th>B <b>c</b></th></tr></table>");
        assert_eq!(text_content(&nodes[0]), "AB c");
        assert_eq!(descendants_by_tag(&nodes[0], "th").len(), 2);
    }
}
