//! Lists: radio quizzes, LBL lists and plain lists

use super::radio::RadioSpec;
use super::FragmentBuilder;
use crate::dom;
use crate::error::BuildResult;
use crate::fragment::{FragmentData, FragmentFields, LblList, ListItem, RadioData, RadioItem};
use crate::ftype::FType;
use crate::report::DiagnosticKind;
use crate::slug::slugify;
use markup5ever_rcdom::Handle;
use regex::Regex;
use std::sync::LazyLock;

static REVEAL_FIRST_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^reveal-first-(\d+)$").unwrap());

const RADIO_CLASS: &str = "i-radio";
const LBL_CLASS: &str = "lbl";

fn list_items(list: &Handle) -> Vec<Handle> {
    dom::element_children(list)
        .into_iter()
        .filter(|c| dom::is_tag(c, "li"))
        .collect()
}

fn has_class_anywhere(list: &Handle, items: &[Handle], class: &str) -> bool {
    dom::has_class(list, class) || items.iter().any(|li| dom::has_class(li, class))
}

impl FragmentBuilder<'_> {
    pub(crate) fn from_list(&mut self, tag: &Handle) -> BuildResult<FragmentFields> {
        let items = list_items(tag);
        let class_list = dom::classes(tag);

        if has_class_anywhere(tag, &items, RADIO_CLASS) {
            return self.from_radio_list(&items, class_list);
        }
        if has_class_anywhere(tag, &items, LBL_CLASS) {
            let list = LblList {
                items: parse_list(tag)?,
                reveal_first: reveal_first(tag, &items),
            };
            return Ok(FragmentFields::new(FType::Lbl, "", FragmentData::List(list)).with_classes(class_list));
        }

        let f_type = if dom::is_tag(tag, "ol") {
            FType::NumberedList
        } else {
            FType::List
        };
        dom::remove_attr(tag, "class");
        for li in dom::descendants_by_tag(tag, "li") {
            dom::remove_attr(&li, "class");
        }
        Ok(FragmentFields::new(f_type, dom::outer_html(tag)?, FragmentData::Empty).with_classes(class_list))
    }

    fn from_radio_list(&mut self, items: &[Handle], class_list: Vec<String>) -> BuildResult<FragmentFields> {
        let mut radios = Vec::new();
        let mut comments = Vec::new();

        for (pos, li) in items.iter().enumerate() {
            let html = radio_item_html(li)?;
            match RadioSpec::parse(&html) {
                RadioSpec::Option {
                    html,
                    flag,
                    classes,
                    feedback,
                } => radios.push(RadioItem {
                    name: slugify(&html),
                    flag,
                    html,
                    classes,
                    pos,
                    feedback,
                }),
                RadioSpec::Comment(text) => {
                    if !html.contains("{:-1") {
                        log::debug!("radio item {} has no flag, kept as a comment", pos);
                        self.warn(
                            DiagnosticKind::RadioComment,
                            format!("item {} has no flag, kept as a comment", pos),
                        );
                    }
                    comments.push(text);
                }
            }
        }

        let comment = (!comments.is_empty()).then(|| comments.join("\n"));
        Ok(
            FragmentFields::new(FType::Radio, "", FragmentData::Radio(RadioData { radios, comment }))
                .with_classes(class_list),
        )
    }
}

/// Inner HTML of a radio item, without the paragraph of a loose list
fn radio_item_html(li: &Handle) -> BuildResult<String> {
    let children = dom::significant_children(li);
    if let [only] = children.as_slice() {
        if dom::is_tag(only, "p") {
            return Ok(dom::inner_html(only)?.trim().to_string());
        }
    }
    Ok(dom::inner_html(li)?.trim().to_string())
}

/// Items of a list with their nested lists, recursively
pub fn parse_list(list: &Handle) -> BuildResult<Vec<ListItem>> {
    let mut items = Vec::new();
    for li in list_items(list) {
        let mut html = String::new();
        let mut children = None;
        for child in li.children.borrow().iter() {
            if dom::is_tag(child, "ul") || dom::is_tag(child, "ol") {
                if children.is_none() {
                    children = Some(parse_list(child)?);
                }
            } else {
                html.push_str(&dom::outer_html(child)?);
            }
        }
        items.push(ListItem {
            html: html.trim().to_string(),
            children,
        });
    }
    Ok(items)
}

/// Number of items shown before the first reveal step
pub fn reveal_first(list: &Handle, items: &[Handle]) -> u32 {
    reveal_first_of(list)
        .or_else(|| items.first().and_then(reveal_first_of))
        .unwrap_or(0)
}

fn reveal_first_of(element: &Handle) -> Option<u32> {
    dom::attr(element, "reveal-first")
        .or_else(|| dom::attr(element, "data-reveal-first"))
        .and_then(|v| v.trim().parse().ok())
        .or_else(|| {
            dom::classes(element).iter().find_map(|c| {
                REVEAL_FIRST_CLASS
                    .captures(c)
                    .and_then(|caps| caps[1].parse().ok())
            })
        })
}
