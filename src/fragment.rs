//! Validated fragment record
//!
//! A [`Fragment`] is one content unit of a PM document. Its payload is a typed
//! [`FragmentData`] and the combination of `f_type`, `html` and `data` is checked
//! once, at construction. A fragment is never mutated afterwards; use
//! [`Fragment::with_positions`] to get an updated copy.

use crate::ftype::{FType, UnknownFType};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{f_type}: data must be empty")]
    DataNotEmpty { f_type: FType },
    #[error("{f_type}: html must be empty")]
    HtmlNotEmpty { f_type: FType },
    #[error("{f_type}: expected {expected} data")]
    UnexpectedData {
        f_type: FType,
        expected: &'static str,
    },
    #[error("{f_type}: data must hold a single `list` entry with empty html, or html with empty data")]
    ListShape { f_type: FType },
    #[error("{f_type}: heading data must have 1 or 2 entries, found {count}")]
    HeadingEntries { f_type: FType, count: usize },
    #[error("{f_type}: unexpected data keys {keys:?}, allowed {allowed:?}")]
    UnexpectedKeys {
        f_type: FType,
        keys: Vec<String>,
        allowed: Vec<&'static str>,
    },
    #[error("{f_type}: missing data key `{key}`")]
    MissingKey { f_type: FType, key: &'static str },
    #[error("script module data must have exactly one of `content` or `src`")]
    ScriptModuleSource,
    #[error("{f_type}: layout is only allowed on dividers")]
    LayoutNotAllowed { f_type: FType },
    #[error("{f_type}: slug is only allowed on headings")]
    SlugNotAllowed { f_type: FType },
    #[error("invalid field `{field}`: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
    #[error(transparent)]
    UnknownFType(#[from] UnknownFType),
}

/// Column layout attached to dividers created from `pm-cols-*` directives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Layout {
    #[serde(rename = "type")]
    pub kind: String,
    pub breakpoint: Option<String>,
    pub columns: u8,
    pub utilities: Vec<String>,
}

impl Layout {
    pub fn columns(breakpoint: Option<String>, columns: u8, utilities: Vec<String>) -> Self {
        Self {
            kind: "columns".to_string(),
            breakpoint,
            columns,
            utilities,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeadingData {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h_lvl_count: Option<String>,
}

/// One entry of a nested LBL list, serialized as `{item_html: sublist_or_null}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub html: String,
    pub children: Option<Vec<ListItem>>,
}

impl Serialize for ListItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.html, &self.children)?;
        map.end()
    }
}

impl ListItem {
    fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let invalid = |message: &str| ValidationError::InvalidField {
            field: "list",
            message: message.to_string(),
        };
        let obj = value
            .as_object()
            .ok_or_else(|| invalid("list item must be an object"))?;
        if obj.len() != 1 {
            return Err(invalid("list item must have exactly one entry"));
        }
        let (html, sub) = obj
            .iter()
            .next()
            .ok_or_else(|| invalid("list item must have exactly one entry"))?;
        let children = match sub {
            Value::Null => None,
            Value::Array(items) => Some(
                items
                    .iter()
                    .map(ListItem::from_value)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            _ => return Err(invalid("sublist must be an array or null")),
        };
        Ok(Self {
            html: html.clone(),
            children,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LblList {
    pub items: Vec<ListItem>,
    pub reveal_first: u32,
}

impl LblList {
    fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let invalid = |message: &str| ValidationError::InvalidField {
            field: "list",
            message: message.to_string(),
        };
        let obj = value
            .as_object()
            .ok_or_else(|| invalid("list must be an object"))?;
        let items = obj
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| invalid("list.items must be an array"))?
            .iter()
            .map(ListItem::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        let reveal_first = match obj.get("reveal_first") {
            None | Some(Value::Null) => 0,
            Some(v) => v
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| invalid("list.reveal_first must be a non-negative integer"))?,
        };
        Ok(Self {
            items,
            reveal_first,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RadioItem {
    pub name: String,
    pub flag: i64,
    pub html: String,
    pub classes: String,
    pub pos: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RadioData {
    pub radios: Vec<RadioItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptModuleData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub module_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "fType", default, skip_serializing_if = "Option::is_none")]
    pub f_type: Option<String>,
}

/// Type-specific payload of a fragment
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FragmentData {
    #[default]
    Empty,
    Heading(HeadingData),
    List(LblList),
    Table(TableData),
    Image { src: String },
    Svg { src: String, content: String },
    Code { content: String, language: String },
    Radio(RadioData),
    /// Free-form payload declared in YAML (maths, graph, tabvar, number, codex)
    Widget(Map<String, Value>),
    ScriptModule(ScriptModuleData),
}

impl Serialize for FragmentData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FragmentData::Empty => serializer.serialize_map(Some(0))?.end(),
            FragmentData::Heading(d) => d.serialize(serializer),
            FragmentData::List(list) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("list", list)?;
                map.end()
            }
            FragmentData::Table(d) => d.serialize(serializer),
            FragmentData::Image { src } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("src", src)?;
                map.end()
            }
            FragmentData::Svg { src, content } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("src", src)?;
                map.serialize_entry("content", content)?;
                map.end()
            }
            FragmentData::Code { content, language } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("content", content)?;
                map.serialize_entry("language", language)?;
                map.end()
            }
            FragmentData::Radio(d) => d.serialize(serializer),
            FragmentData::Widget(m) => m.serialize(serializer),
            FragmentData::ScriptModule(d) => d.serialize(serializer),
        }
    }
}

impl FragmentData {
    pub fn is_empty(&self) -> bool {
        match self {
            FragmentData::Empty => true,
            FragmentData::Widget(m) => m.is_empty(),
            _ => false,
        }
    }

    pub fn code(content: impl Into<String>, language: impl Into<String>) -> Self {
        FragmentData::Code {
            content: content.into(),
            language: language.into(),
        }
    }

    /// Convert a loose JSON object into the payload expected for `f_type`,
    /// checking key sets the way the typed variants cannot.
    pub fn from_map(
        f_type: FType,
        html_is_empty: bool,
        map: &Map<String, Value>,
    ) -> Result<Self, ValidationError> {
        if map.is_empty() {
            return Ok(FragmentData::Empty);
        }
        match f_type {
            FType::Toc | FType::Paragraph | FType::Blockquote | FType::Divider => {
                Err(ValidationError::DataNotEmpty { f_type })
            }
            FType::H1 | FType::H2 | FType::H3 | FType::H4 => {
                if map.len() > 2 {
                    return Err(ValidationError::HeadingEntries {
                        f_type,
                        count: map.len(),
                    });
                }
                Ok(FragmentData::Heading(deserialize_data(map)?))
            }
            FType::List | FType::NumberedList | FType::Lbl => {
                check_keys(f_type, map, &["list"], &["list"])?;
                Ok(FragmentData::List(LblList::from_value(&map["list"])?))
            }
            FType::Table => {
                if !html_is_empty && check_keys(f_type, map, &["headers", "rows"], &["headers", "rows"]).is_err() {
                    return Ok(FragmentData::Widget(map.clone()));
                }
                check_keys(f_type, map, &["headers", "rows"], &["headers", "rows"])?;
                Ok(FragmentData::Table(deserialize_data(map)?))
            }
            FType::Image => {
                check_keys(f_type, map, &["src"], &["src"])?;
                Ok(FragmentData::Image {
                    src: string_key(map, "src")?,
                })
            }
            FType::Svg => {
                check_keys(f_type, map, &["src", "content"], &["src", "content"])?;
                Ok(FragmentData::Svg {
                    src: string_key(map, "src")?,
                    content: string_key(map, "content")?,
                })
            }
            FType::Code => {
                check_keys(f_type, map, &["content", "language"], &["content", "language"])?;
                Ok(FragmentData::code(
                    string_key(map, "content")?,
                    string_key(map, "language")?,
                ))
            }
            FType::Radio => {
                check_keys(f_type, map, &["radios"], &["radios", "comment"])?;
                Ok(FragmentData::Radio(deserialize_data(map)?))
            }
            FType::ScriptModule => {
                check_keys(
                    f_type,
                    map,
                    &[],
                    &["content", "src", "type", "version", "fType"],
                )?;
                Ok(FragmentData::ScriptModule(deserialize_data(map)?))
            }
            FType::Html
            | FType::Tabvar
            | FType::Maths
            | FType::Graph
            | FType::Codex
            | FType::Number => Ok(FragmentData::Widget(map.clone())),
        }
    }
}

fn check_keys(
    f_type: FType,
    map: &Map<String, Value>,
    required: &[&'static str],
    allowed: &[&'static str],
) -> Result<(), ValidationError> {
    for key in required {
        if !map.contains_key(*key) {
            return Err(ValidationError::MissingKey { f_type, key });
        }
    }
    let unexpected: Vec<String> = map
        .keys()
        .filter(|k| !allowed.contains(&k.as_str()))
        .cloned()
        .collect();
    if !unexpected.is_empty() {
        return Err(ValidationError::UnexpectedKeys {
            f_type,
            keys: unexpected,
            allowed: allowed.to_vec(),
        });
    }
    Ok(())
}

fn string_key(map: &Map<String, Value>, key: &'static str) -> Result<String, ValidationError> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ValidationError::InvalidField {
            field: key,
            message: "expected a string".to_string(),
        })
}

fn deserialize_data<T: serde::de::DeserializeOwned>(
    map: &Map<String, Value>,
) -> Result<T, ValidationError> {
    serde_json::from_value(Value::Object(map.clone())).map_err(|e| ValidationError::InvalidField {
        field: "data",
        message: e.to_string(),
    })
}

/// Unvalidated fragment fields, as produced by the builder
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentFields {
    pub f_type: FType,
    pub html: String,
    pub data: FragmentData,
    pub class_list: Vec<String>,
    pub layout: Option<Layout>,
    pub slug: Option<String>,
    pub interaction_pos: Option<usize>,
    pub answerable_interaction_pos: Option<usize>,
}

impl FragmentFields {
    pub fn new(f_type: FType, html: impl Into<String>, data: FragmentData) -> Self {
        Self {
            f_type,
            html: html.into(),
            data,
            class_list: Vec::new(),
            layout: None,
            slug: None,
            interaction_pos: None,
            answerable_interaction_pos: None,
        }
    }

    pub fn with_classes(mut self, class_list: Vec<String>) -> Self {
        self.class_list = class_list;
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn with_slug(mut self, slug: String) -> Self {
        self.slug = Some(slug);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    f_type: FType,
    html: String,
    data: FragmentData,
    class_list: Vec<String>,
    layout: Option<Layout>,
    slug: Option<String>,
    interaction_pos: Option<usize>,
    answerable_interaction_pos: Option<usize>,
}

impl Fragment {
    pub fn new(fields: FragmentFields) -> Result<Self, ValidationError> {
        validate(&fields)?;
        let FragmentFields {
            f_type,
            html,
            data,
            class_list,
            layout,
            slug,
            interaction_pos,
            answerable_interaction_pos,
        } = fields;
        Ok(Self {
            f_type,
            html,
            data,
            class_list,
            layout,
            slug,
            interaction_pos,
            answerable_interaction_pos,
        })
    }

    /// Build a fragment from its serialized form (the output of [`Fragment::to_dict`])
    pub fn from_dict(map: &Map<String, Value>) -> Result<Self, ValidationError> {
        let f_type: FType = map
            .get("f_type")
            .and_then(Value::as_str)
            .ok_or_else(|| ValidationError::InvalidField {
                field: "f_type",
                message: "expected a wire tag string".to_string(),
            })?
            .parse()?;

        let html = match map.get("html") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                return Err(ValidationError::InvalidField {
                    field: "html",
                    message: "expected a string".to_string(),
                })
            }
        };

        let class_list = match map.get("class_list") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| ValidationError::InvalidField {
                            field: "class_list",
                            message: "expected a sequence of strings".to_string(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => {
                return Err(ValidationError::InvalidField {
                    field: "class_list",
                    message: "expected a sequence".to_string(),
                })
            }
        };

        let data = match map.get("data") {
            None | Some(Value::Null) => FragmentData::Empty,
            Some(Value::Object(data)) => FragmentData::from_map(f_type, html.is_empty(), data)?,
            Some(_) => {
                return Err(ValidationError::InvalidField {
                    field: "data",
                    message: "expected a mapping".to_string(),
                })
            }
        };

        let layout = match map.get("layout") {
            None | Some(Value::Null) => None,
            Some(v) => Some(serde_json::from_value(v.clone()).map_err(|e| {
                ValidationError::InvalidField {
                    field: "layout",
                    message: e.to_string(),
                }
            })?),
        };

        let slug = match map.get("slug") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                return Err(ValidationError::InvalidField {
                    field: "slug",
                    message: "expected a string".to_string(),
                })
            }
        };

        Fragment::new(FragmentFields {
            f_type,
            html,
            data,
            class_list,
            layout,
            slug,
            interaction_pos: position_field(map, "interaction_pos")?,
            answerable_interaction_pos: position_field(map, "answerable_interaction_pos")?,
        })
    }

    pub fn f_type(&self) -> FType {
        self.f_type
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn data(&self) -> &FragmentData {
        &self.data
    }

    pub fn class_list(&self) -> &[String] {
        &self.class_list
    }

    pub fn classes(&self) -> String {
        self.class_list.join(" ")
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    pub fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    pub fn interaction_pos(&self) -> Option<usize> {
        self.interaction_pos
    }

    pub fn answerable_interaction_pos(&self) -> Option<usize> {
        self.answerable_interaction_pos
    }

    /// A copy of this fragment annotated with its interaction positions
    pub fn with_positions(
        &self,
        interaction_pos: Option<usize>,
        answerable_interaction_pos: Option<usize>,
    ) -> Result<Self, ValidationError> {
        Fragment::new(FragmentFields {
            f_type: self.f_type,
            html: self.html.clone(),
            data: self.data.clone(),
            class_list: self.class_list.clone(),
            layout: self.layout.clone(),
            slug: self.slug.clone(),
            interaction_pos,
            answerable_interaction_pos,
        })
    }

    pub fn to_dict(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

impl Serialize for Fragment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(9))?;
        map.serialize_entry("f_type", &self.f_type)?;
        map.serialize_entry("html", &self.html)?;
        map.serialize_entry("data", &self.data)?;
        map.serialize_entry("class_list", &self.class_list)?;
        map.serialize_entry("classes", &self.classes())?;
        map.serialize_entry("layout", &self.layout)?;
        map.serialize_entry("slug", &self.slug)?;
        map.serialize_entry("interaction_pos", &self.interaction_pos)?;
        map.serialize_entry("answerable_interaction_pos", &self.answerable_interaction_pos)?;
        map.end()
    }
}

fn position_field(map: &Map<String, Value>, field: &'static str) -> Result<Option<usize>, ValidationError> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| ValidationError::InvalidField {
                field,
                message: "expected a non-negative integer".to_string(),
            }),
    }
}

fn validate(fields: &FragmentFields) -> Result<(), ValidationError> {
    let f_type = fields.f_type;
    if fields.layout.is_some() && f_type != FType::Divider {
        return Err(ValidationError::LayoutNotAllowed { f_type });
    }
    if fields.slug.is_some() && !f_type.is_heading() {
        return Err(ValidationError::SlugNotAllowed { f_type });
    }

    let html_is_empty = fields.html.is_empty();
    let data = &fields.data;
    let unexpected = |expected| ValidationError::UnexpectedData { f_type, expected };

    match f_type {
        FType::Toc | FType::Paragraph | FType::Blockquote => require_empty(f_type, data),
        FType::H1 | FType::H2 | FType::H3 | FType::H4 => match data {
            FragmentData::Heading(_) => Ok(()),
            _ => Err(unexpected("heading")),
        },
        FType::List | FType::NumberedList | FType::Lbl => match data {
            FragmentData::List(_) if html_is_empty => Ok(()),
            d if d.is_empty() && !html_is_empty => Ok(()),
            _ => Err(ValidationError::ListShape { f_type }),
        },
        FType::Table => {
            if !html_is_empty {
                return Ok(());
            }
            match data {
                FragmentData::Table(_) => Ok(()),
                _ => Err(unexpected("{headers, rows}")),
            }
        }
        FType::Divider => {
            if !html_is_empty {
                return Err(ValidationError::HtmlNotEmpty { f_type });
            }
            require_empty(f_type, data)
        }
        FType::Image => match data {
            FragmentData::Image { .. } => Ok(()),
            _ => Err(unexpected("{src}")),
        },
        FType::Svg => match data {
            FragmentData::Svg { .. } => Ok(()),
            _ => Err(unexpected("{src, content}")),
        },
        FType::Code => match data {
            FragmentData::Code { .. } => Ok(()),
            _ => Err(unexpected("{content, language}")),
        },
        FType::Radio => match data {
            FragmentData::Radio(_) => Ok(()),
            _ => Err(unexpected("{radios, comment?}")),
        },
        FType::Maths | FType::Graph => {
            if html_is_empty {
                Ok(())
            } else {
                Err(ValidationError::HtmlNotEmpty { f_type })
            }
        }
        FType::ScriptModule => {
            if !html_is_empty {
                return Err(ValidationError::HtmlNotEmpty { f_type });
            }
            match data {
                FragmentData::ScriptModule(d) if d.content.is_some() != d.src.is_some() => Ok(()),
                FragmentData::ScriptModule(_) => Err(ValidationError::ScriptModuleSource),
                FragmentData::Empty => Err(ValidationError::ScriptModuleSource),
                _ => Err(unexpected("{content | src}")),
            }
        }
        FType::Html | FType::Tabvar | FType::Codex | FType::Number => Ok(()),
    }
}

fn require_empty(f_type: FType, data: &FragmentData) -> Result<(), ValidationError> {
    if data.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::DataNotEmpty { f_type })
    }
}
