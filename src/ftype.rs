//! Fragment kinds
//!
//! `FType` is the closed set of content kinds a PM document is made of. Each
//! kind carries a short wire tag (`"h2_"`, `"radio_"`, ...) that is used in the
//! serialized form instead of the variant name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FType {
    #[serde(rename = "toc_")]
    Toc,
    #[serde(rename = "h1_")]
    H1,
    #[serde(rename = "h2_")]
    H2,
    #[serde(rename = "h3_")]
    H3,
    #[serde(rename = "h4_")]
    H4,
    #[serde(rename = "p_")]
    Paragraph,
    #[serde(rename = "blockquote_")]
    Blockquote,
    #[serde(rename = "ul_")]
    List,
    #[serde(rename = "ol_")]
    NumberedList,
    #[serde(rename = "lbl_")]
    Lbl,
    #[serde(rename = "table_")]
    Table,
    #[serde(rename = "hr_")]
    Divider,
    #[serde(rename = "image_")]
    Image,
    #[serde(rename = "svg_")]
    Svg,
    #[serde(rename = "html_")]
    Html,
    #[serde(rename = "code_")]
    Code,
    #[serde(rename = "tabvar_")]
    Tabvar,
    #[serde(rename = "radio_")]
    Radio,
    #[serde(rename = "maths_")]
    Maths,
    #[serde(rename = "graph_")]
    Graph,
    #[serde(rename = "codex_")]
    Codex,
    #[serde(rename = "number_")]
    Number,
    #[serde(rename = "script_module_")]
    ScriptModule,
}

impl FType {
    pub const ALL: [FType; 23] = [
        FType::Toc,
        FType::H1,
        FType::H2,
        FType::H3,
        FType::H4,
        FType::Paragraph,
        FType::Blockquote,
        FType::List,
        FType::NumberedList,
        FType::Lbl,
        FType::Table,
        FType::Divider,
        FType::Image,
        FType::Svg,
        FType::Html,
        FType::Code,
        FType::Tabvar,
        FType::Radio,
        FType::Maths,
        FType::Graph,
        FType::Codex,
        FType::Number,
        FType::ScriptModule,
    ];

    /// The wire tag of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            FType::Toc => "toc_",
            FType::H1 => "h1_",
            FType::H2 => "h2_",
            FType::H3 => "h3_",
            FType::H4 => "h4_",
            FType::Paragraph => "p_",
            FType::Blockquote => "blockquote_",
            FType::List => "ul_",
            FType::NumberedList => "ol_",
            FType::Lbl => "lbl_",
            FType::Table => "table_",
            FType::Divider => "hr_",
            FType::Image => "image_",
            FType::Svg => "svg_",
            FType::Html => "html_",
            FType::Code => "code_",
            FType::Tabvar => "tabvar_",
            FType::Radio => "radio_",
            FType::Maths => "maths_",
            FType::Graph => "graph_",
            FType::Codex => "codex_",
            FType::Number => "number_",
            FType::ScriptModule => "script_module_",
        }
    }

    pub fn is_heading(&self) -> bool {
        self.heading_level().is_some()
    }

    pub fn heading_level(&self) -> Option<u8> {
        match self {
            FType::H1 => Some(1),
            FType::H2 => Some(2),
            FType::H3 => Some(3),
            FType::H4 => Some(4),
            _ => None,
        }
    }

    pub fn from_heading_level(level: u8) -> Option<FType> {
        match level {
            1 => Some(FType::H1),
            2 => Some(FType::H2),
            3 => Some(FType::H3),
            4 => Some(FType::H4),
            _ => None,
        }
    }

    /// Kinds the reader interacts with (counted in `Pm::interaction_count`)
    pub fn is_interactive(&self) -> bool {
        matches!(
            self,
            FType::Radio | FType::Maths | FType::Number | FType::Codex
        )
    }

    /// Interactive kinds that expect an answer which can be checked
    pub fn is_answerable(&self) -> bool {
        matches!(self, FType::Radio | FType::Maths | FType::Number)
    }
}

impl fmt::Display for FType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown fragment type tag: {0}")]
pub struct UnknownFType(pub String);

impl FromStr for FType {
    type Err = UnknownFType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FType::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownFType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_tags_are_unique() {
        let mut tags: Vec<&str> = FType::ALL.iter().map(|t| t.as_str()).collect();
        tags.sort();
        tags.dedup();
        assert_eq!(tags.len(), FType::ALL.len());
    }

    #[test]
    fn test_from_str_roundtrips_every_tag() {
        for t in FType::ALL {
            assert_eq!(t.as_str().parse::<FType>().unwrap(), t);
        }
        assert!("radio".parse::<FType>().is_err());
    }

    #[test]
    fn test_serde_uses_wire_tag() {
        assert_eq!(serde_json::to_string(&FType::H2).unwrap(), "\"h2_\"");
        let t: FType = serde_json::from_str("\"script_module_\"").unwrap();
        assert_eq!(t, FType::ScriptModule);
    }

    #[test]
    fn test_heading_levels() {
        assert_eq!(FType::H3.heading_level(), Some(3));
        assert_eq!(FType::from_heading_level(4), Some(FType::H4));
        assert_eq!(FType::from_heading_level(5), None);
        assert!(!FType::Paragraph.is_heading());
    }

    #[test]
    fn test_interactive_kinds() {
        assert!(FType::Radio.is_interactive());
        assert!(FType::Codex.is_interactive());
        assert!(!FType::Codex.is_answerable());
        assert!(FType::Number.is_answerable());
        assert!(!FType::Graph.is_interactive());
    }
}
