//! Code blocks and the YAML widget router
//!
//! A YAML code block may declare an interactive widget. Which one is decided
//! from its top-level keys and from the classes of the block:
//!
//! | condition                                         | widget |
//! |---------------------------------------------------|--------|
//! | `codexPCAVersion` key                             | codex  |
//! | `graphPCAVersion` key or `graph` class            | graph  |
//! | `mathPCAVersion` key or `i-maths` class           | maths  |
//! | `table-variations` class                          | tabvar |
//! | `NumberInputPCA` key or `version: NumberInputPCA` | number |
//!
//! Anything else stays a plain code block.

use crate::ftype::FType;
use crate::markdown::frontmatter::yaml_to_json;
use serde_json::{Map, Value};

pub const DEFAULT_LANGUAGE: &str = "python";

const NUMBER_FIELDS: [&str; 5] = ["min", "max", "step", "correct", "tolerance"];

/// Outcome of classifying a YAML block
#[derive(Debug, Clone, PartialEq)]
pub enum YamlWidget {
    Codex(Map<String, Value>),
    Graph(Map<String, Value>),
    Maths(Map<String, Value>),
    Tabvar(Map<String, Value>),
    Number(Map<String, Value>),
    /// Valid YAML that declares no widget
    Plain,
}

impl YamlWidget {
    pub fn f_type(&self) -> FType {
        match self {
            YamlWidget::Codex(_) => FType::Codex,
            YamlWidget::Graph(_) => FType::Graph,
            YamlWidget::Maths(_) => FType::Maths,
            YamlWidget::Tabvar(_) => FType::Tabvar,
            YamlWidget::Number(_) => FType::Number,
            YamlWidget::Plain => FType::Code,
        }
    }

    pub fn into_data(self) -> Map<String, Value> {
        match self {
            YamlWidget::Codex(d)
            | YamlWidget::Graph(d)
            | YamlWidget::Maths(d)
            | YamlWidget::Tabvar(d)
            | YamlWidget::Number(d) => d,
            YamlWidget::Plain => Map::new(),
        }
    }
}

/// YAML that could not be parsed; the block is kept as plain code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YamlDiagnostic {
    pub message: String,
}

impl std::fmt::Display for YamlDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid yaml: {}", self.message)
    }
}

/// Language of a `<code>` element from its `language-XXX` class
pub fn language_of(classes: &[String]) -> String {
    classes
        .iter()
        .find_map(|c| c.strip_prefix("language-"))
        .filter(|l| !l.is_empty())
        .unwrap_or(DEFAULT_LANGUAGE)
        .to_string()
}

pub fn classify_yaml(content: &str, classes: &[String]) -> Result<YamlWidget, YamlDiagnostic> {
    let parsed: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| YamlDiagnostic {
        message: e.to_string(),
    })?;
    let data = match yaml_to_json(parsed).map_err(|e| YamlDiagnostic {
        message: e.to_string(),
    })? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let has_class = |name: &str| classes.iter().any(|c| c == name);

    let widget = if data.contains_key("codexPCAVersion") {
        YamlWidget::Codex(data)
    } else if data.contains_key("graphPCAVersion") || has_class("graph") {
        YamlWidget::Graph(data)
    } else if data.contains_key("mathPCAVersion") || has_class("i-maths") {
        YamlWidget::Maths(unescape_values(data))
    } else if has_class("table-variations") {
        YamlWidget::Tabvar(data)
    } else if data.contains_key("NumberInputPCA")
        || data.get("version").and_then(Value::as_str) == Some("NumberInputPCA")
    {
        YamlWidget::Number(coerce_numbers(data))
    } else {
        YamlWidget::Plain
    };
    Ok(widget)
}

/// Every value as a string, with `&lt;`, `&gt;` and `&amp;` decoded
fn unescape_values(data: Map<String, Value>) -> Map<String, Value> {
    data.into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (key, Value::String(html_escape::decode_html_entities(&text).into_owned()))
        })
        .collect()
}

/// Numeric-looking strings in the number fields become floats, at the top
/// level and inside a nested `NumberInputPCA` mapping
fn coerce_numbers(mut data: Map<String, Value>) -> Map<String, Value> {
    coerce_number_fields(&mut data);
    if let Some(Value::Object(nested)) = data.get_mut("NumberInputPCA") {
        coerce_number_fields(nested);
    }
    data
}

fn coerce_number_fields(map: &mut Map<String, Value>) {
    for field in NUMBER_FIELDS {
        let Some(Value::String(text)) = map.get(field) else {
            continue;
        };
        if let Some(number) = text
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
        {
            map.insert(field.to_string(), Value::Number(number));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classes(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_language_of() {
        assert_eq!(language_of(&classes(&["language-yaml"])), "yaml");
        assert_eq!(language_of(&classes(&["other"])), "python");
        assert_eq!(language_of(&[]), "python");
    }

    #[test]
    fn test_codex_wins_over_classes() {
        let widget = classify_yaml("codexPCAVersion: 1\nscript_path: a.py\n", &classes(&["graph"])).unwrap();
        assert_eq!(widget.f_type(), FType::Codex);
    }

    #[test]
    fn test_graph_by_key_or_class() {
        assert_eq!(
            classify_yaml("graphPCAVersion: 1\n", &[]).unwrap().f_type(),
            FType::Graph
        );
        assert_eq!(
            classify_yaml("nodes: [a, b]\n", &classes(&["graph"])).unwrap().f_type(),
            FType::Graph
        );
    }

    #[test]
    fn test_maths_values_unescaped_strings() {
        let widget = classify_yaml(
            "mathPCAVersion: 1\nexpression: \"x &gt; 2 &amp;&amp; x &lt; 5\"\nanswer: 3\n",
            &[],
        )
        .unwrap();
        let YamlWidget::Maths(data) = widget else {
            panic!("expected maths");
        };
        assert_eq!(data["expression"], json!("x > 2 && x < 5"));
        assert_eq!(data["answer"], json!("3"));
        assert_eq!(data["mathPCAVersion"], json!("1"));
    }

    #[test]
    fn test_tabvar_by_class() {
        let widget = classify_yaml("x: [a, b]\n", &classes(&["table-variations"])).unwrap();
        assert_eq!(widget.f_type(), FType::Tabvar);
    }

    #[test]
    fn test_number_coercion_legacy_schema() {
        let widget = classify_yaml(
            "version: NumberInputPCA\nmin: \"0\"\nmax: \"10,5\"\ncorrect: 4\nlabel: \"12\"\n",
            &[],
        )
        .unwrap();
        let YamlWidget::Number(data) = widget else {
            panic!("expected number");
        };
        assert_eq!(data["min"], json!(0.0));
        assert_eq!(data["max"], json!(10.5));
        assert_eq!(data["correct"], json!(4));
        assert_eq!(data["label"], json!("12"));
    }

    #[test]
    fn test_number_coercion_nested_schema() {
        let widget = classify_yaml("NumberInputPCA:\n  step: \"0.5\"\n  tolerance: \"x\"\n", &[]).unwrap();
        let YamlWidget::Number(data) = widget else {
            panic!("expected number");
        };
        assert_eq!(data["NumberInputPCA"]["step"], json!(0.5));
        assert_eq!(data["NumberInputPCA"]["tolerance"], json!("x"));
    }

    #[test]
    fn test_plain_yaml() {
        assert_eq!(classify_yaml("a: 1\n", &[]).unwrap(), YamlWidget::Plain);
    }

    #[test]
    fn test_invalid_yaml_is_a_diagnostic() {
        let err = classify_yaml("a: [1, 2\n", &classes(&["i-maths"])).unwrap_err();
        assert!(err.to_string().starts_with("invalid yaml"));
    }
}
