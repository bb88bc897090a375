//! Full YAML front matter
//!
//! A document may start with a `---` line followed by a YAML mapping and a
//! closing `---` (or `...`) line. The mapping becomes the document metadata.

use crate::error::{BuildError, BuildResult};
use serde_json::{Map, Value};

/// Split `markdown` into its front matter mapping and the remaining body
pub fn split_front_matter(markdown: &str) -> BuildResult<(Map<String, Value>, &str)> {
    let Some(rest) = strip_opening(markdown) else {
        return Ok((Map::new(), markdown));
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok((parse_metadata(yaml)?, body));
        }
        offset += line.len();
    }

    // no closing delimiter: not front matter, leave the text untouched
    Ok((Map::new(), markdown))
}

fn strip_opening(markdown: &str) -> Option<&str> {
    let markdown = markdown.strip_prefix('\u{feff}').unwrap_or(markdown);
    let first_line_end = markdown.find('\n')?;
    if markdown[..first_line_end].trim_end() == "---" {
        Some(&markdown[first_line_end + 1..])
    } else {
        None
    }
}

fn parse_metadata(yaml: &str) -> BuildResult<Map<String, Value>> {
    if yaml.trim().is_empty() {
        return Ok(Map::new());
    }
    let parsed: serde_yaml::Value =
        serde_yaml::from_str(yaml).map_err(|e| BuildError::FrontMatter(e.to_string()))?;
    match yaml_to_json(parsed)? {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map),
        other => Err(BuildError::FrontMatter(format!(
            "expected a mapping, found {}",
            json_kind(&other)
        ))),
    }
}

/// Convert a YAML value into JSON, stringifying non-string mapping keys
pub fn yaml_to_json(value: serde_yaml::Value) -> BuildResult<Value> {
    Ok(match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<BuildResult<Vec<_>>>()?,
        ),
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, value) in mapping {
                let key = match key {
                    serde_yaml::Value::String(s) => s,
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => {
                        return Err(BuildError::FrontMatter(format!(
                            "unsupported mapping key {:?}",
                            other
                        )))
                    }
                };
                map.insert(key, yaml_to_json(value)?);
            }
            Value::Object(map)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
