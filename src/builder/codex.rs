//! Codex scripts
//!
//! A codex exercise script is split in four sections by marker lines
//! (`#%% foreground_script`, `#%% background_script`, `#%% public_checks`,
//! `#%% private_checks`). The sections are then substituted into the corrector
//! template to get the script that actually runs in the browser.

use regex::Regex;
use std::sync::LazyLock;

pub const BUILTIN_TEMPLATE: &str = include_str!("../../assets/codex_corrector.py");

static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#\s*%%\s*(foreground_script|background_script|public_checks|private_checks)\s*$")
        .unwrap()
});

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CodexSections {
    pub foreground_script: String,
    pub background_script: String,
    pub public_checks: String,
    pub private_checks: String,
}

impl CodexSections {
    /// Split a script on its section markers. Text before the first marker is
    /// prepended to the background section.
    pub fn split(script: &str) -> Self {
        let mut sections = CodexSections::default();
        let mut preamble = String::new();
        let mut current: Option<&str> = None;

        for line in script.lines() {
            if let Some(caps) = MARKER.captures(line.trim_end()) {
                current = Some(match &caps[1] {
                    "foreground_script" => "foreground_script",
                    "background_script" => "background_script",
                    "public_checks" => "public_checks",
                    _ => "private_checks",
                });
                continue;
            }
            let target = match current {
                None => &mut preamble,
                Some("foreground_script") => &mut sections.foreground_script,
                Some("background_script") => &mut sections.background_script,
                Some("public_checks") => &mut sections.public_checks,
                Some(_) => &mut sections.private_checks,
            };
            target.push_str(line);
            target.push('\n');
        }

        let preamble = preamble.trim();
        if !preamble.is_empty() {
            sections.background_script = format!("{}\n{}", preamble, sections.background_script);
        }
        sections.foreground_script = sections.foreground_script.trim().to_string();
        sections.background_script = sections.background_script.trim().to_string();
        sections.public_checks = sections.public_checks.trim_end().to_string();
        sections.private_checks = sections.private_checks.trim_end().to_string();
        sections
    }

    /// Substitute the sections into `template`.
    ///
    /// A slot indented in the template gets every line of its section indented
    /// the same way; an empty indented section becomes `pass`.
    pub fn compose(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len() + 256);
        for line in template.split_inclusive('\n') {
            let (body, newline) = match line.strip_suffix('\n') {
                Some(body) => (body, "\n"),
                None => (line, ""),
            };
            match self.slot(body.trim()) {
                Some(section) => {
                    let indent = &body[..body.len() - body.trim_start().len()];
                    out.push_str(&indent_section(section, indent));
                }
                None => out.push_str(body),
            }
            out.push_str(newline);
        }
        out
    }

    fn slot(&self, trimmed_line: &str) -> Option<&str> {
        match trimmed_line {
            "{{background_script}}" => Some(&self.background_script),
            "{{foreground_script}}" => Some(&self.foreground_script),
            "{{public_checks}}" => Some(&self.public_checks),
            "{{private_checks}}" => Some(&self.private_checks),
            _ => None,
        }
    }
}

fn indent_section(section: &str, indent: &str) -> String {
    if indent.is_empty() {
        return section.to_string();
    }
    let section = dedent(section);
    if section.trim().is_empty() {
        return format!("{}pass", indent);
    }
    section
        .lines()
        .map(|l| {
            if l.trim().is_empty() {
                String::new()
            } else {
                format!("{}{}", indent, l)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn dedent(text: &str) -> String {
    let common = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    text.lines()
        .map(|l| l.get(common..).unwrap_or_else(|| l.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = "import math\n\
#%% background_script\n\
SECRET = 42\n\
#%% foreground_script\n\
def f(x):\n    return 2 * x\n\
#%% public_checks\n\
assert f(1) == 2\n\
#%% private_checks\n\
assert f(SECRET) == 84\n";

    #[test]
    fn test_split_sections() {
        let sections = CodexSections::split(SCRIPT);
        assert_eq!(sections.background_script, "import math\nSECRET = 42");
        assert_eq!(sections.foreground_script, "def f(x):\n    return 2 * x");
        assert_eq!(sections.public_checks, "assert f(1) == 2");
        assert_eq!(sections.private_checks, "assert f(SECRET) == 84");
    }

    #[test]
    fn test_script_without_markers_is_background() {
        let sections = CodexSections::split("x = 1\n");
        assert_eq!(sections.background_script, "x = 1");
        assert!(sections.foreground_script.is_empty());
    }

    #[test]
    fn test_compose_indents_slots() {
        let sections = CodexSections::split(SCRIPT);
        let template = "{{background_script}}\n{{foreground_script}}\ndef checks():\n    {{public_checks}}\ndef hidden():\n    {{private_checks}}\n";
        assert_eq!(
            sections.compose(template),
            "import math\nSECRET = 42\ndef f(x):\n    return 2 * x\ndef checks():\n    assert f(1) == 2\ndef hidden():\n    assert f(SECRET) == 84\n"
        );
    }

    #[test]
    fn test_compose_empty_indented_slot() {
        let sections = CodexSections::default();
        assert_eq!(sections.compose("def c():\n    {{public_checks}}"), "def c():\n    pass");
    }

    #[test]
    fn test_builtin_template_has_every_slot() {
        for slot in [
            "{{background_script}}",
            "{{foreground_script}}",
            "{{public_checks}}",
            "{{private_checks}}",
        ] {
            assert!(BUILTIN_TEMPLATE.contains(slot), "missing {}", slot);
        }
    }
}
