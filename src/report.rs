//! Build report types for PM documents

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of a non-fatal build diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Tag without a dedicated handler, kept as a paragraph
    UnknownTag,
    /// SVG or HTML include that could not be read
    MissingInclude,
    /// YAML code block that failed to parse, kept as plain code
    YamlFallback,
    /// Template rendering failed, raw text kept
    TemplateFallback,
    /// Radio item without a valid flag, stored as a comment
    RadioComment,
    /// More than one table of contents in the document
    DuplicateToc,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticKind::UnknownTag => write!(f, "unknown_tag"),
            DiagnosticKind::MissingInclude => write!(f, "missing_include"),
            DiagnosticKind::YamlFallback => write!(f, "yaml_fallback"),
            DiagnosticKind::TemplateFallback => write!(f, "template_fallback"),
            DiagnosticKind::RadioComment => write!(f, "radio_comment"),
            DiagnosticKind::DuplicateToc => write!(f, "duplicate_toc"),
        }
    }
}

/// A diagnostic recorded while building a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildDiagnostic {
    /// Index of the top-level tag in the document
    pub position: usize,
    /// Tag name
    pub tag: String,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl std::fmt::Display for BuildDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} <{}> [{}]: {}",
            self.position, self.tag, self.kind, self.message
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildStatistics {
    /// Number of fragments per wire tag
    pub fragment_counts: BTreeMap<String, usize>,
    pub warning_count: usize,
    pub interaction_count: usize,
    pub answerable_interaction_count: usize,
}

impl BuildStatistics {
    pub fn increment_fragment(&mut self, tag: &str) {
        *self.fragment_counts.entry(tag.to_string()).or_insert(0) += 1;
    }

    pub fn fragment_total(&self) -> usize {
        self.fragment_counts.values().sum()
    }
}

/// Report for one document build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReport {
    /// Document origin as given to the builder
    pub origin: String,
    /// RFC 3339 timestamp of the build
    pub timestamp: String,
    pub duration_ms: u64,
    pub statistics: BuildStatistics,
    pub diagnostics: Vec<BuildDiagnostic>,
}

impl BuildReport {
    pub fn new(origin: &str) -> Self {
        Self {
            origin: origin.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            duration_ms: 0,
            statistics: BuildStatistics::default(),
            diagnostics: Vec::new(),
        }
    }

    pub fn add_diagnostic(&mut self, diagnostic: BuildDiagnostic) {
        self.statistics.warning_count += 1;
        self.diagnostics.push(diagnostic);
    }

    pub fn has_kind(&self, kind: DiagnosticKind) -> bool {
        self.diagnostics.iter().any(|d| d.kind == kind)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable summary
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        output.push_str("PM Build Report\n");
        output.push_str("===============\n");
        output.push_str(&format!("Origin: {}\n", self.origin));
        output.push_str(&format!("Date:   {}\n", self.timestamp));
        output.push_str(&format!("Time:   {}ms\n\n", self.duration_ms));

        output.push_str("Statistics\n");
        output.push_str("----------\n");
        output.push_str(&format!(
            "Fragments:       {}\n",
            self.statistics.fragment_total()
        ));
        output.push_str(&format!(
            "Interactions:    {} ({} answerable)\n",
            self.statistics.interaction_count, self.statistics.answerable_interaction_count
        ));
        output.push_str(&format!(
            "Warnings:        {}\n\n",
            self.statistics.warning_count
        ));

        if !self.statistics.fragment_counts.is_empty() {
            output.push_str("Fragments\n");
            output.push_str("---------\n");
            let mut counts: Vec<_> = self.statistics.fragment_counts.iter().collect();
            counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            for (tag, count) in counts {
                output.push_str(&format!("✓ {}: {}\n", tag, count));
            }
            output.push('\n');
        }

        if !self.diagnostics.is_empty() {
            output.push_str("Warnings\n");
            output.push_str("--------\n");
            for diagnostic in &self.diagnostics {
                output.push_str(&format!("⚠ {}\n", diagnostic));
            }
            output.push('\n');
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnostic() -> BuildDiagnostic {
        BuildDiagnostic {
            position: 3,
            tag: "details".to_string(),
            kind: DiagnosticKind::UnknownTag,
            message: "not implemented".to_string(),
        }
    }

    #[test]
    fn test_diagnostic_display() {
        assert_eq!(
            diagnostic().to_string(),
            "#3 <details> [unknown_tag]: not implemented"
        );
    }

    #[test]
    fn test_statistics_increment() {
        let mut stats = BuildStatistics::default();
        stats.increment_fragment("p_");
        stats.increment_fragment("p_");
        stats.increment_fragment("h2_");
        assert_eq!(stats.fragment_counts.get("p_"), Some(&2));
        assert_eq!(stats.fragment_total(), 3);
    }

    #[test]
    fn test_report_to_json() {
        let mut report = BuildReport::new("../markdowns/a.md");
        report.add_diagnostic(diagnostic());
        let json = report.to_json().unwrap();
        assert!(json.contains("\"origin\": \"../markdowns/a.md\""));
        assert!(json.contains("\"kind\": \"unknown_tag\""));
        assert!(report.has_kind(DiagnosticKind::UnknownTag));
        assert_eq!(report.statistics.warning_count, 1);
    }

    #[test]
    fn test_report_to_text() {
        let mut report = BuildReport::new("a.md");
        report.statistics.increment_fragment("radio_");
        report.statistics.interaction_count = 1;
        report.statistics.answerable_interaction_count = 1;
        report.add_diagnostic(diagnostic());

        let text = report.to_text();
        assert!(text.contains("PM Build Report"));
        assert!(text.contains("Origin: a.md"));
        assert!(text.contains("Interactions:    1 (1 answerable)"));
        assert!(text.contains("✓ radio_: 1"));
        assert!(text.contains("⚠ #3 <details> [unknown_tag]: not implemented"));
    }
}
