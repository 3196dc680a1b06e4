//! JSON output formatter for diagnostic display
//!
//! Provides structured JSON and NDJSON output formats for programmatic integration.

use std::collections::HashSet;
use std::io::{self, Write};

use sekisho_core::diagnostic::Diagnostic;
use sekisho_core::rules::{RuleCategory, RuleRegistry, Severity};
use serde::Serialize;

#[derive(Serialize)]
pub struct JsonOutput {
    pub version: &'static str,
    pub metadata: JsonMetadata,
    pub summary: JsonSummary,
    pub diagnostics: Vec<JsonDiagnostic>,
}

#[derive(Serialize)]
pub struct JsonMetadata {
    pub sekisho_version: &'static str,
    pub working_directory: String,
    pub analyzed_path: String,
}

#[derive(Serialize)]
pub struct JsonSummary {
    pub total_files: usize,
    pub files_with_issues: usize,
    pub total_diagnostics: usize,
    pub by_severity: SeverityCounts,
    pub by_category: CategoryCounts,
}

#[derive(Serialize, Default)]
pub struct SeverityCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
    pub hint: usize,
}

#[derive(Serialize, Default)]
pub struct CategoryCounts {
    pub static_analysis: usize,
    pub helpful_warnings: usize,
}

#[derive(Serialize)]
pub struct JsonDiagnostic {
    pub rule_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<&'static str>,
    pub severity: String,
    pub message: String,
    pub location: JsonLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[derive(Serialize)]
pub struct JsonLocation {
    pub file: String,
    pub start: JsonPosition,
    pub end: JsonPosition,
}

#[derive(Serialize)]
pub struct JsonPosition {
    pub line: usize,
    pub column: usize,
}

#[derive(Serialize)]
#[serde(tag = "type")]
pub enum NdjsonRecord {
    #[serde(rename = "metadata")]
    Metadata(JsonMetadata),
    #[serde(rename = "diagnostic")]
    Diagnostic(JsonDiagnostic),
    #[serde(rename = "summary")]
    Summary(JsonSummary),
}

pub struct JsonFormatter<'a> {
    registry: Option<&'a RuleRegistry>,
}

impl<'a> JsonFormatter<'a> {
    pub fn new() -> Self {
        Self { registry: None }
    }

    pub fn with_registry(registry: &'a RuleRegistry) -> Self {
        Self {
            registry: Some(registry),
        }
    }

    pub fn format(
        &self,
        diagnostics: &[Diagnostic],
        total_files: usize,
        analyzed_path: &str,
    ) -> String {
        let output = JsonOutput {
            version: "1.0",
            metadata: self.build_metadata(analyzed_path),
            summary: self.build_summary(diagnostics, total_files),
            diagnostics: diagnostics
                .iter()
                .map(|d| self.convert_diagnostic(d))
                .collect(),
        };
        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn format_ndjson<W: Write>(
        &self,
        diagnostics: &[Diagnostic],
        total_files: usize,
        analyzed_path: &str,
        writer: &mut W,
    ) -> io::Result<()> {
        let metadata = NdjsonRecord::Metadata(self.build_metadata(analyzed_path));
        writeln!(writer, "{}", serde_json::to_string(&metadata)?)?;

        for diag in diagnostics {
            let record = NdjsonRecord::Diagnostic(self.convert_diagnostic(diag));
            writeln!(writer, "{}", serde_json::to_string(&record)?)?;
        }

        let summary = NdjsonRecord::Summary(self.build_summary(diagnostics, total_files));
        writeln!(writer, "{}", serde_json::to_string(&summary)?)?;

        Ok(())
    }

    fn build_metadata(&self, analyzed_path: &str) -> JsonMetadata {
        JsonMetadata {
            sekisho_version: env!("CARGO_PKG_VERSION"),
            working_directory: std::env::current_dir()
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_default(),
            analyzed_path: analyzed_path.to_string(),
        }
    }

    fn build_summary(&self, diagnostics: &[Diagnostic], total_files: usize) -> JsonSummary {
        let mut by_severity = SeverityCounts::default();
        let mut by_category = CategoryCounts::default();
        let mut files_with_issues = HashSet::new();

        for diag in diagnostics {
            match diag.severity {
                Severity::Error => by_severity.error += 1,
                Severity::Warning => by_severity.warning += 1,
                Severity::Info => by_severity.info += 1,
                Severity::Hint => by_severity.hint += 1,
            }

            match self.category(&diag.rule_id) {
                Some(RuleCategory::StaticAnalysis) => by_category.static_analysis += 1,
                Some(RuleCategory::HelpfulWarnings) => by_category.helpful_warnings += 1,
                None => {}
            }

            files_with_issues.insert(diag.file.as_str());
        }

        JsonSummary {
            total_files,
            files_with_issues: files_with_issues.len(),
            total_diagnostics: diagnostics.len(),
            by_severity,
            by_category,
        }
    }

    fn convert_diagnostic(&self, diag: &Diagnostic) -> JsonDiagnostic {
        let rule = self.registry.and_then(|r| r.get_rule(&diag.rule_id));

        JsonDiagnostic {
            rule_id: diag.rule_id.clone(),
            rule_name: rule.map(|rule| rule.metadata().name.to_string()),
            category: rule.map(|rule| category_name(rule.metadata().category)),
            severity: format!("{:?}", diag.severity).to_lowercase(),
            message: diag.message.clone(),
            location: JsonLocation {
                file: diag.file.clone(),
                start: JsonPosition {
                    line: diag.line,
                    column: diag.column,
                },
                end: JsonPosition {
                    line: diag.end_line,
                    column: diag.end_column,
                },
            },
            suggestion: diag.suggestion.clone(),
        }
    }

    fn category(&self, rule_id: &str) -> Option<RuleCategory> {
        self.registry
            .and_then(|r| r.get_rule(rule_id))
            .map(|rule| rule.metadata().category)
    }
}

impl Default for JsonFormatter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

fn category_name(category: RuleCategory) -> &'static str {
    match category {
        RuleCategory::StaticAnalysis => "static_analysis",
        RuleCategory::HelpfulWarnings => "helpful_warnings",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_diagnostic() -> Diagnostic {
        Diagnostic::new(
            "I002",
            Severity::Error,
            "x not found in './lib'",
            "src/main.js",
            3,
            10,
        )
        .with_end(3, 11)
    }

    fn parse(output: &str) -> serde_json::Value {
        serde_json::from_str(output).unwrap()
    }

    #[test]
    fn format_produces_valid_json() {
        let formatter = JsonFormatter::new();

        let parsed = parse(&formatter.format(&[sample_diagnostic()], 5, "./src"));

        assert_eq!(parsed["version"], "1.0");
        assert!(parsed["metadata"]["sekisho_version"].is_string());
        assert_eq!(parsed["metadata"]["analyzed_path"], "./src");
        assert!(parsed["diagnostics"].is_array());
    }

    #[test]
    fn format_includes_summary() {
        let registry = RuleRegistry::with_default_rules();
        let formatter = JsonFormatter::with_registry(&registry);
        let diagnostics = vec![
            Diagnostic::new("I001", Severity::Error, "unresolved", "a.js", 1, 1),
            Diagnostic::new("I006", Severity::Warning, "cycle", "a.js", 2, 1),
            Diagnostic::new("I008", Severity::Warning, "named as default", "b.js", 1, 8),
        ];

        let parsed = parse(&formatter.format(&diagnostics, 10, "./src"));

        assert_eq!(parsed["summary"]["total_files"], 10);
        assert_eq!(parsed["summary"]["files_with_issues"], 2);
        assert_eq!(parsed["summary"]["total_diagnostics"], 3);
        assert_eq!(parsed["summary"]["by_severity"]["error"], 1);
        assert_eq!(parsed["summary"]["by_severity"]["warning"], 2);
        assert_eq!(parsed["summary"]["by_category"]["static_analysis"], 2);
        assert_eq!(parsed["summary"]["by_category"]["helpful_warnings"], 1);
    }

    #[test]
    fn format_includes_diagnostic_details() {
        let registry = RuleRegistry::with_default_rules();
        let formatter = JsonFormatter::with_registry(&registry);

        let parsed = parse(&formatter.format(&[sample_diagnostic()], 1, "./src"));

        let diag = &parsed["diagnostics"][0];
        assert_eq!(diag["rule_id"], "I002");
        assert_eq!(diag["rule_name"], "named");
        assert_eq!(diag["category"], "static_analysis");
        assert_eq!(diag["severity"], "error");
        assert_eq!(diag["location"]["file"], "src/main.js");
        assert_eq!(diag["location"]["start"]["column"], 10);
        assert_eq!(diag["location"]["end"]["column"], 11);
        assert!(diag.get("suggestion").is_none());
    }

    #[test]
    fn parse_diagnostics_have_no_rule_metadata() {
        let registry = RuleRegistry::with_default_rules();
        let formatter = JsonFormatter::with_registry(&registry);
        let diagnostic = Diagnostic::new("PARSE", Severity::Error, "Unexpected token", "a.js", 1, 7);

        let parsed = parse(&formatter.format(&[diagnostic], 1, "a.js"));

        assert!(parsed["diagnostics"][0].get("rule_name").is_none());
        assert_eq!(parsed["summary"]["by_category"]["static_analysis"], 0);
    }

    #[test]
    fn ndjson_format_produces_lines() {
        let formatter = JsonFormatter::new();
        let mut output = Vec::new();

        formatter
            .format_ndjson(&[sample_diagnostic()], 5, "./src", &mut output)
            .unwrap();

        let output = String::from_utf8(output).unwrap();
        let types: Vec<String> = output
            .lines()
            .map(|line| parse(line)["type"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(types, vec!["metadata", "diagnostic", "summary"]);
    }
}
