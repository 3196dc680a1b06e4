//! Pretty formatter for human-readable terminal output
//!
//! Displays diagnostics with colors, source code context, and summary.

use std::collections::HashMap;
use std::fs;

use colored::{ColoredString, Colorize};
use sekisho_core::diagnostic::Diagnostic;
use sekisho_core::rules::Severity;

pub struct PrettyFormatter {
    sources: HashMap<String, String>,
}

impl PrettyFormatter {
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
        }
    }

    pub fn with_sources(sources: HashMap<String, String>) -> Self {
        Self { sources }
    }

    pub fn format(&self, diagnostics: &[Diagnostic]) -> String {
        let mut output = String::new();

        for diag in diagnostics {
            output.push_str(&self.format_diagnostic(diag));
            output.push('\n');
        }

        if !diagnostics.is_empty() {
            output.push_str(&self.format_summary(diagnostics));
        }

        output
    }

    fn format_diagnostic(&self, diag: &Diagnostic) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "{}[{}]: {}",
            self.colorize_severity(&diag.severity),
            diag.rule_id.dimmed(),
            diag.message
        ));
        lines.push(format!(
            "  {} {}:{}:{}",
            "-->".blue(),
            diag.file,
            diag.line,
            diag.column
        ));

        let padding = " ".repeat(diag.line.to_string().len());

        if let Some(source_line) = self.get_source_line(&diag.file, diag.line) {
            lines.push(format!("{} {}", padding, "|".blue()));
            lines.push(format!(
                "{} {} {}",
                diag.line.to_string().blue(),
                "|".blue(),
                source_line
            ));

            // columns are 1-based
            let caret_padding = " ".repeat(diag.column.saturating_sub(1));
            let caret_len = if diag.end_line == diag.line && diag.end_column > diag.column {
                diag.end_column - diag.column
            } else {
                1
            };
            lines.push(format!(
                "{} {} {}{}",
                padding,
                "|".blue(),
                caret_padding,
                "^".repeat(caret_len).red()
            ));
            lines.push(format!("{} {}", padding, "|".blue()));
        }

        if let Some(suggestion) = &diag.suggestion {
            lines.push(format!(
                "{} {} {} {}",
                padding,
                "=".blue(),
                "suggestion:".green(),
                suggestion
            ));
        }

        lines.join("\n")
    }

    fn colorize_severity(&self, severity: &Severity) -> ColoredString {
        match severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Info => "info".blue().bold(),
            Severity::Hint => "hint".cyan().bold(),
        }
    }

    fn get_source_line(&self, file: &str, line: usize) -> Option<String> {
        let index = line.checked_sub(1)?;
        if let Some(source) = self.sources.get(file) {
            return source.lines().nth(index).map(str::to_string);
        }

        let content = fs::read_to_string(file).ok()?;
        content.lines().nth(index).map(str::to_string)
    }

    fn format_summary(&self, diagnostics: &[Diagnostic]) -> String {
        let error_count = diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        let warning_count = diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count();
        let total = diagnostics.len();

        format!(
            "\nFound {} {} ({}, {})\n",
            total.to_string().bold(),
            plural(total, "problem"),
            format!("{} {}", error_count, plural(error_count, "error")).red(),
            format!("{} {}", warning_count, plural(warning_count, "warning")).yellow()
        )
    }
}

impl Default for PrettyFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}
