//! Analysis engine for code analysis and diagnostic generation
//!
//! Provides the core analysis functionality for CLI and other consumers. An engine
//! owns one export-map registry; keep an engine alive across files to share its
//! cache, and create one per worker thread when analysing in parallel.

use crate::config::{Config, Settings};
use crate::diagnostic::Diagnostic;
use crate::exports::ExportMapRegistry;
use crate::parser::ParsedFile;
use crate::rules::{RuleRegistry, Severity};

pub struct AnalysisEngine {
    registry: RuleRegistry,
    exports: ExportMapRegistry,
}

impl AnalysisEngine {
    pub fn new() -> Self {
        Self {
            registry: create_default_registry(),
            exports: ExportMapRegistry::new(Settings::default()),
        }
    }

    pub fn with_config(config: &Config) -> Self {
        Self::with_exports(config, ExportMapRegistry::new(config.settings.clone()))
    }

    /// Uses a caller-built registry, e.g. one over an in-memory file system.
    pub fn with_exports(config: &Config, exports: ExportMapRegistry) -> Self {
        let mut registry = create_default_registry();
        registry.configure(&config.rules);
        Self { registry, exports }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn exports(&self) -> &ExportMapRegistry {
        &self.exports
    }

    /// Forgets every cached export map, for hosts that learn about file changes
    /// the modification time cannot show.
    pub fn clear_cache(&self) {
        self.exports.clear_cache();
    }

    pub fn analyze(&self, file: &ParsedFile) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let disable_directives = file.disable_directives();

        for error in file.errors() {
            let diagnostic = Diagnostic::new(
                "PARSE",
                Severity::Error,
                &error.message,
                &file.metadata().filename,
                error.line,
                error.column,
            );
            if !disable_directives.is_disabled(diagnostic.line, &diagnostic.rule_id) {
                diagnostics.push(diagnostic);
            }
        }

        let rule_diagnostics = self.registry.run_all(file, &self.exports);
        for diagnostic in rule_diagnostics {
            if !self.is_suppressed(file, &diagnostic) {
                diagnostics.push(diagnostic);
            }
        }

        tracing::debug!(
            file = %file.metadata().filename,
            diagnostics = diagnostics.len(),
            "analysis finished"
        );
        diagnostics
    }

    /// Directives may name a rule by id or by name.
    fn is_suppressed(&self, file: &ParsedFile, diagnostic: &Diagnostic) -> bool {
        let directives = file.disable_directives();
        directives.is_disabled(diagnostic.line, &diagnostic.rule_id)
            || self
                .registry
                .get_rule(&diagnostic.rule_id)
                .is_some_and(|rule| directives.is_disabled(diagnostic.line, rule.metadata().name))
    }
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}

pub fn create_default_registry() -> RuleRegistry {
    RuleRegistry::with_default_rules()
}
