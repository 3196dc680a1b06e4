//! Rule system for module-system checks
//!
//! Rules inspect one linted file at a time and consult the shared export-map
//! registry (through [`RuleContext`]) for everything they need to know about the
//! modules it imports.

pub mod helpers;
pub mod imports;

use crate::config::RulesConfig;
use crate::diagnostic::Diagnostic;
use crate::exports::ExportMapRegistry;
use crate::parser::ParsedFile;
use std::collections::{HashMap, HashSet};

pub const DEFAULT_MAX_DEPTH: usize = usize::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleCategory {
    /// Checks that catch code which would fail at runtime.
    StaticAnalysis,
    /// Checks for valid but likely mistaken code.
    HelpfulWarnings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMetadata {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: RuleCategory,
    pub severity: Severity,
    pub docs_url: Option<&'static str>,
    pub examples: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleOptions {
    /// Longest import chain no-cycle walks.
    pub max_depth: usize,
}

impl Default for RuleOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// What a rule may consult besides the file it checks.
pub struct RuleContext<'a> {
    pub exports: &'a ExportMapRegistry,
    pub options: &'a RuleOptions,
}

pub trait Rule: Send + Sync {
    fn metadata(&self) -> &RuleMetadata;
    fn check(&self, file: &ParsedFile, ctx: &RuleContext) -> Vec<Diagnostic>;
}

pub struct RuleRegistry {
    rules: Vec<Box<dyn Rule>>,
    enabled_rules: HashSet<String>,
    disabled_rules: HashSet<String>,
    severity_overrides: HashMap<String, Severity>,
    static_analysis_enabled: bool,
    helpful_warnings_enabled: bool,
    options: RuleOptions,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            enabled_rules: HashSet::new(),
            disabled_rules: HashSet::new(),
            severity_overrides: HashMap::new(),
            static_analysis_enabled: true,
            helpful_warnings_enabled: true,
            options: RuleOptions::default(),
        }
    }

    /// A registry holding every shipped rule.
    pub fn with_default_rules() -> Self {
        use imports::{
            DefaultImport, Export, Named, Namespace, NoCycle, NoDeprecated, NoNamedAsDefault,
            NoUnresolved,
        };

        let mut registry = Self::new();
        registry.register(Box::new(NoUnresolved::new()));
        registry.register(Box::new(Named::new()));
        registry.register(Box::new(DefaultImport::new()));
        registry.register(Box::new(Namespace::new()));
        registry.register(Box::new(Export::new()));
        registry.register(Box::new(NoCycle::new()));
        registry.register(Box::new(NoDeprecated::new()));
        registry.register(Box::new(NoNamedAsDefault::new()));
        registry
    }

    pub fn register(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    pub fn configure(&mut self, config: &RulesConfig) {
        self.enabled_rules = config.enabled.iter().cloned().collect();
        self.disabled_rules = config.disabled.iter().cloned().collect();
        self.severity_overrides = config
            .severity
            .iter()
            .map(|(rule_ref, value)| (rule_ref.clone(), (*value).into()))
            .collect();

        self.static_analysis_enabled = config.static_analysis.unwrap_or(true);
        self.helpful_warnings_enabled = config.helpful_warnings.unwrap_or(true);
        self.options.max_depth = config.max_depth.unwrap_or(DEFAULT_MAX_DEPTH);
    }

    pub fn options(&self) -> &RuleOptions {
        &self.options
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    pub fn run_all(&self, file: &ParsedFile, exports: &ExportMapRegistry) -> Vec<Diagnostic> {
        let ctx = RuleContext {
            exports,
            options: &self.options,
        };
        self.rules
            .iter()
            .filter(|rule| self.should_run_rule(rule.as_ref()))
            .flat_map(|rule| {
                let mut diagnostics = rule.check(file, &ctx);
                self.apply_severity_overrides(rule.as_ref(), &mut diagnostics);
                diagnostics
            })
            .collect()
    }

    fn should_run_rule(&self, rule: &dyn Rule) -> bool {
        let metadata = rule.metadata();

        if self.is_listed(&self.disabled_rules, metadata) {
            return false;
        }
        if self.is_listed(&self.enabled_rules, metadata) {
            return true;
        }

        match metadata.category {
            RuleCategory::StaticAnalysis => self.static_analysis_enabled,
            RuleCategory::HelpfulWarnings => self.helpful_warnings_enabled,
        }
    }

    fn is_listed(&self, list: &HashSet<String>, metadata: &RuleMetadata) -> bool {
        list.contains(metadata.id) || list.contains(metadata.name)
    }

    fn apply_severity_overrides(&self, rule: &dyn Rule, diagnostics: &mut [Diagnostic]) {
        let metadata = rule.metadata();

        let override_severity = self
            .severity_overrides
            .get(metadata.id)
            .or_else(|| self.severity_overrides.get(metadata.name));

        if let Some(severity) = override_severity {
            for diag in diagnostics.iter_mut() {
                diag.severity = *severity;
            }
        }
    }

    pub fn is_rule_enabled(&self, id_or_name: &str) -> bool {
        self.find(id_or_name)
            .is_some_and(|rule| self.should_run_rule(rule))
    }

    /// Looks a rule up by id first, then by name.
    pub fn find(&self, id_or_name: &str) -> Option<&dyn Rule> {
        self.get_rule(id_or_name)
            .or_else(|| self.get_rule_by_name(id_or_name))
    }

    pub fn get_rule(&self, id: &str) -> Option<&dyn Rule> {
        self.rules
            .iter()
            .find(|r| r.metadata().id.eq_ignore_ascii_case(id))
            .map(|r| r.as_ref())
    }

    pub fn get_rule_by_name(&self, name: &str) -> Option<&dyn Rule> {
        self.rules
            .iter()
            .find(|r| r.metadata().name == name)
            .map(|r| r.as_ref())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[macro_export]
macro_rules! declare_rule {
    (
        $name:ident,
        id = $id:literal,
        name = $rule_name:literal,
        description = $desc:literal,
        category = $cat:ident,
        severity = $sev:ident
        $(, docs_url = $url:literal)?
        $(, examples = $examples:literal)?
    ) => {
        pub struct $name {
            metadata: $crate::rules::RuleMetadata,
        }

        impl $name {
            pub fn new() -> Self {
                Self {
                    metadata: $crate::rules::RuleMetadata {
                        id: $id,
                        name: $rule_name,
                        description: $desc,
                        category: $crate::rules::RuleCategory::$cat,
                        severity: $crate::rules::Severity::$sev,
                        docs_url: declare_rule!(@docs_url $($url)?),
                        examples: declare_rule!(@examples $($examples)?),
                    },
                }
            }
        }

        impl ::std::default::Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
    (@docs_url $url:literal) => { Some($url) };
    (@docs_url) => { None };
    (@examples $examples:literal) => { Some($examples) };
    (@examples) => { None };
}
