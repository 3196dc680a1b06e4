//! Explain command - provides detailed explanation of a rule

use std::env;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use sekisho_core::analysis::AnalysisEngine;
use sekisho_core::config::load_config_or_default_with_warnings;
use sekisho_core::rules::{Rule, RuleCategory, RuleRegistry, Severity};

#[derive(Args, Debug)]
pub struct ExplainArgs {
    #[arg(
        value_name = "RULE_ID",
        help = "Rule ID or name to explain (e.g., \"I002\", \"no-cycle\")"
    )]
    pub rule_id: String,
}

impl ExplainArgs {
    pub fn run(&self) -> Result<()> {
        let cwd = env::current_dir()?;
        let config = load_config_or_default_with_warnings(&cwd).config;
        let engine = AnalysisEngine::with_config(&config);
        let registry = engine.registry();

        match registry.find(&self.rule_id) {
            Some(rule) => {
                print!("{}", describe(rule, registry));
                Ok(())
            }
            None => {
                eprintln!(
                    "{} Unknown rule '{}'",
                    "error:".red().bold(),
                    self.rule_id
                );
                eprintln!();
                eprintln!("Available rules:");
                for rule in registry.rules() {
                    let meta = rule.metadata();
                    eprintln!("  {} ({})", meta.id, meta.name);
                }
                std::process::exit(1);
            }
        }
    }
}

fn describe(rule: &dyn Rule, registry: &RuleRegistry) -> String {
    let metadata = rule.metadata();
    let mut lines = vec![
        String::new(),
        format!("Rule {}", metadata.id).bold().to_string(),
        String::new(),
        format!("  {}: {}", "Name".cyan(), metadata.name),
        format!("  {}: {}", "Description".cyan(), metadata.description),
        format!("  {}: {}", "Category".cyan(), format_category(&metadata.category)),
        format!("  {}: {}", "Severity".cyan(), format_severity(&metadata.severity)),
    ];

    if let Some(url) = metadata.docs_url {
        lines.push(format!("  {}: {}", "Documentation".cyan(), url));
    }

    if let Some(examples) = metadata.examples {
        lines.push(String::new());
        lines.push(format!("  {}:", "Examples".cyan()));
        lines.extend(examples.lines().map(|line| format!("    {}", line)));
    }

    lines.push(String::new());
    let status = if registry.is_rule_enabled(metadata.id) {
        "enabled".green()
    } else {
        "disabled".red()
    };
    lines.push(format!("  {}: {}", "Status".cyan(), status));
    lines.push(String::new());

    lines.join("\n")
}

fn format_category(category: &RuleCategory) -> &'static str {
    match category {
        RuleCategory::StaticAnalysis => "Static analysis",
        RuleCategory::HelpfulWarnings => "Helpful warnings",
    }
}

fn format_severity(severity: &Severity) -> String {
    match severity {
        Severity::Error => "error".red().to_string(),
        Severity::Warning => "warning".yellow().to_string(),
        Severity::Info => "info".blue().to_string(),
        Severity::Hint => "hint".cyan().to_string(),
    }
}
