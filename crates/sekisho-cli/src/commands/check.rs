//! Check command - analyzes the imports and exports of JavaScript/TypeScript files

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use rayon::prelude::*;
use regex::Regex;
use sekisho_core::analysis::AnalysisEngine;
use sekisho_core::config::{Config, load_config_or_default_with_warnings};
use sekisho_core::diagnostic::Diagnostic;
use sekisho_core::parser::ParsedFile;
use sekisho_core::rules::Severity;
use walkdir::WalkDir;

use crate::output::json::JsonFormatter;
use crate::output::pretty::PrettyFormatter;

const SUPPORTED_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs", "cjs", "mts", "cts"];

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to file or directory to analyze
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Output format for diagnostics (pretty, text, json, ndjson)
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Fail on warnings (exit code 1)
    #[arg(long)]
    pub fail_on_warnings: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

struct FileReport {
    path: PathBuf,
    source: String,
    diagnostics: Vec<Diagnostic>,
}

impl CheckArgs {
    pub fn run(&self) -> Result<()> {
        self.configure_colors();

        let config_root = std::path::absolute(&self.path)
            .with_context(|| format!("Cannot resolve {}", self.path.display()))?;
        let config_result = load_config_or_default_with_warnings(&config_root);
        for warning in &config_result.warnings {
            eprintln!("{} {}", "warning:".yellow().bold(), warning);
        }
        let config = config_result.config;

        let ignore = config.settings.ignore_patterns();
        let files = discover_files(&config_root, &ignore)?;
        if files.is_empty() {
            println!("No JavaScript/TypeScript files found.");
            return Ok(());
        }
        tracing::debug!(files = files.len(), "starting analysis");

        let reports = analyze_files(&files, &config);

        let sources: HashMap<String, String> = reports
            .iter()
            .map(|report| (report.path.to_string_lossy().to_string(), report.source.clone()))
            .collect();
        let mut diagnostics: Vec<Diagnostic> = reports
            .into_iter()
            .flat_map(|report| report.diagnostics)
            .collect();
        diagnostics.sort_by(|a, b| (&a.file, a.line, a.column).cmp(&(&b.file, b.line, b.column)));

        let analyzed_path = self.path.to_string_lossy().to_string();
        match self.format.as_str() {
            "json" => self.output_json(&diagnostics, &config, files.len(), &analyzed_path),
            "ndjson" => self.output_ndjson(&diagnostics, &config, files.len(), &analyzed_path)?,
            "text" => self.output_text(&diagnostics),
            "pretty" => self.output_pretty(&diagnostics, sources),
            other => anyhow::bail!(
                "Invalid format '{}'. Valid values: pretty, text, json, ndjson",
                other
            ),
        }

        if should_fail(&diagnostics, self.fail_on_warnings) {
            process::exit(1);
        }

        Ok(())
    }

    fn configure_colors(&self) {
        let no_color_env = std::env::var("NO_COLOR").is_ok();
        if self.no_color || no_color_env {
            colored::control::set_override(false);
        }
    }

    fn output_text(&self, diagnostics: &[Diagnostic]) {
        for diag in diagnostics {
            let severity_str = match diag.severity {
                Severity::Error => "error".red().bold(),
                Severity::Warning => "warning".yellow().bold(),
                Severity::Info => "info".blue().bold(),
                Severity::Hint => "hint".cyan().bold(),
            };

            println!(
                "{}:{}:{}: {} [{}]: {}",
                diag.file,
                diag.line,
                diag.column,
                severity_str,
                diag.rule_id.dimmed(),
                diag.message
            );

            if let Some(suggestion) = &diag.suggestion {
                println!("  {} {}", "suggestion:".green(), suggestion);
            }
        }

        if !diagnostics.is_empty() {
            let (errors, warnings) = count_by_severity(diagnostics);
            println!();
            println!("Found {} error(s) and {} warning(s)", errors, warnings);
        }
    }

    fn output_json(
        &self,
        diagnostics: &[Diagnostic],
        config: &Config,
        total_files: usize,
        analyzed_path: &str,
    ) {
        let engine = AnalysisEngine::with_config(config);
        let formatter = JsonFormatter::with_registry(engine.registry());
        println!("{}", formatter.format(diagnostics, total_files, analyzed_path));
    }

    fn output_ndjson(
        &self,
        diagnostics: &[Diagnostic],
        config: &Config,
        total_files: usize,
        analyzed_path: &str,
    ) -> Result<()> {
        let engine = AnalysisEngine::with_config(config);
        let formatter = JsonFormatter::with_registry(engine.registry());
        let mut stdout = io::stdout().lock();
        formatter.format_ndjson(diagnostics, total_files, analyzed_path, &mut stdout)?;
        Ok(())
    }

    fn output_pretty(&self, diagnostics: &[Diagnostic], sources: HashMap<String, String>) {
        let formatter = PrettyFormatter::with_sources(sources);
        print!("{}", formatter.format(diagnostics));
    }
}

/// Analyses `files` in parallel. Export maps are not shareable across threads, so
/// every rayon worker builds its own engine and keeps it, with its cache, for all
/// the files it is handed.
fn analyze_files(files: &[PathBuf], config: &Config) -> Vec<FileReport> {
    files
        .par_iter()
        .map_init(
            || AnalysisEngine::with_config(config),
            |engine, path| {
                let source = match fs::read_to_string(path) {
                    Ok(source) => source,
                    Err(err) => {
                        tracing::warn!(path = %path.display(), error = %err, "cannot read file");
                        return None;
                    }
                };
                let parsed = ParsedFile::from_source(&path.to_string_lossy(), &source);
                let diagnostics = engine.analyze(&parsed);
                Some(FileReport {
                    path: path.clone(),
                    source,
                    diagnostics,
                })
            },
        )
        .flatten()
        .collect()
}

/// Files to analyse under `path`, as absolute paths: export maps are keyed by
/// them and package lookup walks their ancestors.
fn discover_files(path: &Path, ignore: &[Regex]) -> Result<Vec<PathBuf>> {
    let path = &std::path::absolute(path)
        .with_context(|| format!("Cannot resolve {}", path.display()))?;
    if !path.exists() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }

    if path.is_file() {
        if is_supported_file(path) {
            return Ok(vec![path.to_path_buf()]);
        } else {
            return Ok(vec![]);
        }
    }

    let files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| is_supported_file(e.path()))
        .filter(|e| !is_ignored(e.path(), ignore))
        .map(|e| e.path().to_path_buf())
        .collect();

    Ok(files)
}

fn is_supported_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

fn is_ignored(path: &Path, ignore: &[Regex]) -> bool {
    let display = path.to_string_lossy();
    ignore.iter().any(|pattern| pattern.is_match(&display))
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.') || name == "node_modules")
        .unwrap_or(false)
}

fn count_by_severity(diagnostics: &[Diagnostic]) -> (usize, usize) {
    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let warnings = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .count();
    (errors, warnings)
}

fn should_fail(diagnostics: &[Diagnostic], fail_on_warnings: bool) -> bool {
    let (errors, warnings) = count_by_severity(diagnostics);
    errors > 0 || (fail_on_warnings && warnings > 0)
}
