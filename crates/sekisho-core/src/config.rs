//! Configuration loading and parsing for Sekisho
//!
//! Provides functionality to load and parse `sekisho.toml` configuration files.
//! The `[settings]` table feeds the export-map registry: anything in it that can
//! change how a file is parsed or resolved is part of the settings fingerprint.

use regex::Regex;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::rules::Severity;

pub const CONFIG_FILENAME: &str = "sekisho.toml";

pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".js", ".mjs", ".cjs", ".jsx", ".ts", ".tsx", ".mts", ".cts",
];

const DEFAULT_CACHE_LIFETIME_SECS: u64 = 30;

const KNOWN_TOP_LEVEL_KEYS: &[&str] = &["rules", "settings"];
const KNOWN_RULES_KEYS: &[&str] = &[
    "enabled",
    "disabled",
    "severity",
    "static_analysis",
    "helpful_warnings",
    "max_depth",
];
const KNOWN_SETTINGS_KEYS: &[&str] = &[
    "extensions",
    "ignore",
    "core_modules",
    "commonjs",
    "docstyle",
    "cache",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid TOML in '{path}': {message}")]
    ParseError { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Default)]
pub struct ConfigResult {
    pub config: Config,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub rules: RulesConfig,
    pub settings: Settings,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RulesConfig {
    pub enabled: Vec<String>,
    pub disabled: Vec<String>,
    #[serde(default)]
    pub severity: HashMap<String, SeverityValue>,
    pub static_analysis: Option<bool>,
    pub helpful_warnings: Option<bool>,
    /// Longest import chain no-cycle follows before giving up.
    pub max_depth: Option<usize>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SeverityValue {
    Error,
    Warning,
    Info,
    Hint,
}

impl From<SeverityValue> for Severity {
    fn from(value: SeverityValue) -> Self {
        match value {
            SeverityValue::Error => Severity::Error,
            SeverityValue::Warning => Severity::Warning,
            SeverityValue::Info => Severity::Info,
            SeverityValue::Hint => Severity::Hint,
        }
    }
}

/// Settings that shape how export maps are parsed, resolved and cached.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Extensions tried, in order, when a specifier omits one.
    pub extensions: Vec<String>,
    /// Regular expressions; resolved paths matching any of them get no export map.
    pub ignore: Vec<String>,
    /// Specifiers treated like Node builtins (never resolved, never reported).
    pub core_modules: Vec<String>,
    /// Capture `module.exports` / `exports.x` assignments and `require` calls.
    pub commonjs: bool,
    pub docstyle: Vec<String>,
    pub cache: CacheSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            ignore: vec!["node_modules".to_string()],
            core_modules: Vec::new(),
            commonjs: true,
            docstyle: vec!["jsdoc".to_string()],
            cache: CacheSettings::default(),
        }
    }
}

impl Settings {
    /// Hex SHA-256 over every setting that can change the content of an export map.
    ///
    /// Cache lifetime is deliberately left out: it changes when entries are
    /// re-checked, never what they contain.
    pub fn fingerprint(&self) -> String {
        let relevant = (
            &self.extensions,
            &self.ignore,
            &self.core_modules,
            self.commonjs,
            &self.docstyle,
        );
        let canonical = serde_json::to_string(&relevant).unwrap_or_default();
        format!("{:x}", Sha256::digest(canonical.as_bytes()))
    }

    pub fn captures_jsdoc(&self) -> bool {
        self.docstyle.iter().any(|style| style == "jsdoc")
    }

    /// Compiles the `ignore` patterns, skipping (and logging) invalid ones.
    pub fn ignore_patterns(&self) -> Vec<Regex> {
        self.ignore
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(err) => {
                    tracing::warn!(pattern = %pattern, error = %err, "invalid ignore pattern");
                    None
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheSettings {
    pub lifetime: Lifetime,
}

/// How long a resolved specifier is trusted before it is resolved again.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(try_from = "LifetimeValue")]
pub enum Lifetime {
    Seconds(u64),
    Forever,
}

impl Default for Lifetime {
    fn default() -> Self {
        Lifetime::Seconds(DEFAULT_CACHE_LIFETIME_SECS)
    }
}

impl Lifetime {
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Lifetime::Seconds(secs) => Some(Duration::from_secs(*secs)),
            Lifetime::Forever => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LifetimeValue {
    Seconds(u64),
    Keyword(String),
}

impl TryFrom<LifetimeValue> for Lifetime {
    type Error = String;

    fn try_from(value: LifetimeValue) -> Result<Self, Self::Error> {
        match value {
            LifetimeValue::Seconds(secs) => Ok(Lifetime::Seconds(secs)),
            LifetimeValue::Keyword(word) => match word.as_str() {
                "forever" | "infinity" | "∞" => Ok(Lifetime::Forever),
                other => Err(format!(
                    "invalid cache lifetime '{}', expected seconds or \"forever\"",
                    other
                )),
            },
        }
    }
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if !current.pop() {
            return None;
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })
}

pub fn load_config_with_warnings(path: &Path) -> Result<ConfigResult, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })?;

    let warnings = detect_unknown_keys(&content);

    Ok(ConfigResult { config, warnings })
}

fn detect_unknown_keys(content: &str) -> Vec<String> {
    let mut warnings = Vec::new();

    let table: toml::Table = match content.parse() {
        Ok(t) => t,
        Err(_) => return warnings,
    };

    let known_top: HashSet<&str> = KNOWN_TOP_LEVEL_KEYS.iter().copied().collect();
    for key in table.keys() {
        if !known_top.contains(key.as_str()) {
            warnings.push(format!("Unknown config option: '{}'", key));
        }
    }

    for (section, known) in [("rules", KNOWN_RULES_KEYS), ("settings", KNOWN_SETTINGS_KEYS)] {
        if let Some(toml::Value::Table(entries)) = table.get(section) {
            let known: HashSet<&str> = known.iter().copied().collect();
            for key in entries.keys() {
                if !known.contains(key.as_str()) {
                    warnings.push(format!("Unknown config option in [{}]: '{}'", section, key));
                }
            }
        }
    }

    warnings
}

pub fn load_config_or_default(start_dir: &Path) -> Config {
    find_config_file(start_dir)
        .and_then(|path| load_config(&path).ok())
        .unwrap_or_default()
}

pub fn load_config_or_default_with_warnings(start_dir: &Path) -> ConfigResult {
    match find_config_file(start_dir) {
        Some(path) => match load_config_with_warnings(&path) {
            Ok(result) => result,
            Err(err) => ConfigResult {
                config: Config::default(),
                warnings: vec![err.to_string()],
            },
        },
        None => ConfigResult::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn create_temp_dir() -> tempfile::TempDir {
        tempfile::tempdir().expect("Failed to create temp dir")
    }

    #[test]
    fn load_config_from_file() {
        let dir = create_temp_dir();
        let config_path = dir.path().join(CONFIG_FILENAME);
        fs::write(
            &config_path,
            r#"
[rules]
disabled = ["no-cycle"]
max_depth = 4

[rules.severity]
named = "warning"

[settings]
extensions = [".ts", ".js"]
commonjs = false
"#,
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();

        assert_eq!(config.rules.disabled, vec!["no-cycle"]);
        assert_eq!(config.rules.max_depth, Some(4));
        assert_eq!(
            config.rules.severity.get("named"),
            Some(&SeverityValue::Warning)
        );
        assert_eq!(config.settings.extensions, vec![".ts", ".js"]);
        assert!(!config.settings.commonjs);
        assert_eq!(config.settings.docstyle, vec!["jsdoc"]);
    }

    #[test]
    fn default_config_when_missing() {
        let dir = create_temp_dir();
        let config = load_config_or_default(dir.path());

        assert_eq!(config, Config::default());
        assert!(config.settings.commonjs);
        assert_eq!(config.settings.extensions.len(), DEFAULT_EXTENSIONS.len());
    }

    #[test]
    fn error_on_invalid_toml() {
        let dir = create_temp_dir();
        let config_path = dir.path().join(CONFIG_FILENAME);
        fs::write(&config_path, "this is not valid { toml }").unwrap();

        let err = load_config(&config_path).unwrap_err();

        match err {
            ConfigError::ParseError { path, message } => {
                assert_eq!(path, config_path);
                assert!(!message.is_empty());
            }
            _ => panic!("Expected ParseError"),
        }
    }

    #[test]
    fn find_config_file_in_parent_directory() {
        let parent = create_temp_dir();
        let child = parent.path().join("subdir");
        fs::create_dir(&child).unwrap();
        let config_path = parent.path().join(CONFIG_FILENAME);
        fs::write(&config_path, "").unwrap();

        let found = find_config_file(&child);

        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn cache_lifetime_accepts_seconds_and_forever() {
        let seconds: Config = toml::from_str("[settings.cache]\nlifetime = 5").unwrap();
        let forever: Config = toml::from_str("[settings.cache]\nlifetime = \"forever\"").unwrap();

        assert_eq!(seconds.settings.cache.lifetime, Lifetime::Seconds(5));
        assert_eq!(
            seconds.settings.cache.lifetime.as_duration(),
            Some(Duration::from_secs(5))
        );
        assert_eq!(forever.settings.cache.lifetime, Lifetime::Forever);
        assert_eq!(forever.settings.cache.lifetime.as_duration(), None);
        assert_eq!(
            Lifetime::default().as_duration(),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn cache_lifetime_rejects_unknown_keyword() {
        let result: Result<Config, _> = toml::from_str("[settings.cache]\nlifetime = \"soon\"");

        assert!(result.is_err());
    }

    #[test]
    fn fingerprint_is_stable_and_settings_sensitive() {
        let base = Settings::default();
        let same = Settings::default();
        let other = Settings {
            extensions: vec![".ts".to_string()],
            ..Settings::default()
        };

        assert_eq!(base.fingerprint(), same.fingerprint());
        assert_ne!(base.fingerprint(), other.fingerprint());
        assert_eq!(base.fingerprint().len(), 64);
    }

    #[test]
    fn fingerprint_ignores_cache_lifetime() {
        let base = Settings::default();
        let forever = Settings {
            cache: CacheSettings {
                lifetime: Lifetime::Forever,
            },
            ..Settings::default()
        };

        assert_eq!(base.fingerprint(), forever.fingerprint());
    }

    #[test]
    fn invalid_ignore_patterns_are_skipped() {
        let settings = Settings {
            ignore: vec!["node_modules".to_string(), "(".to_string()],
            ..Settings::default()
        };

        assert_eq!(settings.ignore_patterns().len(), 1);
    }

    #[test]
    fn severity_value_converts_to_severity() {
        assert_eq!(Severity::from(SeverityValue::Error), Severity::Error);
        assert_eq!(Severity::from(SeverityValue::Warning), Severity::Warning);
        assert_eq!(Severity::from(SeverityValue::Info), Severity::Info);
        assert_eq!(Severity::from(SeverityValue::Hint), Severity::Hint);
    }

    #[test]
    fn warns_on_unknown_options() {
        let dir = create_temp_dir();
        let config_path = dir.path().join(CONFIG_FILENAME);
        fs::write(
            &config_path,
            r#"
typo = true

[rules]
disabled = ["named"]
unknown_rule_option = true

[settings]
extensionz = [".js"]
"#,
        )
        .unwrap();

        let result = load_config_with_warnings(&config_path).unwrap();

        assert_eq!(result.config.rules.disabled, vec!["named"]);
        assert_eq!(result.warnings.len(), 3);
        assert!(result.warnings.iter().any(|w| w.contains("typo")));
        assert!(result.warnings.iter().any(|w| w.contains("[rules]")));
        assert!(result.warnings.iter().any(|w| w.contains("[settings]")));
    }

    #[test]
    fn invalid_config_surfaces_as_warning() {
        let dir = create_temp_dir();
        fs::write(dir.path().join(CONFIG_FILENAME), "[rules\n").unwrap();

        let result = load_config_or_default_with_warnings(dir.path());

        assert_eq!(result.config, Config::default());
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("Invalid TOML"));
    }
}
