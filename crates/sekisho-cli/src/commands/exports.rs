//! Exports command - prints what one module exports and where it comes from

use std::fmt::Write as _;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Args;
use sekisho_core::config::load_config_or_default_with_warnings;
use sekisho_core::exports::{ExportMap, ExportMapRegistry};

#[derive(Args, Debug)]
pub struct ExportsArgs {
    /// Module to inspect
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Look a name up through re-exports and `export *`, printing the path taken
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,
}

impl ExportsArgs {
    pub fn run(&self) -> Result<()> {
        let path = std::path::absolute(&self.file)
            .with_context(|| format!("Cannot resolve {}", self.file.display()))?;
        let config_result = load_config_or_default_with_warnings(&path);
        for warning in &config_result.warnings {
            eprintln!("warning: {}", warning);
        }

        let registry = ExportMapRegistry::new(config_result.config.settings);
        let Some(map) = registry.load(&path) else {
            anyhow::bail!(
                "No export map for {} (unreadable, or ignored by settings)",
                self.file.display()
            );
        };

        print!("{}", render(&map, &registry, self.name.as_deref()));
        tracing::debug!(stats = ?registry.stats(), "export map registry");
        Ok(())
    }
}

fn render(map: &Rc<ExportMap>, registry: &ExportMapRegistry, name: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({:?})", map.path().display(), map.parse_goal());
    if let Some(doc) = map.doc() {
        if !doc.description.is_empty() {
            let _ = writeln!(out, "  {}", doc.description.replace('\n', " "));
        }
        if let Some(reason) = &doc.deprecated {
            let _ = writeln!(out, "  deprecated: {}", reason);
        }
    }

    if map.exports_unknown() {
        let _ = writeln!(out, "  named exports are assigned at runtime");
    }

    if !map.namespace().is_empty() {
        let _ = writeln!(out, "\nexports:");
        for entry in map.namespace().values() {
            let mut line = format!(
                "  {} {}:{}",
                entry.name, entry.location.line, entry.location.column
            );
            if entry.is_type_only() {
                line.push_str(" type");
            }
            if let Some(link) = &entry.namespace {
                let _ = write!(line, " namespace of '{}'", link.specifier);
            }
            if let Some(reason) = entry.deprecation() {
                let _ = write!(line, " deprecated: {}", reason);
            }
            let _ = writeln!(out, "{}", line);
        }
    }

    if !map.reexports().is_empty() {
        let _ = writeln!(out, "\nre-exports:");
        for reexport in map.reexports().values() {
            let _ = writeln!(
                out,
                "  {} <- {} from '{}'{}",
                reexport.local,
                reexport.imported,
                reexport.specifier,
                if reexport.resolved.is_none() { " (unresolved)" } else { "" }
            );
        }
    }

    if !map.dependencies().is_empty() {
        let _ = writeln!(out, "\nexport * from:");
        for dependency in map.dependencies() {
            let target = dependency
                .resolved
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "(unresolved)".to_string());
            let _ = writeln!(out, "  '{}' -> {}", dependency.specifier, target);
        }
    }

    if !map.errors().is_empty() {
        let _ = writeln!(out, "\nerrors:");
        for error in map.errors() {
            let _ = writeln!(out, "  {}", error);
        }
    }

    if let Some(name) = name {
        let lookup = map.has_deep(name, registry);
        let _ = writeln!(out);
        if lookup.found {
            let _ = writeln!(out, "'{}' found via {}", name, lookup.describe_path());
        } else if let Some(broken) = lookup.broken() {
            let _ = writeln!(
                out,
                "'{}' unknown: {} failed to parse",
                name,
                broken.path().display()
            );
        } else if let Some(opaque) = lookup.opaque() {
            let _ = writeln!(
                out,
                "'{}' unknown: {} assigns its exports at runtime",
                name,
                opaque.path().display()
            );
        } else if !lookup.unresolved.is_empty() {
            let _ = writeln!(
                out,
                "'{}' unknown: cannot resolve {}",
                name,
                lookup.unresolved.join(", ")
            );
        } else {
            let _ = writeln!(out, "'{}' not found via {}", name, lookup.describe_path());
        }
    }

    out
}
