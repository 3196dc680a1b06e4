//! Module specifier resolution
//!
//! Maps an import specifier to an absolute file path. The registry only ever
//! talks to the [`Resolver`] trait; [`NodeResolver`] is the default strategy and
//! follows the Node lookup order closely enough for lint purposes.

use std::path::{Path, PathBuf};

use path_clean::PathClean;

use crate::config::Settings;
use crate::fs::FileSystem;

/// Node builtin modules; their specifiers never resolve to a file.
const BUILTIN_MODULES: &[&str] = &[
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "sys",
    "timers",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Everything a resolver may consult besides the specifier itself.
pub struct ResolveContext<'a> {
    pub from_file: &'a Path,
    pub settings: &'a Settings,
    pub fs: &'a dyn FileSystem,
}

pub trait Resolver {
    /// Absolute path for `specifier`, or `None` when it is unresolved or a builtin.
    fn resolve(&self, specifier: &str, ctx: &ResolveContext) -> Option<PathBuf>;
}

/// True for Node builtins (`fs`, `fs/promises`, `node:fs`) and configured core modules.
pub fn is_core_module(specifier: &str, settings: &Settings) -> bool {
    if specifier.starts_with("node:") {
        return true;
    }
    if settings.core_modules.iter().any(|m| m == specifier) {
        return true;
    }
    let root = specifier.split('/').next().unwrap_or(specifier);
    BUILTIN_MODULES.contains(&root)
}

pub fn is_relative(specifier: &str) -> bool {
    specifier == "." || specifier == ".." || specifier.starts_with("./") || specifier.starts_with("../")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NodeResolver;

impl Resolver for NodeResolver {
    fn resolve(&self, specifier: &str, ctx: &ResolveContext) -> Option<PathBuf> {
        if specifier.is_empty() || is_core_module(specifier, ctx.settings) {
            return None;
        }

        let dir = ctx.from_file.parent().unwrap_or(Path::new(""));

        if is_relative(specifier) || specifier.starts_with('/') {
            let candidate = dir.join(specifier).clean();
            return resolve_file_or_directory(&candidate, ctx);
        }

        resolve_package(specifier, dir, ctx)
    }
}

fn resolve_file_or_directory(candidate: &Path, ctx: &ResolveContext) -> Option<PathBuf> {
    try_extensions(candidate, ctx).or_else(|| try_index_files(candidate, ctx))
}

fn try_extensions(candidate: &Path, ctx: &ResolveContext) -> Option<PathBuf> {
    if ctx.fs.is_file(candidate) {
        return Some(candidate.to_path_buf());
    }

    ctx.settings.extensions.iter().find_map(|ext| {
        let mut with_ext = candidate.as_os_str().to_owned();
        with_ext.push(ext);
        let path = PathBuf::from(with_ext);
        ctx.fs.is_file(&path).then_some(path)
    })
}

fn try_index_files(dir: &Path, ctx: &ResolveContext) -> Option<PathBuf> {
    if !ctx.fs.is_dir(dir) {
        return None;
    }
    ctx.settings.extensions.iter().find_map(|ext| {
        let path = dir.join(format!("index{}", ext));
        ctx.fs.is_file(&path).then_some(path)
    })
}

/// Splits `@scope/pkg/sub/path` into (`@scope/pkg`, `sub/path`).
fn split_package_specifier(specifier: &str) -> (&str, &str) {
    let name_segments = if specifier.starts_with('@') { 2 } else { 1 };
    let mut boundary = specifier.len();
    let mut seen = 0;
    for (index, ch) in specifier.char_indices() {
        if ch == '/' {
            seen += 1;
            if seen == name_segments {
                boundary = index;
                break;
            }
        }
    }
    let (name, rest) = specifier.split_at(boundary);
    (name, rest.trim_start_matches('/'))
}

fn resolve_package(specifier: &str, from_dir: &Path, ctx: &ResolveContext) -> Option<PathBuf> {
    let (name, subpath) = split_package_specifier(specifier);

    for ancestor in from_dir.ancestors() {
        let package_dir = ancestor.join("node_modules").join(name);
        if !ctx.fs.is_dir(&package_dir) {
            continue;
        }

        if !subpath.is_empty() {
            return resolve_file_or_directory(&package_dir.join(subpath).clean(), ctx);
        }

        if let Some(entry) = package_entry_point(&package_dir, ctx) {
            let candidate = package_dir.join(entry).clean();
            if let Some(found) = resolve_file_or_directory(&candidate, ctx) {
                return Some(found);
            }
        }
        return try_index_files(&package_dir, ctx);
    }

    None
}

fn package_entry_point(package_dir: &Path, ctx: &ResolveContext) -> Option<String> {
    let manifest_path = package_dir.join("package.json");
    let content = ctx.fs.read_to_string(&manifest_path).ok()?;
    let manifest: serde_json::Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(path = %manifest_path.display(), error = %err, "invalid package.json");
            return None;
        }
    };

    ["module", "main"]
        .iter()
        .find_map(|field| manifest.get(*field)?.as_str().map(str::to_string))
}
