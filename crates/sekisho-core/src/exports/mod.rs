//! Export maps: what a module exports, and where those exports come from
//!
//! An [`ExportMap`] summarises one file: its own exported bindings, explicit
//! re-exports, `export *` dependencies, what it imports, and any errors met while
//! building it. Maps are immutable; the [`ExportMapRegistry`] owns them, hands out
//! `Rc` handles and replaces a map wholesale when its file changes.
//!
//! Links between maps (re-export targets, `export *` dependencies, namespace
//! entries) are stored as resolved paths and loaded through the registry on demand,
//! so a map never owns another map.

mod builder;
mod doc;
mod lookup;
mod registry;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use swc_common::Span;

use crate::diagnostic::Diagnostic;
use crate::rules::Severity;
use crate::visitor::VisitorContext;

pub use builder::BuildContext;
pub(crate) use builder::decl_bindings;
pub use doc::{DocInfo, DocTag};
pub use lookup::{DeepLookup, ResolvedExport};
pub use registry::{ExportMapRegistry, RegistryStats};

pub const DEFAULT_EXPORT: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportKind {
    Value,
    TypeOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseGoal {
    Module,
    Script,
    /// No import/export syntax at all; could be either.
    Ambiguous,
}

/// 1-based position in the file an export map was built from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

/// Lookup-only link from a namespace-valued export to the module it exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceLink {
    pub specifier: String,
    pub resolved: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportEntry {
    pub name: String,
    pub kind: ExportKind,
    pub namespace: Option<NamespaceLink>,
    pub location: Location,
    pub doc: Option<DocInfo>,
}

impl ExportEntry {
    pub fn is_type_only(&self) -> bool {
        self.kind == ExportKind::TypeOnly
    }

    pub fn deprecation(&self) -> Option<&str> {
        self.doc.as_ref().and_then(|doc| doc.deprecated.as_deref())
    }
}

/// `export { imported as local } from 'specifier'`, or a local re-export of an import binding.
#[derive(Debug, Clone, PartialEq)]
pub struct ReexportEntry {
    /// Name this module exports.
    pub local: String,
    /// Name looked up in the target module.
    pub imported: String,
    pub specifier: String,
    pub resolved: Option<PathBuf>,
    pub kind: ExportKind,
    pub location: Location,
    pub doc: Option<DocInfo>,
}

/// One `export * from 'specifier'`, resolved when the map was built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub specifier: String,
    pub resolved: Option<PathBuf>,
    pub location: Location,
}

/// Everything a module pulls from one dependency.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportedNames {
    pub specifier: String,
    pub names: BTreeSet<String>,
    pub namespace: bool,
    pub type_only: bool,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedSpecifier {
    pub specifier: String,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExportMapError {
    #[error("{message} ({line}:{column})")]
    Parse {
        message: String,
        line: usize,
        column: usize,
    },
    #[error("Unable to resolve path to module '{specifier}' ({}:{})", .location.line, .location.column)]
    Resolution {
        specifier: String,
        location: Location,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportMap {
    path: PathBuf,
    namespace: BTreeMap<String, ExportEntry>,
    reexports: BTreeMap<String, ReexportEntry>,
    dependencies: Vec<Dependency>,
    imports: BTreeMap<PathBuf, ImportedNames>,
    unresolved: Vec<UnresolvedSpecifier>,
    errors: Vec<ExportMapError>,
    parse_goal: ParseGoal,
    exports_unknown: bool,
    doc: Option<DocInfo>,
}

impl ExportMap {
    pub(crate) fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            namespace: BTreeMap::new(),
            reexports: BTreeMap::new(),
            dependencies: Vec::new(),
            imports: BTreeMap::new(),
            unresolved: Vec::new(),
            errors: Vec::new(),
            parse_goal: ParseGoal::Ambiguous,
            exports_unknown: false,
            doc: None,
        }
    }

    /// Map for a file whose bytes could not be read as source text.
    pub(crate) fn unreadable(path: &Path, message: &str) -> Self {
        let mut map = Self::empty(path);
        map.errors.push(ExportMapError::Parse {
            message: message.to_string(),
            line: 1,
            column: 1,
        });
        map
    }

    /// Builds the map for `path` from its source text. Never fails: problems are
    /// recorded in [`ExportMap::errors`].
    pub fn build(path: &Path, source: &str, ctx: &BuildContext) -> Self {
        builder::build(path, source, ctx)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Exports declared in this module itself, keyed by exported name.
    pub fn namespace(&self) -> &BTreeMap<String, ExportEntry> {
        &self.namespace
    }

    pub fn reexports(&self) -> &BTreeMap<String, ReexportEntry> {
        &self.reexports
    }

    /// `export *` targets in source order.
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn imports(&self) -> &BTreeMap<PathBuf, ImportedNames> {
        &self.imports
    }

    pub fn unresolved(&self) -> &[UnresolvedSpecifier] {
        &self.unresolved
    }

    pub fn errors(&self) -> &[ExportMapError] {
        &self.errors
    }

    pub fn parse_goal(&self) -> ParseGoal {
        self.parse_goal
    }

    /// True for CommonJS scripts whose named exports cannot be read statically,
    /// such as `module.exports = createApi()` or a file that only calls `require`.
    /// A miss in such a map says nothing.
    pub fn exports_unknown(&self) -> bool {
        self.exports_unknown
    }

    /// Module-level documentation (a leading block carrying `@module`).
    pub fn doc(&self) -> Option<&DocInfo> {
        self.doc.as_ref()
    }

    /// True when the file failed to parse; nothing else in the map can be trusted.
    pub fn is_broken(&self) -> bool {
        self.errors
            .iter()
            .any(|err| matches!(err, ExportMapError::Parse { .. }))
    }

    /// Local export entry; does not follow re-exports or `export *`.
    pub fn get(&self, name: &str) -> Option<&ExportEntry> {
        self.namespace.get(name)
    }

    /// Whether this module itself exports `name`, directly or as an explicit re-export.
    pub fn has(&self, name: &str) -> bool {
        self.namespace.contains_key(name) || self.reexports.contains_key(name)
    }

    /// Scripts always have a default export under Node's CommonJS interop.
    pub fn has_default(&self) -> bool {
        self.parse_goal == ParseGoal::Script
            || self
                .namespace
                .get(DEFAULT_EXPORT)
                .is_some_and(|entry| !entry.is_type_only())
            || self
                .reexports
                .get(DEFAULT_EXPORT)
                .is_some_and(|entry| entry.kind == ExportKind::Value)
    }

    /// Names exported by this module itself, excluding `export *` contributions.
    pub fn exported_names(&self) -> BTreeSet<&str> {
        self.namespace
            .keys()
            .chain(self.reexports.keys())
            .map(String::as_str)
            .collect()
    }

    /// True when nothing at all is exported, not even through `export *`.
    pub fn is_empty(&self) -> bool {
        self.namespace.is_empty() && self.reexports.is_empty() && self.dependencies.is_empty()
    }

    /// Forwards this map's errors as one diagnostic on the importing node.
    pub fn report_errors(
        &self,
        rule_id: &str,
        severity: Severity,
        specifier: &str,
        ctx: &VisitorContext,
        span: Span,
    ) -> Diagnostic {
        let (line, column, end_line, end_column) = ctx.span_to_range(span);
        Diagnostic::new(
            rule_id,
            severity,
            self.error_message(specifier),
            ctx.filename(),
            line,
            column,
        )
        .with_end(end_line, end_column)
    }

    pub fn error_message(&self, specifier: &str) -> String {
        let errors: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        format!(
            "Errors encountered while analysing imported module '{}': {}",
            specifier,
            errors.join(", ")
        )
    }
}
