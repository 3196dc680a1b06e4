//! Import/export rules
//!
//! Every rule here reads other modules through the export-map registry in
//! [`RuleContext`](crate::rules::RuleContext); none of them parses a dependency
//! itself.

mod default;
mod export;
mod named;
mod namespace;
mod no_cycle;
mod no_deprecated;
mod no_named_as_default;
mod no_unresolved;

pub use default::DefaultImport;
pub use export::Export;
pub use named::Named;
pub use namespace::Namespace;
pub use no_cycle::NoCycle;
pub use no_deprecated::NoDeprecated;
pub use no_named_as_default::NoNamedAsDefault;
pub use no_unresolved::NoUnresolved;

use std::rc::Rc;

use swc_common::Span;

use crate::diagnostic::Diagnostic;
use crate::exports::{ExportMap, ParseGoal};
use crate::rules::{RuleContext, RuleMetadata};
use crate::visitor::VisitorContext;

/// What a rule gets back when it asks for an imported module's exports.
pub(crate) enum Imported {
    /// Nothing to check against: unresolved, ignored, builtin, not a module, or a
    /// script whose exports are unknown.
    Skip,
    /// The module failed to parse; the diagnostic forwards its errors.
    Broken(Diagnostic),
    Map(Rc<ExportMap>),
}

/// Loads the export map for `specifier` and sorts it into [`Imported`].
pub(crate) fn imported_map(
    specifier: &str,
    span: Span,
    metadata: &RuleMetadata,
    ctx: &RuleContext,
    visitor: &VisitorContext,
) -> Imported {
    let Some(map) = ctx.exports.get(specifier, visitor.file().path()) else {
        return Imported::Skip;
    };
    if map.is_broken() {
        return Imported::Broken(map.report_errors(
            metadata.id,
            metadata.severity,
            specifier,
            visitor,
            span,
        ));
    }
    if map.parse_goal() == ParseGoal::Ambiguous || map.exports_unknown() {
        return Imported::Skip;
    }
    Imported::Map(map)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::rc::Rc;

    use crate::config::Settings;
    use crate::diagnostic::Diagnostic;
    use crate::exports::ExportMapRegistry;
    use crate::fs::MemoryFileSystem;
    use crate::parser::ParsedFile;
    use crate::rules::{Rule, RuleContext, RuleOptions};

    pub const ENTRY: &str = "/project/src/main.js";

    /// Registry over an in-memory project; paths are absolute.
    pub fn registry(files: &[(&str, &str)]) -> ExportMapRegistry {
        let fs = MemoryFileSystem::new();
        for (path, content) in files {
            fs.write(*path, *content);
        }
        ExportMapRegistry::with_file_system(Settings::default(), Rc::new(fs))
    }

    pub fn run_with_options(
        rule: &dyn Rule,
        files: &[(&str, &str)],
        code: &str,
        options: RuleOptions,
    ) -> Vec<Diagnostic> {
        let mut all = files.to_vec();
        all.push((ENTRY, code));
        let exports = registry(&all);
        let file = ParsedFile::from_source(ENTRY, code);
        let ctx = RuleContext {
            exports: &exports,
            options: &options,
        };
        rule.check(&file, &ctx)
    }

    pub fn run(rule: &dyn Rule, files: &[(&str, &str)], code: &str) -> Vec<Diagnostic> {
        run_with_options(rule, files, code, RuleOptions::default())
    }

    pub fn messages(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics.iter().map(|d| d.message.as_str()).collect()
    }
}
