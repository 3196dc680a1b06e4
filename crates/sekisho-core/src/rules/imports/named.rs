//! named rule (I002): named imports and re-exports must exist in the target module
//!
//! Lookups go through `has_deep`, so a name provided by an `export *` chain
//! counts. Misses reached through re-exports name the chain that was walked.

use swc_common::Span;
use swc_ecma_ast::{ExportSpecifier, ImportSpecifier, ModuleDecl, ModuleItem};

use super::{Imported, imported_map};
use crate::declare_rule;
use crate::diagnostic::Diagnostic;
use crate::exports::DEFAULT_EXPORT;
use crate::parser::ParsedFile;
use crate::rules::helpers::{export_name, literal_value};
use crate::rules::{Rule, RuleContext, RuleMetadata};
use crate::visitor::VisitorContext;

declare_rule!(
    Named,
    id = "I002",
    name = "named",
    description = "Ensure named imports correspond to a named export in the remote file",
    category = StaticAnalysis,
    severity = Error,
    examples = "// utils.js\nexport const format = () => {};\n\n// Bad\nimport { fromat } from './utils';\n\n// Good\nimport { format } from './utils';"
);

impl Rule for Named {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn check(&self, file: &ParsedFile, ctx: &RuleContext) -> Vec<Diagnostic> {
        let Some(module) = file.module() else {
            return Vec::new();
        };

        let visitor = VisitorContext::new(file);
        let mut diagnostics = Vec::new();

        for item in &module.body {
            let ModuleItem::ModuleDecl(decl) = item else {
                continue;
            };
            let (src, names) = match decl {
                ModuleDecl::Import(import) if !import.type_only => {
                    (&*import.src, imported_names(&import.specifiers, &visitor))
                }
                ModuleDecl::ExportNamed(export) if !export.type_only => match &export.src {
                    Some(src) => (&**src, reexported_names(&export.specifiers, &visitor)),
                    None => continue,
                },
                _ => continue,
            };
            if names.is_empty() {
                continue;
            }

            let specifier = literal_value(src, &visitor);
            let map = match imported_map(&specifier, src.span, &self.metadata, ctx, &visitor) {
                Imported::Skip => continue,
                Imported::Broken(diagnostic) => {
                    diagnostics.push(diagnostic);
                    continue;
                }
                Imported::Map(map) => map,
            };

            for (name, span) in names {
                let lookup = map.has_deep(&name, ctx.exports);
                if lookup.found {
                    continue;
                }
                if let Some(broken) = lookup.broken() {
                    diagnostics.push(broken.report_errors(
                        self.metadata.id,
                        self.metadata.severity,
                        &specifier,
                        &visitor,
                        span,
                    ));
                    continue;
                }
                if !lookup.is_conclusive() {
                    tracing::debug!(%name, %specifier, unresolved = ?lookup.unresolved, "named: lookup inconclusive");
                    continue;
                }

                let message = if lookup.path.len() > 1 {
                    format!("{} not found via {}", name, lookup.describe_path())
                } else {
                    format!("{} not found in '{}'", name, specifier)
                };
                let (line, column, end_line, end_column) = visitor.span_to_range(span);
                diagnostics.push(
                    Diagnostic::new(
                        self.metadata.id,
                        self.metadata.severity,
                        message,
                        visitor.filename(),
                        line,
                        column,
                    )
                    .with_end(end_line, end_column),
                );
            }
        }

        diagnostics
    }
}

/// `import { a, b as c }`: remote names with the span to report on.
fn imported_names(specifiers: &[ImportSpecifier], ctx: &VisitorContext) -> Vec<(String, Span)> {
    specifiers
        .iter()
        .filter_map(|specifier| match specifier {
            ImportSpecifier::Named(named) if !named.is_type_only => {
                let name = named
                    .imported
                    .as_ref()
                    .map(|imported| export_name(imported, ctx))
                    .unwrap_or_else(|| named.local.sym.to_string());
                (name != DEFAULT_EXPORT).then_some((name, named.span))
            }
            _ => None,
        })
        .collect()
}

/// `export { a, b as c } from`: names looked up in the source module.
fn reexported_names(specifiers: &[ExportSpecifier], ctx: &VisitorContext) -> Vec<(String, Span)> {
    specifiers
        .iter()
        .filter_map(|specifier| match specifier {
            ExportSpecifier::Named(named) if !named.is_type_only => {
                let name = export_name(&named.orig, ctx);
                (name != DEFAULT_EXPORT).then_some((name, named.span))
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::imports::test_support::{messages, run};

    fn run_named(files: &[(&str, &str)], code: &str) -> Vec<Diagnostic> {
        run(&Named::new(), files, code)
    }

    const UTILS: (&str, &str) = (
        "/project/src/utils.js",
        "export const format = 1;\nexport function parse() {}\nexport default 3;",
    );

    #[test]
    fn existing_names_pass() {
        let diagnostics = run_named(
            &[UTILS],
            "import { format, parse as p } from './utils';\nexport { format as f } from './utils';",
        );

        assert!(diagnostics.is_empty());
    }

    #[test]
    fn reports_missing_named_import() {
        let diagnostics = run_named(&[UTILS], "import { format, fromat } from './utils';");

        assert_eq!(messages(&diagnostics), vec!["fromat not found in './utils'"]);
        assert_eq!(diagnostics[0].rule_id, "I002");
        assert_eq!((diagnostics[0].line, diagnostics[0].column), (1, 18));
    }

    #[test]
    fn reports_missing_named_reexport() {
        let diagnostics = run_named(&[UTILS], "export { nope } from './utils';");

        assert_eq!(messages(&diagnostics), vec!["nope not found in './utils'"]);
    }

    #[test]
    fn names_from_export_star_are_found() {
        let diagnostics = run_named(
            &[
                UTILS,
                ("/project/src/index.js", "export * from './utils';"),
            ],
            "import { parse } from './index';",
        );

        assert!(diagnostics.is_empty());
    }

    #[test]
    fn miss_through_reexport_names_the_chain() {
        let diagnostics = run_named(
            &[
                ("/project/src/a.js", "export const other = 1;"),
                ("/project/src/b.js", "export { x } from './a.js';"),
            ],
            "import { x } from './b';",
        );

        assert_eq!(messages(&diagnostics), vec!["x not found via b.js -> a.js"]);
    }

    #[test]
    fn parse_errors_are_forwarded_instead_of_not_found() {
        let diagnostics = run_named(
            &[("/project/src/x.js", "export const = ;")],
            "import { z } from './x';",
        );

        assert_eq!(diagnostics.len(), 1);
        assert!(
            diagnostics[0]
                .message
                .starts_with("Errors encountered while analysing imported module './x':")
        );
    }

    #[test]
    fn broken_module_deep_in_chain_is_forwarded() {
        let diagnostics = run_named(
            &[
                ("/project/src/index.js", "export * from './broken.js';"),
                ("/project/src/broken.js", "export function ( {"),
            ],
            "import { z } from './index';",
        );

        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.starts_with("Errors encountered"));
    }

    #[test]
    fn unresolved_star_dependency_is_inconclusive() {
        let diagnostics = run_named(
            &[("/project/src/index.js", "export * from 'some-package';")],
            "import { z } from './index';",
        );

        assert!(diagnostics.is_empty());
    }

    #[test]
    fn skips_default_and_unresolved() {
        let diagnostics = run_named(
            &[UTILS],
            "import { default as d } from './utils';\nimport { gone } from './missing';\nimport { readFile } from 'fs';",
        );

        assert!(diagnostics.is_empty());
    }

    #[test]
    fn ambiguous_modules_are_not_checked() {
        let diagnostics = run_named(
            &[("/project/src/script.js", "var globalThing = 1;")],
            "import { anything } from './script';",
        );

        assert!(diagnostics.is_empty());
    }

    #[test]
    fn commonjs_named_exports_count() {
        let diagnostics = run_named(
            &[("/project/src/cjs.js", "exports.ready = true;\nmodule.exports.go = () => {};")],
            "import { ready, go, stop } from './cjs';",
        );

        assert_eq!(messages(&diagnostics), vec!["stop not found in './cjs'"]);
    }

    #[test]
    fn scripts_with_unknown_exports_are_not_checked() {
        let diagnostics = run_named(
            &[
                ("/project/src/api.js", "module.exports = createApi();"),
                ("/project/src/req.js", "const setup = require('./setup');\nsetup();"),
                ("/project/src/setup.js", "module.exports = function () {};"),
                ("/project/src/barrel.js", "export * from './api.js';"),
            ],
            "import { get } from './api';\nimport { install } from './req';\nimport { post } from './barrel';",
        );

        assert!(diagnostics.is_empty());
    }
}
