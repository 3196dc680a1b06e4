//! default rule (I003): a default import needs a default export

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
    DefaultImport,
    id = "I003",
    name = "default",
    description = "Ensure a default export is present, given a default import",
    category = StaticAnalysis,
    severity = Error,
    examples = "// utils.js\nexport const format = () => {};\n\n// Bad\nimport utils from './utils';\n\n// Good\nimport * as utils from './utils';"
);

impl Rule for DefaultImport {
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
            let (src, default_span) = match decl {
                ModuleDecl::Import(import) if !import.type_only => {
                    let span = import.specifiers.iter().find_map(|specifier| match specifier {
                        ImportSpecifier::Default(default) => Some(default.span),
                        _ => None,
                    });
                    (&*import.src, span)
                }
                ModuleDecl::ExportNamed(export) if !export.type_only => {
                    let Some(src) = &export.src else {
                        continue;
                    };
                    let span = export.specifiers.iter().find_map(|specifier| match specifier {
                        ExportSpecifier::Default(default) => Some(default.exported.span),
                        ExportSpecifier::Named(named)
                            if !named.is_type_only
                                && export_name(&named.orig, &visitor) == DEFAULT_EXPORT =>
                        {
                            Some(named.span)
                        }
                        _ => None,
                    });
                    (&**src, span)
                }
                _ => continue,
            };
            let Some(span) = default_span else {
                continue;
            };

            let specifier = literal_value(src, &visitor);
            let map = match imported_map(&specifier, src.span, &self.metadata, ctx, &visitor) {
                Imported::Skip => continue,
                Imported::Broken(diagnostic) => {
                    diagnostics.push(diagnostic);
                    continue;
                }
                Imported::Map(map) => map,
            };

            if map.has_default() {
                continue;
            }

            let (line, column, end_line, end_column) = visitor.span_to_range(span);
            diagnostics.push(
                Diagnostic::new(
                    self.metadata.id,
                    self.metadata.severity,
                    format!(
                        "No default export found in imported module '{}'.",
                        specifier
                    ),
                    visitor.filename(),
                    line,
                    column,
                )
                .with_end(end_line, end_column),
            );
        }

        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::imports::test_support::{messages, run};

    const FILES: &[(&str, &str)] = &[
        ("/project/src/with_default.js", "export default function main() {}"),
        ("/project/src/named_only.js", "export const a = 1;"),
        ("/project/src/forwards.js", "export { default } from './with_default.js';"),
        ("/project/src/star.js", "export * from './with_default.js';"),
        ("/project/src/cjs.js", "module.exports = function () {};"),
        ("/project/src/req.js", "const fs = require('fs');\nfs.readFileSync('x');"),
        ("/project/src/cjs_named.js", "exports.a = 1;"),
        ("/project/src/types.ts", "export default interface Shape { sides: number }\nexport const x = 1;"),
    ];

    fn run_default(code: &str) -> Vec<Diagnostic> {
        run(&DefaultImport::new(), FILES, code)
    }

    #[test]
    fn default_export_present() {
        let diagnostics = run_default(
            "import main from './with_default';\nimport fwd from './forwards';\nimport cjs from './cjs';\nimport req from './req';\nimport named from './cjs_named';",
        );

        assert!(diagnostics.is_empty());
    }

    #[test]
    fn reports_missing_default() {
        let diagnostics = run_default("import a from './named_only';");

        assert_eq!(
            messages(&diagnostics),
            vec!["No default export found in imported module './named_only'."]
        );
        assert_eq!(diagnostics[0].rule_id, "I003");
        assert_eq!((diagnostics[0].line, diagnostics[0].column), (1, 8));
    }

    #[test]
    fn default_is_not_forwarded_by_export_star() {
        let diagnostics = run_default("import main from './star';");

        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn type_only_default_does_not_count() {
        let diagnostics = run_default("import Shape from './types';");

        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn reexport_of_default_is_checked() {
        let diagnostics = run_default("export { default } from './named_only';");

        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn named_and_namespace_imports_are_ignored() {
        let diagnostics = run_default(
            "import { a } from './named_only';\nimport * as ns from './named_only';",
        );

        assert!(diagnostics.is_empty());
    }

    #[test]
    fn broken_module_reports_its_errors() {
        let diagnostics = run(
            &DefaultImport::new(),
            &[("/project/src/bad.js", "export default (")],
            "import bad from './bad';",
        );

        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("'./bad'"));
        assert!(diagnostics[0].message.starts_with("Errors encountered"));
    }
}
