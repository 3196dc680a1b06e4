//! no-named-as-default rule (I008): default import named like a named export
//!
//! `import foo from './foo'` where `./foo` also exports a `foo` usually means the
//! author wanted `import { foo }`.

use swc_ecma_ast::{ExportSpecifier, ImportSpecifier, ModuleDecl, ModuleItem};

use super::{Imported, imported_map};
use crate::declare_rule;
use crate::diagnostic::Diagnostic;
use crate::parser::ParsedFile;
use crate::rules::helpers::literal_value;
use crate::rules::{Rule, RuleContext, RuleMetadata};
use crate::visitor::VisitorContext;

declare_rule!(
    NoNamedAsDefault,
    id = "I008",
    name = "no-named-as-default",
    description = "Report use of an exported name as the locally imported name of a default export",
    category = HelpfulWarnings,
    severity = Warning,
    examples = "// foo.js\nexport default 'foo';\nexport const bar = 'baz';\n\n// Bad\nimport bar from './foo';\n\n// Good\nimport foo from './foo';\nimport { bar } from './foo';"
);

impl Rule for NoNamedAsDefault {
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
            let (src, local) = match decl {
                ModuleDecl::Import(import) if !import.type_only => {
                    let local = import.specifiers.iter().find_map(|specifier| match specifier {
                        ImportSpecifier::Default(default) => Some(&default.local),
                        _ => None,
                    });
                    (&*import.src, local)
                }
                ModuleDecl::ExportNamed(export) => {
                    let Some(src) = &export.src else {
                        continue;
                    };
                    let local = export.specifiers.iter().find_map(|specifier| match specifier {
                        ExportSpecifier::Default(default) => Some(&default.exported),
                        _ => None,
                    });
                    (&**src, local)
                }
                _ => continue,
            };
            let Some(local) = local else {
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

            let name = local.sym.as_ref();
            if !map.has_default() || !map.has_deep(name, ctx.exports).found {
                continue;
            }

            let (line, column, end_line, end_column) = visitor.span_to_range(local.span);
            diagnostics.push(
                Diagnostic::new(
                    self.metadata.id,
                    self.metadata.severity,
                    format!(
                        "Using exported name '{}' as identifier for default export.",
                        name
                    ),
                    visitor.filename(),
                    line,
                    column,
                )
                .with_end(end_line, end_column)
                .with_suggestion(format!("import {{ {} }} from '{}'", name, specifier)),
            );
        }

        diagnostics
    }
}
