//! export rule (I005): duplicate exports and empty `export *`
//!
//! Names contributed by `export * from` count as exports of this module, so a
//! local export colliding with one of them is reported on both sides. Type and
//! value exports live in separate spaces; TypeScript overload signatures and
//! namespace declarations merge instead of colliding.

use std::collections::HashMap;

use swc_common::Span;
use swc_ecma_ast::{Decl, DefaultDecl, ExportSpecifier, ModuleDecl, ModuleItem};

use super::{Imported, imported_map};
use crate::declare_rule;
use crate::diagnostic::Diagnostic;
use crate::exports::{DEFAULT_EXPORT, ExportKind, decl_bindings};
use crate::parser::ParsedFile;
use crate::rules::helpers::{export_name, literal_value};
use crate::rules::{Rule, RuleContext, RuleMetadata};
use crate::visitor::VisitorContext;

declare_rule!(
    Export,
    id = "I005",
    name = "export",
    description = "Report any invalid exports, i.e. re-export of the same name",
    category = HelpfulWarnings,
    severity = Error,
    examples = "// Bad\nexport const foo = 1;\nexport { bar as foo };\n\nexport default 1;\nexport { x as default };\n\n// Good\nexport const foo = 1;\nexport { bar };"
);

#[derive(Default)]
struct ExportedNames {
    order: Vec<(String, bool)>,
    spans: HashMap<(String, bool), Vec<Span>>,
}

impl ExportedNames {
    fn add(&mut self, name: String, type_only: bool, span: Span) {
        let key = (name, type_only);
        match self.spans.get_mut(&key) {
            Some(spans) => spans.push(span),
            None => {
                self.order.push(key.clone());
                self.spans.insert(key, vec![span]);
            }
        }
    }

    fn duplicates(&self) -> impl Iterator<Item = (&str, &Span)> {
        self.order.iter().flat_map(move |key| {
            let spans = &self.spans[key];
            let duplicated: &[Span] = if spans.len() > 1 { spans } else { &[] };
            duplicated.iter().map(move |span| (key.0.as_str(), span))
        })
    }
}

impl Rule for Export {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn check(&self, file: &ParsedFile, ctx: &RuleContext) -> Vec<Diagnostic> {
        let Some(module) = file.module() else {
            return Vec::new();
        };

        let visitor = VisitorContext::new(file);
        let mut diagnostics = Vec::new();
        let mut names = ExportedNames::default();

        for item in &module.body {
            let ModuleItem::ModuleDecl(decl) = item else {
                continue;
            };
            match decl {
                ModuleDecl::ExportDecl(export) => {
                    let mergeable = match &export.decl {
                        Decl::Fn(func) => func.function.body.is_none(),
                        Decl::TsModule(_) => true,
                        _ => false,
                    };
                    if mergeable {
                        continue;
                    }
                    for (ident, kind) in decl_bindings(&export.decl) {
                        names.add(ident.sym.to_string(), kind == ExportKind::TypeOnly, ident.span);
                    }
                }
                ModuleDecl::ExportDefaultDecl(export) => match &export.decl {
                    DefaultDecl::Fn(func) if func.function.body.is_none() => {}
                    DefaultDecl::TsInterfaceDecl(_) => {
                        names.add(DEFAULT_EXPORT.to_string(), true, export.span);
                    }
                    _ => names.add(DEFAULT_EXPORT.to_string(), false, export.span),
                },
                ModuleDecl::ExportDefaultExpr(export) => {
                    names.add(DEFAULT_EXPORT.to_string(), false, export.span);
                }
                ModuleDecl::ExportNamed(export) => {
                    for specifier in &export.specifiers {
                        match specifier {
                            ExportSpecifier::Named(named) => {
                                let name = named
                                    .exported
                                    .as_ref()
                                    .unwrap_or(&named.orig);
                                names.add(
                                    export_name(name, &visitor),
                                    export.type_only || named.is_type_only,
                                    named.span,
                                );
                            }
                            ExportSpecifier::Namespace(ns) => {
                                names.add(export_name(&ns.name, &visitor), export.type_only, ns.span);
                            }
                            ExportSpecifier::Default(default) => {
                                names.add(default.exported.sym.to_string(), false, default.exported.span);
                            }
                        }
                    }
                }
                ModuleDecl::ExportAll(export) if !export.type_only => {
                    let specifier = literal_value(&export.src, &visitor);
                    let map = match imported_map(&specifier, export.src.span, &self.metadata, ctx, &visitor) {
                        Imported::Skip => continue,
                        Imported::Broken(diagnostic) => {
                            diagnostics.push(diagnostic);
                            continue;
                        }
                        Imported::Map(map) => map,
                    };

                    let mut any = false;
                    for name in map.all_exports(ctx.exports) {
                        if name != DEFAULT_EXPORT {
                            any = true;
                            names.add(name, false, export.span);
                        }
                    }
                    if !any && map.exports_known(ctx.exports) {
                        diagnostics.push(self.diagnostic(
                            export.src.span,
                            format!("No named exports found in module '{}'.", specifier),
                            &visitor,
                        ));
                    }
                }
                _ => {}
            }
        }

        for (name, span) in names.duplicates() {
            let message = if name == DEFAULT_EXPORT {
                "Multiple default exports.".to_string()
            } else {
                format!("Multiple exports of name '{}'.", name)
            };
            diagnostics.push(self.diagnostic(*span, message, &visitor));
        }

        diagnostics.sort_by_key(|d| (d.line, d.column));
        diagnostics
    }
}

impl Export {
    fn diagnostic(&self, span: Span, message: String, ctx: &VisitorContext) -> Diagnostic {
        let (line, column, end_line, end_column) = ctx.span_to_range(span);
        Diagnostic::new(
            self.metadata.id,
            self.metadata.severity,
            message,
            ctx.filename(),
            line,
            column,
        )
        .with_end(end_line, end_column)
    }
}
