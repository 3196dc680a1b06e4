//! no-deprecated rule (I007): imports of names documented `@deprecated`
//!
//! Covers named and default imports, member access through a namespace import,
//! and whole modules whose `@module` block is deprecated.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::rc::Rc;

use swc_common::Span;
use swc_ecma_ast::{Expr, ImportSpecifier, MemberExpr, MemberProp, ModuleDecl, ModuleItem};

use super::{Imported, imported_map};
use crate::declare_rule;
use crate::diagnostic::Diagnostic;
use crate::exports::{DEFAULT_EXPORT, ExportMap, ExportMapRegistry};
use crate::parser::ParsedFile;
use crate::rules::helpers::{export_name, literal_value, rebound_names};
use crate::rules::{Rule, RuleContext, RuleMetadata};
use crate::visitor::{AstVisitor, VisitorContext, walk_ast};

declare_rule!(
    NoDeprecated,
    id = "I007",
    name = "no-deprecated",
    description = "Report imported names marked with @deprecated documentation tag",
    category = HelpfulWarnings,
    severity = Warning,
    examples = "// api.js\n/** @deprecated use fetchAll */\nexport function fetchEverything() {}\n\n// Bad\nimport { fetchEverything } from './api';\n\n// Good\nimport { fetchAll } from './api';"
);

fn message(reason: &str) -> String {
    if reason.is_empty() {
        "Deprecated.".to_string()
    } else {
        format!("Deprecated: {}", reason)
    }
}

impl Rule for NoDeprecated {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn check(&self, file: &ParsedFile, ctx: &RuleContext) -> Vec<Diagnostic> {
        let Some(module) = file.module() else {
            return Vec::new();
        };

        let visitor = VisitorContext::new(file);
        let mut diagnostics = Vec::new();
        let mut namespaces = HashMap::new();

        for item in &module.body {
            let ModuleItem::ModuleDecl(ModuleDecl::Import(import)) = item else {
                continue;
            };
            let specifier = literal_value(&import.src, &visitor);
            let map = match imported_map(&specifier, import.src.span, &self.metadata, ctx, &visitor) {
                Imported::Skip => continue,
                Imported::Broken(diagnostic) => {
                    diagnostics.push(diagnostic);
                    continue;
                }
                Imported::Map(map) => map,
            };

            if let Some(reason) = map.doc().and_then(|doc| doc.deprecated.as_deref()) {
                diagnostics.push(self.diagnostic(import.span, message(reason), &visitor));
                continue;
            }

            for specifier in &import.specifiers {
                let (name, span) = match specifier {
                    ImportSpecifier::Namespace(ns) => {
                        namespaces.insert(ns.local.sym.to_string(), Rc::clone(&map));
                        continue;
                    }
                    ImportSpecifier::Default(default) => (DEFAULT_EXPORT.to_string(), default.span),
                    ImportSpecifier::Named(named) => {
                        let name = named
                            .imported
                            .as_ref()
                            .map(|imported| export_name(imported, &visitor))
                            .unwrap_or_else(|| named.local.sym.to_string());
                        (name, named.span)
                    }
                };
                if let Some(reason) = deprecation(&map, &name, ctx.exports) {
                    diagnostics.push(self.diagnostic(span, message(&reason), &visitor));
                }
            }
        }

        if namespaces.is_empty() {
            return diagnostics;
        }
        let rebound = rebound_names(module);
        namespaces.retain(|name, _| !rebound.contains(name));

        let mut member_visitor = DeprecatedMemberVisitor {
            rule: self,
            registry: ctx.exports,
            namespaces,
            diagnostics,
        };
        walk_ast(module, &mut member_visitor, &visitor);
        member_visitor.diagnostics
    }
}

impl NoDeprecated {
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

/// Deprecation reason of `name` as finally resolved, following re-exports.
fn deprecation(map: &Rc<ExportMap>, name: &str, registry: &ExportMapRegistry) -> Option<String> {
    let resolved = map.resolve(name, registry)?;
    resolved.entry.deprecation().map(str::to_string)
}

struct DeprecatedMemberVisitor<'a> {
    rule: &'a NoDeprecated,
    registry: &'a ExportMapRegistry,
    namespaces: HashMap<String, Rc<ExportMap>>,
    diagnostics: Vec<Diagnostic>,
}

impl AstVisitor for DeprecatedMemberVisitor<'_> {
    fn visit_member_expr(&mut self, node: &MemberExpr, ctx: &VisitorContext) -> ControlFlow<()> {
        let Expr::Ident(object) = &*node.obj else {
            return ControlFlow::Continue(());
        };
        let Some(map) = self.namespaces.get(object.sym.as_ref()) else {
            return ControlFlow::Continue(());
        };
        let MemberProp::Ident(prop) = &node.prop else {
            return ControlFlow::Continue(());
        };

        if let Some(reason) = deprecation(map, prop.sym.as_ref(), self.registry) {
            self.diagnostics
                .push(self.rule.diagnostic(prop.span, message(&reason), ctx));
        }
        ControlFlow::Continue(())
    }
}
