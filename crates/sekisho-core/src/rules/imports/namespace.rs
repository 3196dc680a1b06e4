//! namespace rule (I004): member access on `import * as ns` must name real exports
//!
//! `ns.a.b` is checked one hop at a time: when `a` is itself a namespace-valued
//! export (`export * as a from`, or a re-exported namespace import) the lookup
//! of `b` continues in the module `a` points at.

use std::collections::{HashMap, HashSet};
use std::ops::ControlFlow;
use std::rc::Rc;

use swc_common::{Span, Spanned};
use swc_ecma_ast::{
    AssignExpr, AssignTarget, Expr, ImportSpecifier, Lit, MemberExpr, MemberProp, ModuleDecl,
    ModuleItem, ObjectPat, ObjectPatProp, Pat, PropName, SimpleAssignTarget, VarDeclarator,
};

use super::{Imported, imported_map};
use crate::declare_rule;
use crate::diagnostic::Diagnostic;
use crate::exports::{ExportMap, ExportMapRegistry};
use crate::parser::ParsedFile;
use crate::rules::helpers::{literal_value, rebound_names};
use crate::rules::{Rule, RuleContext, RuleMetadata};
use crate::visitor::{AstVisitor, VisitorContext, walk_ast};

declare_rule!(
    Namespace,
    id = "I004",
    name = "namespace",
    description = "Ensure imported namespaces contain dereferenced properties as they are dereferenced",
    category = StaticAnalysis,
    severity = Error,
    examples = "// math.js\nexport const sum = (a, b) => a + b;\n\n// Bad\nimport * as math from './math';\nmath.product(2, 3);\nmath.sum = null;\n\n// Good\nimport * as math from './math';\nmath.sum(2, 3);"
);

impl Rule for Namespace {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn check(&self, file: &ParsedFile, ctx: &RuleContext) -> Vec<Diagnostic> {
        let Some(module) = file.module() else {
            return Vec::new();
        };

        let visitor_ctx = VisitorContext::new(file);
        let mut diagnostics = Vec::new();
        let mut namespaces = HashMap::new();

        for item in &module.body {
            let ModuleItem::ModuleDecl(ModuleDecl::Import(import)) = item else {
                continue;
            };
            if import.type_only {
                continue;
            }
            let Some(ns) = import.specifiers.iter().find_map(|specifier| match specifier {
                ImportSpecifier::Namespace(ns) => Some(ns),
                _ => None,
            }) else {
                continue;
            };

            let specifier = literal_value(&import.src, &visitor_ctx);
            let map = match imported_map(&specifier, import.src.span, &self.metadata, ctx, &visitor_ctx) {
                Imported::Skip => continue,
                Imported::Broken(diagnostic) => {
                    diagnostics.push(diagnostic);
                    continue;
                }
                Imported::Map(map) => map,
            };

            if map.all_exports(ctx.exports).is_empty() && map.exports_known(ctx.exports) {
                let (line, column, end_line, end_column) = visitor_ctx.span_to_range(ns.span);
                diagnostics.push(
                    Diagnostic::new(
                        self.metadata.id,
                        self.metadata.severity,
                        format!("No exported names found in module '{}'.", specifier),
                        visitor_ctx.filename(),
                        line,
                        column,
                    )
                    .with_end(end_line, end_column),
                );
                continue;
            }

            namespaces.insert(ns.local.sym.to_string(), (map, specifier));
        }

        if namespaces.is_empty() {
            return diagnostics;
        }

        let rebound = rebound_names(module);
        namespaces.retain(|name, _| !rebound.contains(name));

        let mut visitor = NamespaceVisitor {
            metadata: &self.metadata,
            registry: ctx.exports,
            namespaces,
            handled: HashSet::new(),
            diagnostics,
        };
        walk_ast(module, &mut visitor, &visitor_ctx);
        visitor.diagnostics
    }
}

/// Where a dereference chain currently stands.
struct Cursor {
    map: Rc<ExportMap>,
    specifier: String,
    /// Dotted name of the namespace, e.g. `ns` or `ns.inner`.
    path: String,
    deep: bool,
}

enum Step {
    /// The name exists and is itself a namespace.
    Descend(Cursor),
    /// The name exists; nothing further to check.
    Stop,
    /// Missing, or undecidable; already reported if reportable.
    Missing,
}

struct NamespaceVisitor<'a> {
    metadata: &'a RuleMetadata,
    registry: &'a ExportMapRegistry,
    namespaces: HashMap<String, (Rc<ExportMap>, String)>,
    /// Inner member expressions already checked as part of a longer chain.
    handled: HashSet<Span>,
    diagnostics: Vec<Diagnostic>,
}

impl NamespaceVisitor<'_> {
    fn root(&self, name: &str) -> Option<Cursor> {
        self.namespaces.get(name).map(|(map, specifier)| Cursor {
            map: Rc::clone(map),
            specifier: specifier.clone(),
            path: name.to_string(),
            deep: false,
        })
    }

    fn step(&mut self, cursor: &Cursor, name: &str, span: Span, ctx: &VisitorContext) -> Step {
        let lookup = cursor.map.has_deep(name, self.registry);

        if !lookup.found {
            if let Some(broken) = lookup.broken() {
                self.diagnostics.push(broken.report_errors(
                    self.metadata.id,
                    self.metadata.severity,
                    &cursor.specifier,
                    ctx,
                    span,
                ));
            } else if lookup.is_conclusive() {
                let message = format!(
                    "'{}' not found in {}imported namespace '{}'.",
                    name,
                    if cursor.deep { "deeply " } else { "" },
                    cursor.path
                );
                self.report(span, message, ctx);
            }
            return Step::Missing;
        }

        let Some(link) = lookup.entry().and_then(|entry| entry.namespace.clone()) else {
            return Step::Stop;
        };
        match self.registry.follow(&link) {
            Some(map) => Step::Descend(Cursor {
                map,
                specifier: link.specifier,
                path: format!("{}.{}", cursor.path, name),
                deep: true,
            }),
            None => Step::Stop,
        }
    }

    fn check_pattern(&mut self, pattern: &ObjectPat, cursor: &Cursor, ctx: &VisitorContext) {
        for prop in &pattern.props {
            let (name, span, value) = match prop {
                ObjectPatProp::KeyValue(kv) => match &kv.key {
                    PropName::Ident(ident) => (ident.sym.to_string(), ident.span, Some(&*kv.value)),
                    PropName::Str(lit) => (literal_value(lit, ctx), lit.span, Some(&*kv.value)),
                    _ => continue,
                },
                ObjectPatProp::Assign(assign) => {
                    (assign.key.id.sym.to_string(), assign.key.id.span, None)
                }
                ObjectPatProp::Rest(_) => continue,
            };

            if let Step::Descend(inner) = self.step(cursor, &name, span, ctx)
                && let Some(Pat::Object(nested)) = value
            {
                self.check_pattern(nested, &inner, ctx);
            }
        }
    }

    fn report(&mut self, span: Span, message: String, ctx: &VisitorContext) {
        let (line, column, end_line, end_column) = ctx.span_to_range(span);
        self.diagnostics.push(
            Diagnostic::new(
                self.metadata.id,
                self.metadata.severity,
                message,
                ctx.filename(),
                line,
                column,
            )
            .with_end(end_line, end_column),
        );
    }
}

impl AstVisitor for NamespaceVisitor<'_> {
    fn visit_member_expr(&mut self, node: &MemberExpr, ctx: &VisitorContext) -> ControlFlow<()> {
        if self.handled.contains(&node.span) {
            return ControlFlow::Continue(());
        }

        // Outermost first; collect the chain down to its root identifier.
        let mut chain = vec![node];
        let mut current = node;
        let root = loop {
            match &*current.obj {
                Expr::Member(inner) => {
                    let inner: &MemberExpr = inner;
                    self.handled.insert(inner.span);
                    chain.push(inner);
                    current = inner;
                }
                Expr::Ident(ident) => break ident,
                _ => return ControlFlow::Continue(()),
            }
        };
        let Some(mut cursor) = self.root(root.sym.as_ref()) else {
            return ControlFlow::Continue(());
        };

        for member in chain.into_iter().rev() {
            let name = match &member.prop {
                MemberProp::Ident(ident) => ident.sym.to_string(),
                MemberProp::Computed(computed) => match &*computed.expr {
                    Expr::Lit(Lit::Str(lit)) => literal_value(lit, ctx),
                    _ => {
                        let message = format!(
                            "Unable to validate computed reference to imported namespace '{}'.",
                            cursor.path
                        );
                        self.report(computed.span, message, ctx);
                        break;
                    }
                },
                MemberProp::PrivateName(_) => break,
            };

            match self.step(&cursor, &name, member.prop.span(), ctx) {
                Step::Descend(next) => cursor = next,
                Step::Stop | Step::Missing => break,
            }
        }

        ControlFlow::Continue(())
    }

    fn visit_assign_expr(&mut self, node: &AssignExpr, ctx: &VisitorContext) -> ControlFlow<()> {
        if let AssignTarget::Simple(SimpleAssignTarget::Member(member)) = &node.left
            && let Expr::Ident(object) = &*member.obj
            && self.namespaces.contains_key(object.sym.as_ref())
        {
            let message = format!("Assignment to member of namespace '{}'.", object.sym);
            self.report(node.span, message, ctx);
        }
        ControlFlow::Continue(())
    }

    fn visit_var_declarator(&mut self, node: &VarDeclarator, ctx: &VisitorContext) -> ControlFlow<()> {
        if let Pat::Object(pattern) = &node.name
            && let Some(init) = &node.init
            && let Expr::Ident(ident) = &**init
            && let Some(cursor) = self.root(ident.sym.as_ref())
        {
            self.check_pattern(pattern, &cursor, ctx);
        }
        ControlFlow::Continue(())
    }
}
