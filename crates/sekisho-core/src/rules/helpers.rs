//! Shared helper functions for rule implementations.
//!
//! Most import rules start from the same question: which modules does this file
//! ask for, and where? [`module_requests`] answers it once for all of them.

use std::collections::HashSet;
use std::ops::ControlFlow;

use swc_common::Span;
use swc_ecma_ast::{
    CallExpr, Callee, Expr, Lit, Module, ModuleDecl, ModuleExportName, ModuleItem, Str,
    TsModuleRef,
};
use swc_ecma_visit::{Visit, VisitWith};

use crate::visitor::{AstVisitor, VisitorContext, walk_ast};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Import,
    ExportFrom,
    ExportAll,
    Require,
    DynamicImport,
}

/// One module specifier requested by the linted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRequest {
    pub specifier: String,
    pub kind: RequestKind,
    /// Span of the specifier literal.
    pub span: Span,
    pub type_only: bool,
}

/// Text of a string literal as written, without its quotes.
pub fn literal_value(lit: &Str, ctx: &VisitorContext) -> String {
    ctx.get_source_text(lit.span)
        .filter(|text| text.len() >= 2)
        .map(|text| text[1..text.len() - 1].to_string())
        .unwrap_or_default()
}

pub fn export_name(name: &ModuleExportName, ctx: &VisitorContext) -> String {
    match name {
        ModuleExportName::Ident(ident) => ident.sym.to_string(),
        ModuleExportName::Str(lit) => literal_value(lit, ctx),
    }
}

/// Static imports, re-exports, `require('...')` calls and `import('...')`
/// expressions with a literal specifier, in source order.
pub fn module_requests(module: &Module, ctx: &VisitorContext) -> Vec<ModuleRequest> {
    let mut requests = Vec::new();

    for item in &module.body {
        let ModuleItem::ModuleDecl(decl) = item else {
            continue;
        };
        let request = match decl {
            ModuleDecl::Import(import) => Some((&*import.src, RequestKind::Import, import.type_only)),
            ModuleDecl::ExportNamed(export) => export
                .src
                .as_deref()
                .map(|src| (src, RequestKind::ExportFrom, export.type_only)),
            ModuleDecl::ExportAll(export) => {
                Some((&*export.src, RequestKind::ExportAll, export.type_only))
            }
            ModuleDecl::TsImportEquals(import) => match &import.module_ref {
                TsModuleRef::TsExternalModuleRef(external) => {
                    Some((&external.expr, RequestKind::Require, import.is_type_only))
                }
                TsModuleRef::TsEntityName(_) => None,
            },
            _ => None,
        };
        if let Some((src, kind, type_only)) = request {
            requests.push(ModuleRequest {
                specifier: literal_value(src, ctx),
                kind,
                span: src.span,
                type_only,
            });
        }
    }

    let mut calls = CallCollector {
        requests: Vec::new(),
    };
    walk_ast(module, &mut calls, ctx);
    requests.extend(calls.requests);
    requests.sort_by_key(|request| request.span.lo);
    requests
}

struct CallCollector {
    requests: Vec<ModuleRequest>,
}

impl AstVisitor for CallCollector {
    fn visit_call_expr(&mut self, node: &CallExpr, ctx: &VisitorContext) -> ControlFlow<()> {
        let kind = match &node.callee {
            Callee::Import(_) => RequestKind::DynamicImport,
            Callee::Expr(callee) if matches!(&**callee, Expr::Ident(ident) if ident.sym == *"require") => {
                RequestKind::Require
            }
            _ => return ControlFlow::Continue(()),
        };

        if let [arg] = node.args.as_slice()
            && arg.spread.is_none()
            && let Expr::Lit(Lit::Str(lit)) = &*arg.expr
        {
            self.requests.push(ModuleRequest {
                specifier: literal_value(lit, ctx),
                kind,
                span: lit.span,
                type_only: false,
            });
        }
        ControlFlow::Continue(())
    }
}

/// Names bound anywhere below the top level: parameters, nested variables,
/// function and class names. A namespace import whose name shows up here may be
/// shadowed, so member checks on it are skipped.
pub fn rebound_names(module: &Module) -> HashSet<String> {
    let mut collector = BindingCollector {
        depth: 0,
        names: HashSet::new(),
    };
    module.visit_with(&mut collector);
    collector.names
}

struct BindingCollector {
    depth: usize,
    names: HashSet<String>,
}

impl BindingCollector {
    fn nested<N: VisitWith<Self>>(&mut self, node: &N) {
        self.depth += 1;
        node.visit_children_with(self);
        self.depth -= 1;
    }
}

impl Visit for BindingCollector {
    fn visit_function(&mut self, node: &swc_ecma_ast::Function) {
        self.nested(node);
    }

    fn visit_arrow_expr(&mut self, node: &swc_ecma_ast::ArrowExpr) {
        self.nested(node);
    }

    fn visit_block_stmt(&mut self, node: &swc_ecma_ast::BlockStmt) {
        self.nested(node);
    }

    fn visit_catch_clause(&mut self, node: &swc_ecma_ast::CatchClause) {
        self.nested(node);
    }

    fn visit_class(&mut self, node: &swc_ecma_ast::Class) {
        self.nested(node);
    }

    fn visit_binding_ident(&mut self, node: &swc_ecma_ast::BindingIdent) {
        if self.depth > 0 {
            self.names.insert(node.id.sym.to_string());
        }
    }

    fn visit_fn_decl(&mut self, node: &swc_ecma_ast::FnDecl) {
        if self.depth > 0 {
            self.names.insert(node.ident.sym.to_string());
        }
        node.visit_children_with(self);
    }

    fn visit_class_decl(&mut self, node: &swc_ecma_ast::ClassDecl) {
        if self.depth > 0 {
            self.names.insert(node.ident.sym.to_string());
        }
        node.visit_children_with(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParsedFile;

    fn requests(code: &str) -> Vec<(String, RequestKind)> {
        let file = ParsedFile::from_source("test.ts", code);
        let ctx = VisitorContext::new(&file);
        module_requests(file.module().unwrap(), &ctx)
            .into_iter()
            .map(|request| (request.specifier, request.kind))
            .collect()
    }

    #[test]
    fn collects_static_requests_in_order() {
        let found = requests(
            "import a from './a';\nexport { b } from \"./b\";\nexport * from './c';\nexport const d = 1;",
        );

        assert_eq!(
            found,
            vec![
                ("./a".to_string(), RequestKind::Import),
                ("./b".to_string(), RequestKind::ExportFrom),
                ("./c".to_string(), RequestKind::ExportAll),
            ]
        );
    }

    #[test]
    fn collects_require_and_dynamic_import() {
        let found = requests(
            "const a = require('./a');\nfunction load() { return import('./lazy'); }\nimport x = require('./x');",
        );

        assert_eq!(
            found,
            vec![
                ("./a".to_string(), RequestKind::Require),
                ("./lazy".to_string(), RequestKind::DynamicImport),
                ("./x".to_string(), RequestKind::Require),
            ]
        );
    }

    #[test]
    fn ignores_non_literal_specifiers() {
        let found = requests("const name = './a';\nrequire(name);\nimport(`./${name}`);\nfoo.require('./b');");

        assert!(found.is_empty());
    }

    #[test]
    fn type_only_flag_is_kept() {
        let file = ParsedFile::from_source("test.ts", "import type { A } from './types';");
        let ctx = VisitorContext::new(&file);
        let found = module_requests(file.module().unwrap(), &ctx);

        assert!(found[0].type_only);
    }

    #[test]
    fn rebound_names_skip_top_level() {
        let file = ParsedFile::from_source(
            "test.js",
            "import * as ns from './ns';\nconst top = 1;\nfunction f(ns) { const inner = 2; }\nclass K { m() { let other; } }",
        );

        let names = rebound_names(file.module().unwrap());

        assert!(names.contains("ns"));
        assert!(names.contains("inner"));
        assert!(names.contains("other"));
        assert!(!names.contains("top"));
        assert!(!names.contains("f"));
    }
}
