//! Export map construction
//!
//! One pass collects top-level bindings (declarations and imports) so that
//! `export { a }` knows what `a` is. A second pass classifies every top-level item
//! into a [`Statement`] and folds it into the map.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use swc_common::comments::SingleThreadedComments;
use swc_common::{Span, Spanned};
use swc_ecma_ast::{
    AssignOp, AssignTarget, Callee, Decl, DefaultDecl, ExportAll, ExportDecl, ExportDefaultDecl,
    ExportDefaultExpr, ExportSpecifier, Expr, Ident, ImportDecl, ImportSpecifier, Lit, MemberExpr,
    MemberProp, ModuleDecl, ModuleExportName, ModuleItem, NamedExport, ObjectPatProp, Pat, Prop,
    PropName, PropOrSpread, SimpleAssignTarget, Stmt, Str, TsExportAssignment,
    TsImportEqualsDecl, TsModuleName, TsModuleRef, VarDecl,
};

use super::doc::{DocInfo, leading_doc, module_doc};
use super::{
    DEFAULT_EXPORT, Dependency, ExportEntry, ExportKind, ExportMap, ExportMapError, ImportedNames,
    Location, NamespaceLink, ParseGoal, ReexportEntry, UnresolvedSpecifier,
};
use crate::config::Settings;
use crate::parser::{LineIndex, SourceParser};
use crate::resolve::is_core_module;

const NAMESPACE_IMPORT: &str = "*";

/// Collaborators needed to turn source text into an [`ExportMap`].
pub struct BuildContext<'a> {
    pub settings: &'a Settings,
    pub parser: &'a dyn SourceParser,
    /// Resolves a specifier found in the file being built.
    pub resolve: &'a dyn Fn(&str) -> Option<PathBuf>,
}

/// Top-level item shapes that matter to an export map.
enum Statement<'a> {
    Import(&'a ImportDecl),
    ImportEquals(&'a TsImportEqualsDecl),
    ExportDecl(&'a ExportDecl),
    ExportDefaultDecl(&'a ExportDefaultDecl),
    ExportDefaultExpr(&'a ExportDefaultExpr),
    ExportAssignment(&'a TsExportAssignment),
    ExportLocal(&'a NamedExport),
    ExportFrom(&'a NamedExport, &'a Str),
    ExportAllAsNamespace(&'a NamedExport, &'a ModuleExportName, &'a Str),
    ExportAll(&'a ExportAll),
    CommonJs(CommonJsExport<'a>),
    Require(&'a VarDecl),
    Ignored,
}

enum CommonJsExport<'a> {
    /// `module.exports = value`
    ModuleExports { span: Span, value: &'a Expr },
    /// `exports.name = ...` or `module.exports.name = ...`
    Named { span: Span, name: String },
}

#[derive(Debug, Clone)]
enum LocalBinding {
    Declared {
        kind: ExportKind,
        doc: Option<DocInfo>,
    },
    Imported {
        specifier: String,
        resolved: Option<PathBuf>,
        /// Name in the source module, `*` for namespace imports.
        imported: String,
        type_only: bool,
    },
}

pub(super) fn build(path: &Path, source: &str, ctx: &BuildContext) -> ExportMap {
    let parsed = ctx.parser.parse(path, source);
    let mut map = ExportMap::empty(path);

    let module = match parsed.module.as_ref() {
        Some(module) if !parsed.has_errors() => module,
        _ => {
            map.errors = parsed
                .errors
                .iter()
                .map(|err| ExportMapError::Parse {
                    message: err.message.clone(),
                    line: err.line,
                    column: err.column,
                })
                .collect();
            if map.errors.is_empty() {
                map.errors.push(ExportMapError::Parse {
                    message: "Unable to parse module".to_string(),
                    line: 1,
                    column: 1,
                });
            }
            tracing::debug!(path = %path.display(), errors = map.errors.len(), "export map: parse failed");
            return map;
        }
    };

    let has_module_syntax = module
        .body
        .iter()
        .any(|item| matches!(item, ModuleItem::ModuleDecl(_)));

    let mut builder = Builder {
        ctx,
        source,
        base: parsed.base,
        line_index: LineIndex::new(source),
        comments: &parsed.comments,
        docs: ctx.settings.captures_jsdoc(),
        commonjs: ctx.settings.commonjs && !has_module_syntax,
        resolutions: HashMap::new(),
        locals: HashMap::new(),
        saw_commonjs: None,
        saw_require: false,
        opaque_commonjs: false,
        map,
    };

    if builder.docs
        && let Some(first) = module.body.first()
    {
        builder.map.doc = module_doc(builder.comments, first.span().lo);
    }

    for item in &module.body {
        builder.collect_locals(item);
    }
    for item in &module.body {
        let statement = builder.classify(item);
        builder.apply(statement);
    }

    builder.finish(has_module_syntax)
}

struct Builder<'a> {
    ctx: &'a BuildContext<'a>,
    source: &'a str,
    base: u32,
    line_index: LineIndex,
    comments: &'a SingleThreadedComments,
    docs: bool,
    commonjs: bool,
    resolutions: HashMap<String, Option<PathBuf>>,
    locals: HashMap<String, LocalBinding>,
    /// Location of the first CommonJS export seen.
    saw_commonjs: Option<Location>,
    saw_require: bool,
    /// `module.exports` was assigned something other than a plain object literal.
    opaque_commonjs: bool,
    map: ExportMap,
}

impl<'a> Builder<'a> {
    fn finish(mut self, has_module_syntax: bool) -> ExportMap {
        if let Some(location) = self.saw_commonjs
            && !self.map.namespace.contains_key(DEFAULT_EXPORT)
        {
            self.insert_entry(DEFAULT_EXPORT.to_string(), ExportKind::Value, location, None, None);
        }

        self.map.parse_goal = if has_module_syntax {
            ParseGoal::Module
        } else if self.saw_commonjs.is_some() || self.saw_require {
            ParseGoal::Script
        } else {
            ParseGoal::Ambiguous
        };
        // A script with no visible exports may still fill `module.exports` at runtime.
        self.map.exports_unknown = self.map.parse_goal == ParseGoal::Script
            && (self.opaque_commonjs || self.saw_commonjs.is_none());

        tracing::debug!(
            path = %self.map.path.display(),
            exports = self.map.namespace.len(),
            reexports = self.map.reexports.len(),
            dependencies = self.map.dependencies.len(),
            "built export map"
        );
        self.map
    }

    fn location(&self, span: Span) -> Location {
        let (line, column) = self
            .line_index
            .location(span.lo.0.saturating_sub(self.base) as usize);
        Location { line, column }
    }

    fn doc_at(&self, span: Span) -> Option<DocInfo> {
        if self.docs {
            leading_doc(self.comments, span.lo)
        } else {
            None
        }
    }

    /// Unquoted text of a string literal, read from the source.
    fn str_value(&self, lit: &Str) -> String {
        let lo = lit.span.lo.0.saturating_sub(self.base) as usize;
        let hi = lit.span.hi.0.saturating_sub(self.base) as usize;
        if hi >= lo + 2 {
            self.source.get(lo + 1..hi - 1).unwrap_or_default().to_string()
        } else {
            String::new()
        }
    }

    fn export_name(&self, name: &ModuleExportName) -> String {
        match name {
            ModuleExportName::Ident(ident) => ident.sym.to_string(),
            ModuleExportName::Str(lit) => self.str_value(lit),
        }
    }

    fn resolve(&mut self, specifier: &str) -> Option<PathBuf> {
        if let Some(resolved) = self.resolutions.get(specifier) {
            return resolved.clone();
        }
        let resolved = (self.ctx.resolve)(specifier);
        self.resolutions
            .insert(specifier.to_string(), resolved.clone());
        resolved
    }

    fn collect_locals(&mut self, item: &ModuleItem) {
        match item {
            ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => {
                let specifier = self.str_value(&import.src);
                let resolved = self.resolve(&specifier);
                for spec in &import.specifiers {
                    let (local, imported, type_only) = match spec {
                        ImportSpecifier::Named(named) => (
                            named.local.sym.to_string(),
                            named
                                .imported
                                .as_ref()
                                .map(|name| self.export_name(name))
                                .unwrap_or_else(|| named.local.sym.to_string()),
                            named.is_type_only,
                        ),
                        ImportSpecifier::Default(default) => {
                            (default.local.sym.to_string(), DEFAULT_EXPORT.to_string(), false)
                        }
                        ImportSpecifier::Namespace(ns) => {
                            (ns.local.sym.to_string(), NAMESPACE_IMPORT.to_string(), false)
                        }
                    };
                    self.locals.insert(
                        local,
                        LocalBinding::Imported {
                            specifier: specifier.clone(),
                            resolved: resolved.clone(),
                            imported,
                            type_only: type_only || import.type_only,
                        },
                    );
                }
            }
            ModuleItem::ModuleDecl(ModuleDecl::TsImportEquals(import)) => {
                if let TsModuleRef::TsExternalModuleRef(external) = &import.module_ref {
                    let specifier = self.str_value(&external.expr);
                    let resolved = self.resolve(&specifier);
                    self.locals.insert(
                        import.id.sym.to_string(),
                        LocalBinding::Imported {
                            specifier,
                            resolved,
                            imported: NAMESPACE_IMPORT.to_string(),
                            type_only: import.is_type_only,
                        },
                    );
                }
            }
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                let doc = self.doc_at(export.span);
                self.declare(&export.decl, doc);
            }
            ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(export)) => {
                let ident = match &export.decl {
                    DefaultDecl::Class(class) => class.ident.as_ref(),
                    DefaultDecl::Fn(func) => func.ident.as_ref(),
                    DefaultDecl::TsInterfaceDecl(_) => None,
                };
                if let Some(ident) = ident {
                    let doc = self.doc_at(export.span);
                    self.locals.insert(
                        ident.sym.to_string(),
                        LocalBinding::Declared {
                            kind: ExportKind::Value,
                            doc,
                        },
                    );
                }
            }
            ModuleItem::Stmt(Stmt::Decl(decl)) => {
                let doc = self.doc_at(decl.span());
                self.declare(decl, doc);
            }
            _ => {}
        }
    }

    fn declare(&mut self, decl: &Decl, doc: Option<DocInfo>) {
        for (ident, kind) in decl_bindings(decl) {
            self.locals.insert(
                ident.sym.to_string(),
                LocalBinding::Declared {
                    kind,
                    doc: doc.clone(),
                },
            );
        }
    }

    fn classify<'m>(&self, item: &'m ModuleItem) -> Statement<'m> {
        match item {
            ModuleItem::ModuleDecl(decl) => match decl {
                ModuleDecl::Import(import) => Statement::Import(import),
                ModuleDecl::TsImportEquals(import) => Statement::ImportEquals(import),
                ModuleDecl::ExportDecl(export) => Statement::ExportDecl(export),
                ModuleDecl::ExportDefaultDecl(export) => Statement::ExportDefaultDecl(export),
                ModuleDecl::ExportDefaultExpr(export) => Statement::ExportDefaultExpr(export),
                ModuleDecl::TsExportAssignment(export) => Statement::ExportAssignment(export),
                ModuleDecl::ExportNamed(export) => match &export.src {
                    None => Statement::ExportLocal(export),
                    Some(src) => match export.specifiers.as_slice() {
                        [ExportSpecifier::Namespace(ns)] => {
                            Statement::ExportAllAsNamespace(export, &ns.name, src)
                        }
                        _ => Statement::ExportFrom(export, src),
                    },
                },
                ModuleDecl::ExportAll(export) => Statement::ExportAll(export),
                ModuleDecl::TsNamespaceExport(_) => Statement::Ignored,
            },
            ModuleItem::Stmt(Stmt::Expr(stmt)) if self.commonjs => self
                .commonjs_export(&stmt.expr)
                .map(Statement::CommonJs)
                .unwrap_or(Statement::Ignored),
            ModuleItem::Stmt(Stmt::Decl(Decl::Var(var)))
                if self.ctx.settings.commonjs && var.decls.iter().any(|d| require_call(d.init.as_deref()).is_some()) =>
            {
                Statement::Require(var)
            }
            ModuleItem::Stmt(_) => Statement::Ignored,
        }
    }

    fn commonjs_export<'m>(&self, expr: &'m Expr) -> Option<CommonJsExport<'m>> {
        let Expr::Assign(assign) = expr else {
            return None;
        };
        if assign.op != AssignOp::Assign {
            return None;
        }
        let AssignTarget::Simple(SimpleAssignTarget::Member(member)) = &assign.left else {
            return None;
        };

        if is_module_exports(member) {
            return Some(CommonJsExport::ModuleExports {
                span: assign.span,
                value: &assign.right,
            });
        }

        let target_is_exports = match &*member.obj {
            Expr::Ident(ident) => ident.sym == *"exports",
            Expr::Member(inner) => is_module_exports(inner),
            _ => false,
        };
        if !target_is_exports {
            return None;
        }

        let name = match &member.prop {
            MemberProp::Ident(ident) => ident.sym.to_string(),
            MemberProp::Computed(computed) => match &*computed.expr {
                Expr::Lit(Lit::Str(lit)) => self.str_value(lit),
                _ => return None,
            },
            MemberProp::PrivateName(_) => return None,
        };

        Some(CommonJsExport::Named {
            span: assign.span,
            name,
        })
    }

    fn apply(&mut self, statement: Statement) {
        match statement {
            Statement::Import(import) => self.apply_import(import),
            Statement::ImportEquals(import) => self.apply_import_equals(import),
            Statement::ExportDecl(export) => {
                let doc = self.doc_at(export.span);
                for (ident, kind) in decl_bindings(&export.decl) {
                    let location = self.location(ident.span);
                    self.insert_entry(ident.sym.to_string(), kind, location, None, doc.clone());
                }
            }
            Statement::ExportDefaultDecl(export) => {
                let kind = match export.decl {
                    DefaultDecl::TsInterfaceDecl(_) => ExportKind::TypeOnly,
                    _ => ExportKind::Value,
                };
                let location = self.location(export.span);
                let doc = self.doc_at(export.span);
                self.insert_entry(DEFAULT_EXPORT.to_string(), kind, location, None, doc);
            }
            Statement::ExportDefaultExpr(export) => {
                self.apply_default_expr(export.span, &export.expr);
            }
            Statement::ExportAssignment(export) => {
                self.apply_default_expr(export.span, &export.expr);
            }
            Statement::ExportLocal(export) => self.apply_export_local(export),
            Statement::ExportFrom(export, src) => self.apply_export_from(export, src),
            Statement::ExportAllAsNamespace(export, name, src) => {
                let specifier = self.str_value(src);
                let resolved = self.resolve(&specifier);
                let location = self.location(export.span);
                self.record_import(&specifier, resolved.clone(), location, Vec::new(), true, export.type_only);
                self.require_resolved(&specifier, resolved.is_some(), location);
                let kind = if export.type_only {
                    ExportKind::TypeOnly
                } else {
                    ExportKind::Value
                };
                let doc = self.doc_at(export.span);
                let name = self.export_name(name);
                self.insert_entry(
                    name,
                    kind,
                    location,
                    Some(NamespaceLink {
                        specifier,
                        resolved,
                    }),
                    doc,
                );
            }
            Statement::ExportAll(export) => {
                let specifier = self.str_value(&export.src);
                let resolved = self.resolve(&specifier);
                let location = self.location(export.span);
                self.record_import(&specifier, resolved.clone(), location, Vec::new(), true, export.type_only);
                self.require_resolved(&specifier, resolved.is_some(), location);
                self.map.dependencies.push(Dependency {
                    specifier,
                    resolved,
                    location,
                });
            }
            Statement::CommonJs(export) => self.apply_commonjs(export),
            Statement::Require(var) => self.apply_require(var),
            Statement::Ignored => {}
        }
    }

    fn insert_entry(
        &mut self,
        name: String,
        kind: ExportKind,
        location: Location,
        namespace: Option<NamespaceLink>,
        doc: Option<DocInfo>,
    ) {
        self.map.namespace.insert(
            name.clone(),
            ExportEntry {
                name,
                kind,
                namespace,
                location,
                doc,
            },
        );
    }

    fn record_import(
        &mut self,
        specifier: &str,
        resolved: Option<PathBuf>,
        location: Location,
        names: Vec<String>,
        namespace: bool,
        type_only: bool,
    ) {
        let Some(path) = resolved else {
            if !is_core_module(specifier, self.ctx.settings) {
                self.map.unresolved.push(UnresolvedSpecifier {
                    specifier: specifier.to_string(),
                    location,
                });
            }
            return;
        };

        match self.map.imports.get_mut(&path) {
            Some(existing) => {
                existing.names.extend(names);
                existing.namespace |= namespace;
                existing.type_only &= type_only;
            }
            None => {
                self.map.imports.insert(
                    path,
                    ImportedNames {
                        specifier: specifier.to_string(),
                        names: names.into_iter().collect(),
                        namespace,
                        type_only,
                        location,
                    },
                );
            }
        }
    }

    /// Re-export and `export *` targets must resolve; builtins are exempt.
    fn require_resolved(&mut self, specifier: &str, resolved: bool, location: Location) {
        if !resolved && !is_core_module(specifier, self.ctx.settings) {
            self.map.errors.push(ExportMapError::Resolution {
                specifier: specifier.to_string(),
                location,
            });
        }
    }

    fn apply_import(&mut self, import: &ImportDecl) {
        let specifier = self.str_value(&import.src);
        let resolved = self.resolve(&specifier);
        let location = self.location(import.span);
        let mut names = Vec::new();
        let mut namespace = false;
        for spec in &import.specifiers {
            match spec {
                ImportSpecifier::Named(named) => names.push(
                    named
                        .imported
                        .as_ref()
                        .map(|name| self.export_name(name))
                        .unwrap_or_else(|| named.local.sym.to_string()),
                ),
                ImportSpecifier::Default(_) => names.push(DEFAULT_EXPORT.to_string()),
                ImportSpecifier::Namespace(_) => namespace = true,
            }
        }
        self.record_import(&specifier, resolved, location, names, namespace, import.type_only);
    }

    fn apply_import_equals(&mut self, import: &TsImportEqualsDecl) {
        let TsModuleRef::TsExternalModuleRef(external) = &import.module_ref else {
            return;
        };
        let specifier = self.str_value(&external.expr);
        let resolved = self.resolve(&specifier);
        let location = self.location(import.span);
        self.record_import(&specifier, resolved.clone(), location, Vec::new(), true, import.is_type_only);

        if import.is_export {
            self.insert_entry(
                import.id.sym.to_string(),
                ExportKind::Value,
                location,
                Some(NamespaceLink {
                    specifier,
                    resolved,
                }),
                None,
            );
        }
    }

    fn apply_default_expr(&mut self, span: Span, expr: &Expr) {
        let location = self.location(span);
        let mut doc = self.doc_at(span);
        let mut namespace = None;

        if let Expr::Ident(ident) = expr {
            match self.locals.get(&*ident.sym) {
                Some(LocalBinding::Imported {
                    specifier,
                    resolved,
                    imported,
                    ..
                }) if imported == NAMESPACE_IMPORT => {
                    namespace = Some(NamespaceLink {
                        specifier: specifier.clone(),
                        resolved: resolved.clone(),
                    });
                }
                Some(LocalBinding::Declared { doc: local_doc, .. }) if doc.is_none() => {
                    doc = local_doc.clone();
                }
                _ => {}
            }
        }

        self.insert_entry(DEFAULT_EXPORT.to_string(), ExportKind::Value, location, namespace, doc);
    }

    fn apply_export_local(&mut self, export: &NamedExport) {
        let statement_doc = self.doc_at(export.span);

        for spec in &export.specifiers {
            let ExportSpecifier::Named(named) = spec else {
                continue;
            };
            let local = self.export_name(&named.orig);
            let exported = named
                .exported
                .as_ref()
                .map(|name| self.export_name(name))
                .unwrap_or_else(|| local.clone());
            let type_only = export.type_only || named.is_type_only;
            let location = self.location(named.span);

            match self.locals.get(&local).cloned() {
                Some(LocalBinding::Imported {
                    specifier,
                    resolved,
                    imported,
                    type_only: imported_type_only,
                }) => {
                    if imported == NAMESPACE_IMPORT {
                        self.insert_entry(
                            exported,
                            kind_of(type_only || imported_type_only),
                            location,
                            Some(NamespaceLink {
                                specifier,
                                resolved,
                            }),
                            statement_doc.clone(),
                        );
                    } else {
                        self.map.reexports.insert(
                            exported.clone(),
                            ReexportEntry {
                                local: exported,
                                imported,
                                specifier,
                                resolved,
                                kind: kind_of(type_only || imported_type_only),
                                location,
                                doc: statement_doc.clone(),
                            },
                        );
                    }
                }
                Some(LocalBinding::Declared { kind, doc }) => {
                    let kind = if type_only { ExportKind::TypeOnly } else { kind };
                    let doc = statement_doc.clone().or(doc);
                    self.insert_entry(exported, kind, location, None, doc);
                }
                None => {
                    self.insert_entry(exported, kind_of(type_only), location, None, statement_doc.clone());
                }
            }
        }
    }

    fn apply_export_from(&mut self, export: &NamedExport, src: &Str) {
        let specifier = self.str_value(src);
        let resolved = self.resolve(&specifier);
        let location = self.location(export.span);
        let doc = self.doc_at(export.span);

        let mut names = Vec::new();
        let mut namespace = false;

        for spec in &export.specifiers {
            match spec {
                ExportSpecifier::Named(named) => {
                    let imported = self.export_name(&named.orig);
                    let local = named
                        .exported
                        .as_ref()
                        .map(|name| self.export_name(name))
                        .unwrap_or_else(|| imported.clone());
                    names.push(imported.clone());
                    let entry_location = self.location(named.span);
                    self.map.reexports.insert(
                        local.clone(),
                        ReexportEntry {
                            local,
                            imported,
                            specifier: specifier.clone(),
                            resolved: resolved.clone(),
                            kind: kind_of(export.type_only || named.is_type_only),
                            location: entry_location,
                            doc: doc.clone(),
                        },
                    );
                }
                ExportSpecifier::Default(default) => {
                    names.push(DEFAULT_EXPORT.to_string());
                    let local = default.exported.sym.to_string();
                    let entry_location = self.location(default.exported.span);
                    self.map.reexports.insert(
                        local.clone(),
                        ReexportEntry {
                            local,
                            imported: DEFAULT_EXPORT.to_string(),
                            specifier: specifier.clone(),
                            resolved: resolved.clone(),
                            kind: kind_of(export.type_only),
                            location: entry_location,
                            doc: doc.clone(),
                        },
                    );
                }
                ExportSpecifier::Namespace(ns) => {
                    namespace = true;
                    let name = self.export_name(&ns.name);
                    let entry_location = self.location(ns.span);
                    self.insert_entry(
                        name,
                        kind_of(export.type_only),
                        entry_location,
                        Some(NamespaceLink {
                            specifier: specifier.clone(),
                            resolved: resolved.clone(),
                        }),
                        doc.clone(),
                    );
                }
            }
        }

        self.require_resolved(&specifier, resolved.is_some(), location);
        self.record_import(&specifier, resolved, location, names, namespace, export.type_only);
    }

    fn apply_commonjs(&mut self, export: CommonJsExport) {
        match export {
            CommonJsExport::ModuleExports { span, value } => {
                let location = self.location(span);
                self.saw_commonjs = self.saw_commonjs.or(Some(location));
                let doc = self.doc_at(span);
                self.insert_entry(DEFAULT_EXPORT.to_string(), ExportKind::Value, location, None, doc);

                let Expr::Object(object) = value else {
                    self.opaque_commonjs = true;
                    return;
                };
                for prop in &object.props {
                    let PropOrSpread::Prop(prop) = prop else {
                        self.opaque_commonjs = true;
                        continue;
                    };
                    let key = match &**prop {
                        Prop::Shorthand(ident) => Some((ident.sym.to_string(), ident.span)),
                        Prop::KeyValue(kv) => self.prop_name(&kv.key),
                        Prop::Method(method) => self.prop_name(&method.key),
                        Prop::Getter(getter) => self.prop_name(&getter.key),
                        Prop::Setter(setter) => self.prop_name(&setter.key),
                        Prop::Assign(_) => None,
                    };
                    if let Some((name, key_span)) = key {
                        let key_location = self.location(key_span);
                        self.insert_entry(name, ExportKind::Value, key_location, None, None);
                    }
                }
            }
            CommonJsExport::Named { span, name } => {
                let location = self.location(span);
                self.saw_commonjs = self.saw_commonjs.or(Some(location));
                let doc = self.doc_at(span);
                self.insert_entry(name, ExportKind::Value, location, None, doc);
            }
        }
    }

    fn prop_name(&self, key: &PropName) -> Option<(String, Span)> {
        match key {
            PropName::Ident(ident) => Some((ident.sym.to_string(), ident.span)),
            PropName::Str(lit) => Some((self.str_value(lit), lit.span)),
            PropName::Num(_) | PropName::Computed(_) | PropName::BigInt(_) => None,
        }
    }

    fn apply_require(&mut self, var: &VarDecl) {
        for declarator in &var.decls {
            let Some(lit) = require_call(declarator.init.as_deref()) else {
                continue;
            };
            self.saw_require = true;
            let specifier = self.str_value(lit);
            let resolved = self.resolve(&specifier);
            let location = self.location(declarator.span);

            let (names, namespace) = match &declarator.name {
                Pat::Object(object) => {
                    let names = object
                        .props
                        .iter()
                        .filter_map(|prop| match prop {
                            ObjectPatProp::KeyValue(kv) => self.prop_name(&kv.key).map(|(name, _)| name),
                            ObjectPatProp::Assign(assign) => Some(assign.key.id.sym.to_string()),
                            ObjectPatProp::Rest(_) => None,
                        })
                        .collect();
                    (names, false)
                }
                _ => (Vec::new(), true),
            };

            self.record_import(&specifier, resolved, location, names, namespace, false);
        }
    }
}

fn kind_of(type_only: bool) -> ExportKind {
    if type_only {
        ExportKind::TypeOnly
    } else {
        ExportKind::Value
    }
}

fn is_module_exports(member: &MemberExpr) -> bool {
    matches!(&*member.obj, Expr::Ident(obj) if obj.sym == *"module")
        && matches!(&member.prop, MemberProp::Ident(prop) if prop.sym == *"exports")
}

/// The string argument of a `require('...')` call.
fn require_call(init: Option<&Expr>) -> Option<&Str> {
    let Expr::Call(call) = init? else {
        return None;
    };
    let Callee::Expr(callee) = &call.callee else {
        return None;
    };
    if !matches!(&**callee, Expr::Ident(ident) if ident.sym == *"require") {
        return None;
    }
    match call.args.as_slice() {
        [arg] if arg.spread.is_none() => match &*arg.expr {
            Expr::Lit(Lit::Str(lit)) => Some(lit),
            _ => None,
        },
        _ => None,
    }
}

/// Every binding a declaration introduces, with its export kind.
pub(crate) fn decl_bindings(decl: &Decl) -> Vec<(&Ident, ExportKind)> {
    match decl {
        Decl::Var(var) => {
            let mut idents = Vec::new();
            for declarator in &var.decls {
                collect_pat_bindings(&declarator.name, &mut idents);
            }
            idents
                .into_iter()
                .map(|ident| (ident, ExportKind::Value))
                .collect()
        }
        Decl::Fn(func) => vec![(&func.ident, ExportKind::Value)],
        Decl::Class(class) => vec![(&class.ident, ExportKind::Value)],
        Decl::TsInterface(interface) => vec![(&interface.id, ExportKind::TypeOnly)],
        Decl::TsTypeAlias(alias) => vec![(&alias.id, ExportKind::TypeOnly)],
        Decl::TsEnum(ts_enum) => vec![(&ts_enum.id, ExportKind::Value)],
        Decl::TsModule(module) => match &module.id {
            TsModuleName::Ident(ident) => vec![(ident, ExportKind::Value)],
            TsModuleName::Str(_) => Vec::new(),
        },
        Decl::Using(_) => Vec::new(),
    }
}

/// Leaf identifiers of a binding pattern; `{ a, b: { c } }` yields `a` and `c`.
fn collect_pat_bindings<'p>(pat: &'p Pat, out: &mut Vec<&'p Ident>) {
    match pat {
        Pat::Ident(binding) => out.push(&binding.id),
        Pat::Array(array) => {
            for elem in array.elems.iter().flatten() {
                collect_pat_bindings(elem, out);
            }
        }
        Pat::Object(object) => {
            for prop in &object.props {
                match prop {
                    ObjectPatProp::KeyValue(kv) => collect_pat_bindings(&kv.value, out),
                    ObjectPatProp::Assign(assign) => out.push(&assign.key.id),
                    ObjectPatProp::Rest(rest) => collect_pat_bindings(&rest.arg, out),
                }
            }
        }
        Pat::Rest(rest) => collect_pat_bindings(&rest.arg, out),
        Pat::Assign(assign) => collect_pat_bindings(&assign.left, out),
        Pat::Invalid(_) | Pat::Expr(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SwcParser;

    fn build_with(path: &str, source: &str, settings: &Settings) -> ExportMap {
        let resolve = |spec: &str| {
            if spec.starts_with('.') {
                Some(PathBuf::from("/src").join(spec.trim_start_matches("./")))
            } else {
                None
            }
        };
        let ctx = BuildContext {
            settings,
            parser: &SwcParser,
            resolve: &resolve,
        };
        build(Path::new(path), source, &ctx)
    }

    fn build_js(source: &str) -> ExportMap {
        build_with("/src/mod.js", source, &Settings::default())
    }

    fn names(map: &ExportMap) -> Vec<&str> {
        map.namespace().keys().map(String::as_str).collect()
    }

    #[test]
    fn captures_declarations() {
        let map = build_js(
            "export const a = 1, b = 2;\nexport function f() {}\nexport class C {}\nexport let d;",
        );

        assert_eq!(names(&map), vec!["C", "a", "b", "d", "f"]);
        assert_eq!(map.parse_goal(), ParseGoal::Module);
        assert_eq!(map.get("a").unwrap().location, Location { line: 1, column: 14 });
    }

    #[test]
    fn default_function_is_only_default() {
        let map = build_js("export default function f() {}");

        assert_eq!(names(&map), vec!["default"]);
        assert!(map.has_default());
    }

    #[test]
    fn destructured_export_captures_leaves() {
        let map = build_js("export const { a, b: { c } } = obj;");

        assert_eq!(names(&map), vec!["a", "c"]);
    }

    #[test]
    fn destructured_array_and_defaults() {
        let map = build_js("export const [x, , { y = 1 }, ...rest] = list;");

        assert_eq!(names(&map), vec!["rest", "x", "y"]);
    }

    #[test]
    fn local_export_list_with_rename() {
        let map = build_js("const a = 1;\nfunction g() {}\nexport { a, g as h, a as default };");

        assert_eq!(names(&map), vec!["a", "default", "h"]);
    }

    #[test]
    fn reexports_keep_remote_names() {
        let map = build_js("export { x, default as Y, z as default } from './a.js';");

        let y = &map.reexports()["Y"];
        assert_eq!(y.imported, "default");
        assert_eq!(y.specifier, "./a.js");
        assert_eq!(y.resolved, Some(PathBuf::from("/src/a.js")));
        assert_eq!(map.reexports()["default"].imported, "z");
        assert_eq!(map.reexports()["x"].imported, "x");
        assert!(map.namespace().is_empty());
        assert!(map.has_default());
    }

    #[test]
    fn export_all_becomes_dependency() {
        let map = build_js("export * from './a.js';\nexport * from './b.js';");

        let specifiers: Vec<&str> = map
            .dependencies()
            .iter()
            .map(|dep| dep.specifier.as_str())
            .collect();
        assert_eq!(specifiers, vec!["./a.js", "./b.js"]);
        assert!(map.namespace().is_empty());
        assert!(map.imports()[Path::new("/src/a.js")].namespace);
    }

    #[test]
    fn export_all_as_namespace_is_an_entry() {
        let map = build_js("export * as ns from './a.js';");

        let ns = map.get("ns").unwrap();
        let link = ns.namespace.as_ref().unwrap();
        assert_eq!(link.specifier, "./a.js");
        assert_eq!(link.resolved, Some(PathBuf::from("/src/a.js")));
        assert!(map.dependencies().is_empty());
    }

    #[test]
    fn exported_namespace_import_links_target() {
        let map = build_js("import * as utils from './utils.js';\nexport { utils };");

        let link = map.get("utils").and_then(|e| e.namespace.as_ref()).unwrap();
        assert_eq!(link.specifier, "./utils.js");
    }

    #[test]
    fn exported_import_binding_is_a_reexport() {
        let map = build_js("import { a as b } from './a.js';\nexport { b as c };");

        let c = &map.reexports()["c"];
        assert_eq!(c.imported, "a");
        assert_eq!(c.specifier, "./a.js");
        assert!(map.get("c").is_none());
    }

    #[test]
    fn default_export_of_namespace_import() {
        let map = build_js("import * as all from './a.js';\nexport default all;");

        assert!(map.get("default").unwrap().namespace.is_some());
    }

    #[test]
    fn typescript_types_are_type_only() {
        let map = build_with(
            "/src/types.ts",
            "export interface A {}\nexport type B = string;\nexport enum C { X }\ninterface D {}\nexport { D };\nconst e = 1;\nexport type { e };",
            &Settings::default(),
        );

        assert_eq!(map.get("A").unwrap().kind, ExportKind::TypeOnly);
        assert_eq!(map.get("B").unwrap().kind, ExportKind::TypeOnly);
        assert_eq!(map.get("C").unwrap().kind, ExportKind::Value);
        assert_eq!(map.get("D").unwrap().kind, ExportKind::TypeOnly);
        assert_eq!(map.get("e").unwrap().kind, ExportKind::TypeOnly);
    }

    #[test]
    fn commonjs_module_exports_object() {
        let map = build_js("module.exports = { a, b: 2, c() {}, 'd': 4 };");

        assert_eq!(names(&map), vec!["a", "b", "c", "d", "default"]);
        assert_eq!(map.parse_goal(), ParseGoal::Script);
    }

    #[test]
    fn opaque_module_exports_leave_names_unknown() {
        let computed = build_js("module.exports = createApi();");
        let spread = build_js("module.exports = { a, ...rest };");
        let literal = build_js("module.exports = { a };\nexports.b = 2;");

        assert_eq!(names(&computed), vec!["default"]);
        assert!(computed.exports_unknown());
        assert!(spread.exports_unknown());
        assert!(!literal.exports_unknown());
    }

    #[test]
    fn commonjs_named_exports_add_synthetic_default() {
        let map = build_js("exports.a = 1;\nmodule.exports.b = 2;\nexports['c'] = 3;");

        assert_eq!(names(&map), vec!["a", "b", "c", "default"]);
    }

    #[test]
    fn commonjs_disabled_by_settings() {
        let settings = Settings {
            commonjs: false,
            ..Settings::default()
        };
        let map = build_with("/src/mod.js", "exports.a = 1;", &settings);

        assert!(map.namespace().is_empty());
        assert_eq!(map.parse_goal(), ParseGoal::Ambiguous);
    }

    #[test]
    fn commonjs_ignored_in_es_modules() {
        let map = build_js("export const a = 1;\nexports.b = 2;");

        assert_eq!(names(&map), vec!["a"]);
    }

    #[test]
    fn require_calls_are_imports() {
        let map = build_js("const a = require('./a.js');\nconst { b, c: d } = require('./b.js');");

        assert!(map.imports()[Path::new("/src/a.js")].namespace);
        let b = &map.imports()[Path::new("/src/b.js")];
        assert_eq!(b.names.iter().map(String::as_str).collect::<Vec<_>>(), vec!["b", "c"]);
        assert_eq!(map.parse_goal(), ParseGoal::Script);
    }

    #[test]
    fn require_only_script_has_default_but_unknown_names() {
        let map = build_js("const path = require('path');\nglobalThis.install = () => path;");

        assert!(map.namespace().is_empty());
        assert!(map.exports_unknown());
        assert!(map.has_default());
    }

    #[test]
    fn imports_are_merged_per_target() {
        let map = build_js(
            "import a from './a.js';\nimport { b } from './a.js';\nimport './side.js';\nimport fs from 'fs';\nimport x from './missing/../x';",
        );

        let a = &map.imports()[Path::new("/src/a.js")];
        assert_eq!(a.names.iter().map(String::as_str).collect::<Vec<_>>(), vec!["b", "default"]);
        assert!(map.imports().contains_key(Path::new("/src/side.js")));
        assert_eq!(map.imports().len(), 3);
        assert!(map.unresolved().is_empty());
    }

    #[test]
    fn unresolved_imports_are_listed() {
        let map = build_js("import a from 'left-pad';\nimport fs from 'node:fs';");

        assert_eq!(map.unresolved().len(), 1);
        assert_eq!(map.unresolved()[0].specifier, "left-pad");
        assert_eq!(map.unresolved()[0].location, Location { line: 1, column: 1 });
    }

    #[test]
    fn unresolved_reexport_is_a_resolution_error() {
        let map = build_js("export { a } from 'nowhere';\nexport * from 'fs';");

        assert_eq!(map.errors().len(), 1);
        assert!(matches!(
            &map.errors()[0],
            ExportMapError::Resolution { specifier, .. } if specifier == "nowhere"
        ));
    }

    #[test]
    fn parse_error_short_circuits() {
        let map = build_js("export const a = 1;\nexport const = ;");

        assert!(map.is_broken());
        assert!(map.namespace().is_empty());
        match &map.errors()[0] {
            ExportMapError::Parse { line, .. } => assert_eq!(*line, 2),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn no_module_syntax_is_ambiguous() {
        let map = build_js("const a = 1;\nconsole.log(a);");

        assert_eq!(map.parse_goal(), ParseGoal::Ambiguous);
        assert!(map.is_empty());
    }

    #[test]
    fn jsdoc_is_attached_to_entries() {
        let map = build_js(
            "/** Old one.\n * @deprecated use b */\nexport const a = 1;\n/** Fine. */\nexport function b() {}\n/** @deprecated */\nfunction c() {}\nexport { c };",
        );

        assert_eq!(map.get("a").unwrap().deprecation(), Some("use b"));
        assert_eq!(map.get("a").unwrap().doc.as_ref().unwrap().description, "Old one.");
        assert_eq!(map.get("b").unwrap().deprecation(), None);
        assert_eq!(map.get("c").unwrap().deprecation(), Some(""));
    }

    #[test]
    fn jsdoc_disabled_without_docstyle() {
        let settings = Settings {
            docstyle: Vec::new(),
            ..Settings::default()
        };
        let map = build_with("/src/mod.js", "/** @deprecated */\nexport const a = 1;", &settings);

        assert!(map.get("a").unwrap().doc.is_none());
    }

    #[test]
    fn module_doc_requires_module_tag() {
        let map = build_js("/**\n * Helpers.\n * @module helpers\n */\nexport const a = 1;");

        let doc = map.doc().unwrap();
        assert_eq!(doc.description, "Helpers.");
        assert!(doc.has_tag("module"));
    }

    #[test]
    fn string_export_names() {
        let map = build_js("const a = 1;\nexport { a as 'kebab-name' };");

        assert_eq!(names(&map), vec!["kebab-name"]);
    }
}
