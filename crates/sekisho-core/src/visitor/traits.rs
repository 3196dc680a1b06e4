//! AstVisitor trait for uniform AST traversal.

use std::ops::ControlFlow;

use swc_ecma_ast::{AssignExpr, CallExpr, MemberExpr, VarDeclarator};

use super::context::VisitorContext;

pub trait AstVisitor {
    fn visit_call_expr(&mut self, _node: &CallExpr, _ctx: &VisitorContext) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    fn visit_member_expr(&mut self, _node: &MemberExpr, _ctx: &VisitorContext) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    fn visit_assign_expr(&mut self, _node: &AssignExpr, _ctx: &VisitorContext) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    fn visit_var_declarator(
        &mut self,
        _node: &VarDeclarator,
        _ctx: &VisitorContext,
    ) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}
