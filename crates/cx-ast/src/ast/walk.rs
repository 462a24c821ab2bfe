//! Syntax tree walking utilities.
//!
//! Shared traversal logic so analysis passes don't each duplicate the
//! recursive descent over statement and expression kinds.
//!
//! # Design
//!
//! - **Minimal API** — two functions, not a trait hierarchy
//! - **Visitor pattern** — caller provides `FnMut` closures for inspection
//! - **Pre-order traversal** — visitor called before recursing into children
//!
//! A visitor trait with one method per node kind would reintroduce the open
//! double-dispatch surface this AST deliberately avoids; closures over the
//! closed enums keep exhaustiveness checking at the `match` sites here.

use super::{Expr, ExprKind, Stmt, StmtKind};

/// Recursively walk an expression tree in pre-order.
///
/// The visitor is called for the root, then for each child left-to-right.
pub fn walk_expr<V>(expr: &Expr, visitor: &mut V)
where
    V: FnMut(&Expr),
{
    visitor(expr);

    match &expr.kind {
        ExprKind::Null
        | ExprKind::Bool(_)
        | ExprKind::Int(_)
        | ExprKind::Float(_)
        | ExprKind::Str(_)
        | ExprKind::Ident(_) => {}
        ExprKind::Binary { left, right, .. } => {
            walk_expr(left, visitor);
            walk_expr(right, visitor);
        }
        ExprKind::Unary { operand, .. } => walk_expr(operand, visitor),
        ExprKind::Call { callee, args } => {
            walk_expr(callee, visitor);
            for arg in args {
                walk_expr(arg, visitor);
            }
        }
        ExprKind::Member { object, .. } => walk_expr(object, visitor),
        ExprKind::Index { object, index } => {
            walk_expr(object, visitor);
            walk_expr(index, visitor);
        }
        ExprKind::Array(items) => {
            for item in items {
                walk_expr(item, visitor);
            }
        }
        ExprKind::Object(props) => {
            for (_, value) in props {
                walk_expr(value, visitor);
            }
        }
        ExprKind::New { args, .. } => {
            for arg in args {
                walk_expr(arg, visitor);
            }
        }
    }
}

/// Recursively walk a statement tree in pre-order.
///
/// `stmt_visitor` is called for every statement; expressions inside
/// statements are traversed with [`walk_expr`] using `expr_visitor`.
pub fn walk_stmt<S, E>(stmt: &Stmt, stmt_visitor: &mut S, expr_visitor: &mut E)
where
    S: FnMut(&Stmt),
    E: FnMut(&Expr),
{
    stmt_visitor(stmt);

    match &stmt.kind {
        StmtKind::Let { init, .. } => {
            if let Some(init) = init {
                walk_expr(init, expr_visitor);
            }
        }
        StmtKind::Assign { target, value } => {
            walk_expr(target, expr_visitor);
            walk_expr(value, expr_visitor);
        }
        StmtKind::Function(decl) => {
            for s in &decl.body {
                walk_stmt(s, stmt_visitor, expr_visitor);
            }
        }
        StmtKind::Class(decl) => {
            for (_, init) in &decl.fields {
                if let Some(init) = init {
                    walk_expr(init, expr_visitor);
                }
            }
        }
        StmtKind::Entity(decl) => {
            for (_, init) in &decl.fields {
                if let Some(init) = init {
                    walk_expr(init, expr_visitor);
                }
            }
            if let Some(body) = &decl.realize {
                for s in body {
                    walk_stmt(s, stmt_visitor, expr_visitor);
                }
            }
            for handler in &decl.handlers {
                for s in &handler.body {
                    walk_stmt(s, stmt_visitor, expr_visitor);
                }
            }
        }
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            walk_expr(condition, expr_visitor);
            walk_stmt(then_branch, stmt_visitor, expr_visitor);
            if let Some(else_branch) = else_branch {
                walk_stmt(else_branch, stmt_visitor, expr_visitor);
            }
        }
        StmtKind::While { condition, body } => {
            walk_expr(condition, expr_visitor);
            walk_stmt(body, stmt_visitor, expr_visitor);
        }
        StmtKind::For {
            init,
            condition,
            step,
            body,
        } => {
            if let Some(init) = init {
                walk_stmt(init, stmt_visitor, expr_visitor);
            }
            if let Some(condition) = condition {
                walk_expr(condition, expr_visitor);
            }
            if let Some(step) = step {
                walk_stmt(step, stmt_visitor, expr_visitor);
            }
            walk_stmt(body, stmt_visitor, expr_visitor);
        }
        StmtKind::Break | StmtKind::Continue => {}
        StmtKind::Return(value) => {
            if let Some(value) = value {
                walk_expr(value, expr_visitor);
            }
        }
        StmtKind::Try { body, handler, .. } => {
            for s in body {
                walk_stmt(s, stmt_visitor, expr_visitor);
            }
            for s in handler {
                walk_stmt(s, stmt_visitor, expr_visitor);
            }
        }
        StmtKind::Throw(value) => walk_expr(value, expr_visitor),
        StmtKind::On(handler) => {
            for s in &handler.body {
                walk_stmt(s, stmt_visitor, expr_visitor);
            }
        }
        StmtKind::Emit(emit) => {
            for (_, value) in &emit.payload {
                walk_expr(value, expr_visitor);
            }
            for item in &emit.chain {
                for (_, value) in &item.extra {
                    walk_expr(value, expr_visitor);
                }
            }
        }
        StmtKind::AiCall { goal, options, .. } => {
            walk_expr(goal, expr_visitor);
            if let Some(options) = options {
                walk_expr(options, expr_visitor);
            }
        }
        StmtKind::Expr(expr) => walk_expr(expr, expr_visitor),
        StmtKind::Block(body) => {
            for s in body {
                walk_stmt(s, stmt_visitor, expr_visitor);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::Span;

    fn sp() -> Span {
        Span::new(0, 1, 1)
    }

    #[test]
    fn walk_counts_all_expr_nodes() {
        // 1 + (2 * 3) — five expression nodes
        let expr = Expr::binary(
            crate::BinaryOp::Add,
            Expr::new(ExprKind::Int(1), sp()),
            Expr::binary(
                crate::BinaryOp::Mul,
                Expr::new(ExprKind::Int(2), sp()),
                Expr::new(ExprKind::Int(3), sp()),
                sp(),
            ),
            sp(),
        );

        let mut count = 0;
        walk_expr(&expr, &mut |_| count += 1);
        assert_eq!(count, 5);
    }

    #[test]
    fn walk_visits_nested_statements() {
        let inner = Stmt::new(StmtKind::Break, sp());
        let body = Stmt::new(StmtKind::Block(vec![inner]), sp());
        let stmt = Stmt::new(
            StmtKind::While {
                condition: Expr::new(ExprKind::Bool(true), sp()),
                body: Box::new(body),
            },
            sp(),
        );

        let mut stmts = 0;
        let mut exprs = 0;
        walk_stmt(&stmt, &mut |_| stmts += 1, &mut |_| exprs += 1);
        assert_eq!(stmts, 3); // while, block, break
        assert_eq!(exprs, 1); // condition
    }
}
