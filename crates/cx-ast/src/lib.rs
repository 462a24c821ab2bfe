//! Syntax tree for the Cx event language.
//!
//! The parser produces these types directly; the grammar-shaped intermediate
//! structure is internal to the recursive-descent functions and never escapes
//! this boundary. Nodes are closed sum types with exhaustive matching —
//! adding a statement or expression kind is a compile-enforced change at
//! every consumer, which is the intended extension discipline.
//!
//! - [`foundation`] — spans, source files, event names
//! - [`ast`] — programs, statements, expressions
//! - [`ast::walk`] — closure-based pre-order traversal

pub mod ast;
pub mod foundation;

pub use ast::{
    AiVerb, BinaryOp, ClassDecl, EmitStmt, EntityDecl, Expr, ExprKind, FunctionDecl, HandlerItem,
    OnHandler, Program, Stmt, StmtKind, UnaryOp,
};
pub use foundation::{EventName, SourceFile, Span};
