//! Untyped AST produced by the parser.
//!
//! # Design Principles
//!
//! ## Parser simplicity
//!
//! The parser produces simple, untyped structures: just syntactic shape plus
//! source locations. No evaluation, no constant folding, no inference — later
//! passes own those.
//!
//! ## Closed sum types
//!
//! Statement and expression kinds are closed enums with exhaustive matching.
//! Adding a kind is a deliberate, compiler-enforced change at every consumer
//! rather than an open virtual-dispatch extension point.
//!
//! ## Order preservation
//!
//! Top-level statement order, object-literal property order, and array
//! element order are all semantically meaningful (handler registration order
//! and deterministic payload construction) and are preserved verbatim.

pub mod walk;

use crate::foundation::{EventName, Span};

/// Root node: an ordered sequence of top-level statements.
///
/// Declaration order is meaningful — handlers register in the order their
/// `on` statements execute.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Logical file name supplied to the parser, if any
    pub file_name: Option<String>,
    /// Top-level statements in source order
    pub body: Vec<Stmt>,
}

/// A statement with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    /// Statement kind
    pub kind: StmtKind,
    /// Source location for diagnostics
    pub span: Span,
}

impl Stmt {
    /// Create a new statement.
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Statement kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// Variable declaration: `let x = 1;`
    Let {
        /// Variable name
        name: String,
        /// Optional initializer (defaults to `null`)
        init: Option<Expr>,
    },

    /// Assignment to an identifier, member, or index target:
    /// `x = 1;`, `self.count = 2;`, `xs[0] = 3;`
    Assign {
        /// Assignment target (parser guarantees Ident/Member/Index)
        target: Expr,
        /// Value expression
        value: Expr,
    },

    /// Function declaration: `function add(a, b) { return a + b; }`
    Function(FunctionDecl),

    /// Plain record type: `class Point { let x = 0; let y = 0; }`
    ///
    /// `new Point()` yields a fresh map with the field defaults. Classes
    /// carry no behavior — behavior lives in event handlers.
    Class(ClassDecl),

    /// Conscious entity declaration.
    Entity(EntityDecl),

    /// `if (cond) stmt else stmt` — the `else` binds to the nearest
    /// unmatched `if`.
    If {
        /// Condition expression
        condition: Expr,
        /// Then branch
        then_branch: Box<Stmt>,
        /// Optional else branch
        else_branch: Option<Box<Stmt>>,
    },

    /// `while (cond) stmt`
    While {
        /// Loop condition
        condition: Expr,
        /// Loop body
        body: Box<Stmt>,
    },

    /// C-style `for (init; cond; step) stmt`; every header slot is optional.
    For {
        /// Initializer statement (`let` or expression)
        init: Option<Box<Stmt>>,
        /// Loop condition (absent means `true`)
        condition: Option<Expr>,
        /// Step statement run after each iteration
        step: Option<Box<Stmt>>,
        /// Loop body
        body: Box<Stmt>,
    },

    /// `break;`
    Break,

    /// `continue;`
    Continue,

    /// `return;` or `return expr;`
    Return(Option<Expr>),

    /// `try { ... } catch (e) { ... }`
    Try {
        /// Protected statements
        body: Vec<Stmt>,
        /// Catch binding name, if declared
        binding: Option<String>,
        /// Handler statements
        handler: Vec<Stmt>,
    },

    /// `throw expr;`
    Throw(Expr),

    /// Event handler registration: `on event.name (payload) { ... }`
    On(OnHandler),

    /// Event emission with optional payload and declarative handler chain.
    Emit(EmitStmt),

    /// AI-capability statement: `think "goal", { depth: 2 };`
    ///
    /// Parsed as an opaque call-like statement; the runtime lowers it to an
    /// `ai.<verb>` event. The front-end attaches no semantics to the verb.
    AiCall {
        /// Capability verb
        verb: AiVerb,
        /// Goal expression
        goal: Expr,
        /// Optional options object literal
        options: Option<Expr>,
    },

    /// Expression statement: `f(x);`
    Expr(Expr),

    /// Braced statement block introducing a lexical scope.
    Block(Vec<Stmt>),
}

/// Function declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    /// Function name
    pub name: String,
    /// Parameter names in order
    pub params: Vec<String>,
    /// Body statements
    pub body: Vec<Stmt>,
    /// Source location
    pub span: Span,
}

/// Plain record type declaration: ordered field names with default
/// initializers.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    /// Type name
    pub name: String,
    /// Field declarations in source order
    pub fields: Vec<(String, Option<Expr>)>,
    /// Source location
    pub span: Span,
}

/// Conscious entity declaration.
///
/// ```cx
/// conscious Greeter {
///     let greetings = 0;
///     realize() { emit greeter.ready {}; }
///     on user.arrived (e) { self.greetings = self.greetings + 1; }
/// }
/// ```
///
/// Fields may be mutated only from a handler body executing for that
/// instance — a documented convention, not a static check.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDecl {
    /// Entity type name
    pub name: String,
    /// Declared instance fields in source order
    pub fields: Vec<(String, Option<Expr>)>,
    /// `realize()` body, run once on construction
    pub realize: Option<Vec<Stmt>>,
    /// `on` handlers in declaration order (registration order)
    pub handlers: Vec<OnHandler>,
    /// Source location
    pub span: Span,
}

/// A single `on` handler: event name, optional payload binding, body.
#[derive(Debug, Clone, PartialEq)]
pub struct OnHandler {
    /// Event name the handler subscribes to (exact match)
    pub event: EventName,
    /// Payload parameter name, if declared
    pub param: Option<String>,
    /// Handler body
    pub body: Vec<Stmt>,
    /// Source location
    pub span: Span,
}

/// An `emit` statement.
///
/// ```cx
/// emit task.done {
///     ok: true,
///     handlers: [ report.send, archive.store { compress: true } ]
/// };
/// ```
///
/// The `handlers:` key of the payload literal is pulled out at parse time
/// into the declarative chain; the remaining properties form the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct EmitStmt {
    /// Event to emit
    pub event: EventName,
    /// Payload object properties in source order
    pub payload: Vec<(String, Expr)>,
    /// Follow-up events to fire after dispatch, in order
    pub chain: Vec<HandlerItem>,
    /// Source location
    pub span: Span,
}

/// One follow-up item in an `emit` statement's handler chain.
///
/// When the item fires, its `extra` properties are deep-merged over the base
/// payload (item keys win); the merge produces a new map and never mutates
/// the base.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerItem {
    /// Event to fire
    pub event: EventName,
    /// Extra payload properties to merge in, in source order
    pub extra: Vec<(String, Expr)>,
    /// Source location
    pub span: Span,
}

/// AI-capability verbs.
///
/// The core guarantees delivery of the lowered `ai.<verb>` event, nothing
/// about what a handler computes for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AiVerb {
    /// Text reasoning/generation request
    Think,
    /// Knowledge-ingestion request
    Learn,
    /// Media generation request
    Generate,
    /// Embedding request
    Embed,
}

impl AiVerb {
    /// The verb's lowercase name, used to form the `ai.<verb>` event.
    pub fn as_str(self) -> &'static str {
        match self {
            AiVerb::Think => "think",
            AiVerb::Learn => "learn",
            AiVerb::Generate => "generate",
            AiVerb::Embed => "embed",
        }
    }

    /// The event name this verb lowers to.
    pub fn event_name(self) -> EventName {
        EventName::new(vec!["ai".to_string(), self.as_str().to_string()])
    }
}

/// An expression with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    /// Expression kind
    pub kind: ExprKind,
    /// Source location for diagnostics
    pub span: Span,
}

impl Expr {
    /// Create a new expression.
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Create a binary operator expression.
    pub fn binary(op: BinaryOp, left: Expr, right: Expr, span: Span) -> Self {
        Self::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    /// Create a unary operator expression.
    pub fn unary(op: UnaryOp, operand: Expr, span: Span) -> Self {
        Self::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        )
    }

    /// Whether this expression is a valid assignment target.
    pub fn is_assign_target(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Ident(_) | ExprKind::Member { .. } | ExprKind::Index { .. }
        )
    }
}

/// Expression kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// `null`
    Null,
    /// `true` / `false`
    Bool(bool),
    /// Integer literal (no decimal point in source)
    Int(i64),
    /// Float literal (decimal point or exponent in source)
    Float(f64),
    /// String literal, already unescaped
    Str(String),

    /// Identifier reference
    Ident(String),

    /// Binary operator application
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
    },

    /// Unary operator application
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Expr>,
    },

    /// Call: `callee(args...)`
    Call {
        /// Called expression (identifier or member access)
        callee: Box<Expr>,
        /// Arguments in order
        args: Vec<Expr>,
    },

    /// Member access: `object.field`
    Member {
        /// Object expression
        object: Box<Expr>,
        /// Field name
        field: String,
    },

    /// Index access: `object[index]`
    Index {
        /// Object expression
        object: Box<Expr>,
        /// Index expression
        index: Box<Expr>,
    },

    /// Array literal; element order is preserved
    Array(Vec<Expr>),

    /// Object literal; property order is preserved
    Object(Vec<(String, Expr)>),

    /// `new Name(args...)` — instantiates a class record or spawns a
    /// conscious entity (yielding its instance id)
    New {
        /// Class or entity name
        name: String,
        /// Constructor arguments
        args: Vec<Expr>,
    },
}

/// Binary operators, grouped by precedence level (low to high:
/// `||` → `&&` → equality → relational → additive → multiplicative).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `||`
    Or,
    /// `&&`
    And,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Neg,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sp() -> Span {
        Span::new(0, 1, 1)
    }

    #[test]
    fn expr_binary_helper() {
        let left = Expr::new(ExprKind::Int(1), sp());
        let right = Expr::new(ExprKind::Int(2), sp());
        let expr = Expr::binary(BinaryOp::Add, left, right, sp());
        match expr.kind {
            ExprKind::Binary { op, .. } => assert_eq!(op, BinaryOp::Add),
            _ => panic!("expected binary"),
        }
    }

    #[test]
    fn assign_targets() {
        let ident = Expr::new(ExprKind::Ident("x".into()), sp());
        assert!(ident.is_assign_target());

        let member = Expr::new(
            ExprKind::Member {
                object: Box::new(ident.clone()),
                field: "y".into(),
            },
            sp(),
        );
        assert!(member.is_assign_target());

        let lit = Expr::new(ExprKind::Int(3), sp());
        assert!(!lit.is_assign_target());
    }

    #[test]
    fn ai_verb_event_names() {
        assert_eq!(AiVerb::Think.event_name().full_name(), "ai.think");
        assert_eq!(AiVerb::Embed.event_name().full_name(), "ai.embed");
    }
}
