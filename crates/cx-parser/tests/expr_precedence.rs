//! Operator precedence and associativity tests.

use cx_ast::{BinaryOp, Expr, ExprKind, StmtKind, UnaryOp};

/// Parse a single expression statement and return its expression.
fn expr(source: &str) -> Expr {
    let program = cx_parser::parse(&format!("{};", source), None).expect("parse failed");
    assert_eq!(program.body.len(), 1);
    match &program.body[0].kind {
        StmtKind::Expr(e) => e.clone(),
        other => panic!("expected expression statement, got {:?}", other),
    }
}

fn op_of(e: &Expr) -> BinaryOp {
    match &e.kind {
        ExprKind::Binary { op, .. } => *op,
        other => panic!("expected binary expression, got {:?}", other),
    }
}

fn operands(e: &Expr) -> (&Expr, &Expr) {
    match &e.kind {
        ExprKind::Binary { left, right, .. } => (left, right),
        other => panic!("expected binary expression, got {:?}", other),
    }
}

#[test]
fn multiplicative_binds_tighter_than_additive() {
    // 1 + 2 * 3 parses as 1 + (2 * 3)
    let e = expr("1 + 2 * 3");
    assert_eq!(op_of(&e), BinaryOp::Add);
    let (_, right) = operands(&e);
    assert_eq!(op_of(right), BinaryOp::Mul);
}

#[test]
fn relational_binds_tighter_than_equality() {
    // a == b < c parses as a == (b < c)
    let e = expr("a == b < c");
    assert_eq!(op_of(&e), BinaryOp::Eq);
    let (_, right) = operands(&e);
    assert_eq!(op_of(right), BinaryOp::Lt);
}

#[test]
fn and_binds_tighter_than_or() {
    // a || b && c parses as a || (b && c)
    let e = expr("a || b && c");
    assert_eq!(op_of(&e), BinaryOp::Or);
    let (_, right) = operands(&e);
    assert_eq!(op_of(right), BinaryOp::And);
}

#[test]
fn comparison_binds_tighter_than_logic() {
    // x > 0 && y > 0 parses as (x > 0) && (y > 0)
    let e = expr("x > 0 && y > 0");
    assert_eq!(op_of(&e), BinaryOp::And);
    let (left, right) = operands(&e);
    assert_eq!(op_of(left), BinaryOp::Gt);
    assert_eq!(op_of(right), BinaryOp::Gt);
}

#[test]
fn additive_is_left_associative() {
    // 1 - 2 - 3 parses as (1 - 2) - 3
    let e = expr("1 - 2 - 3");
    assert_eq!(op_of(&e), BinaryOp::Sub);
    let (left, right) = operands(&e);
    assert_eq!(op_of(left), BinaryOp::Sub);
    assert!(matches!(right.kind, ExprKind::Int(3)));
}

#[test]
fn parentheses_override_precedence() {
    // (1 + 2) * 3
    let e = expr("(1 + 2) * 3");
    assert_eq!(op_of(&e), BinaryOp::Mul);
    let (left, _) = operands(&e);
    assert_eq!(op_of(left), BinaryOp::Add);
}

#[test]
fn unary_binds_tighter_than_multiplicative() {
    // -a * b parses as (-a) * b
    let e = expr("-a * b");
    assert_eq!(op_of(&e), BinaryOp::Mul);
    let (left, _) = operands(&e);
    assert!(matches!(
        left.kind,
        ExprKind::Unary {
            op: UnaryOp::Neg,
            ..
        }
    ));
}

#[test]
fn integer_and_float_literals_are_distinct() {
    assert!(matches!(expr("42").kind, ExprKind::Int(42)));
    assert!(matches!(expr("42.0").kind, ExprKind::Float(_)));
    assert!(matches!(expr("5e3").kind, ExprKind::Float(_)));
}

#[test]
fn postfix_chains_nest_left_to_right() {
    // a.b[0](x) — call of index of member
    let e = expr("a.b[0](x)");
    let ExprKind::Call { callee, args } = &e.kind else {
        panic!("expected call");
    };
    assert_eq!(args.len(), 1);
    let ExprKind::Index { object, .. } = &callee.kind else {
        panic!("expected index below call");
    };
    assert!(matches!(object.kind, ExprKind::Member { .. }));
}

#[test]
fn object_literal_preserves_property_order() {
    // A bare `{` in statement position opens a block, so parenthesize.
    let e = expr("({ z: 1, a: 2, m: 3 })");
    let keys: Vec<&str> = match &e.kind {
        ExprKind::Object(props) => props.iter().map(|(k, _)| k.as_str()).collect(),
        other => panic!("expected object literal, got {:?}", other),
    };
    assert_eq!(keys, vec!["z", "a", "m"]);
}
