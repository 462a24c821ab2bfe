//! Expression parser — precedence climbing for binary and unary operators,
//! a postfix loop for calls/member/index access, and the literal atoms.

use super::{token_utils, ParseError, TokenStream};
use cx_ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use cx_lexer::Token;

/// Parse a full expression.
pub fn parse_expr(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    parse_pratt(stream, 0)
}

/// Get binary operator metadata (precedence and operator enum).
///
/// Higher precedence binds tighter. All Cx binary operators are
/// left-associative. This table is the single source of truth for the
/// language's precedence ladder: `||` → `&&` → equality → relational →
/// additive → multiplicative.
fn binary_op_info(token: &Token) -> Option<(u8, BinaryOp)> {
    match token {
        Token::PipePipe => Some((10, BinaryOp::Or)),
        Token::AmpAmp => Some((20, BinaryOp::And)),
        Token::EqEq => Some((30, BinaryOp::Eq)),
        Token::BangEq => Some((30, BinaryOp::Ne)),
        Token::Lt => Some((40, BinaryOp::Lt)),
        Token::LtEq => Some((40, BinaryOp::Le)),
        Token::Gt => Some((40, BinaryOp::Gt)),
        Token::GtEq => Some((40, BinaryOp::Ge)),
        Token::Plus => Some((50, BinaryOp::Add)),
        Token::Minus => Some((50, BinaryOp::Sub)),
        Token::Star => Some((60, BinaryOp::Mul)),
        Token::Slash => Some((60, BinaryOp::Div)),
        Token::Percent => Some((60, BinaryOp::Mod)),
        _ => None,
    }
}

/// Pratt parser core — binary operators with precedence climbing.
fn parse_pratt(stream: &mut TokenStream, min_prec: u8) -> Result<Expr, ParseError> {
    let mut left = parse_prefix(stream)?;

    while let Some(token) = stream.peek() {
        if let Some((prec, op)) = binary_op_info(token) {
            if prec < min_prec {
                break;
            }

            let span = stream.current_span();
            stream.advance();

            // Left-associative: the right side must bind strictly tighter.
            let right = parse_pratt(stream, prec + 1)?;
            left = Expr::binary(op, left, right, span);
        } else {
            break;
        }
    }

    Ok(left)
}

/// Parse prefix expressions (unary operators, then postfix chains).
fn parse_prefix(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    match stream.peek() {
        Some(Token::Minus) | Some(Token::Bang) => {
            let span = stream.current_span();
            let op = match stream.advance() {
                Some(Token::Minus) => UnaryOp::Neg,
                Some(Token::Bang) => UnaryOp::Not,
                _ => unreachable!("peeked a unary operator"),
            };
            let operand = parse_prefix(stream)?;
            Ok(Expr::unary(op, operand, span))
        }
        _ => parse_postfix(stream),
    }
}

/// Parse postfix expressions: member access, index access, calls.
fn parse_postfix(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let mut expr = parse_atom(stream)?;

    loop {
        match stream.peek() {
            Some(Token::Dot) => {
                let span = stream.current_span();
                stream.advance();
                let field = expect_word(stream, "after `.`")?;
                expr = Expr::new(
                    ExprKind::Member {
                        object: Box::new(expr),
                        field,
                    },
                    span,
                );
            }
            Some(Token::LBracket) => {
                let span = stream.current_span();
                stream.advance();
                let index = parse_expr(stream)?;
                stream.expect(Token::RBracket)?;
                expr = Expr::new(
                    ExprKind::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    },
                    span,
                );
            }
            Some(Token::LParen) => {
                let span = expr.span;
                let args = parse_call_args(stream)?;
                expr = Expr::new(
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    span,
                );
            }
            _ => break,
        }
    }

    Ok(expr)
}

/// Parse parenthesized call arguments.
fn parse_call_args(stream: &mut TokenStream) -> Result<Vec<Expr>, ParseError> {
    stream.expect(Token::LParen)?;

    let mut args = Vec::new();
    while !matches!(stream.peek(), Some(Token::RParen)) {
        args.push(parse_expr(stream)?);
        if !matches!(stream.peek(), Some(Token::RParen)) {
            stream.expect(Token::Comma)?;
        }
    }

    stream.expect(Token::RParen)?;
    Ok(args)
}

/// Parse a primary expression.
fn parse_atom(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let span = stream.current_span();

    match stream.peek() {
        Some(Token::Null) => {
            stream.advance();
            Ok(Expr::new(ExprKind::Null, span))
        }
        Some(Token::True) => {
            stream.advance();
            Ok(Expr::new(ExprKind::Bool(true), span))
        }
        Some(Token::False) => {
            stream.advance();
            Ok(Expr::new(ExprKind::Bool(false), span))
        }
        Some(Token::Integer(_)) => {
            let Some(Token::Integer(n)) = stream.advance().cloned() else {
                unreachable!("peeked an integer");
            };
            Ok(Expr::new(ExprKind::Int(n), span))
        }
        Some(Token::Float(_)) => {
            let Some(Token::Float(x)) = stream.advance().cloned() else {
                unreachable!("peeked a float");
            };
            Ok(Expr::new(ExprKind::Float(x), span))
        }
        Some(Token::String(_)) => {
            let Some(Token::String(s)) = stream.advance().cloned() else {
                unreachable!("peeked a string");
            };
            Ok(Expr::new(ExprKind::Str(s), span))
        }
        Some(Token::Ident(_)) => {
            let Some(Token::Ident(name)) = stream.advance().cloned() else {
                unreachable!("peeked an identifier");
            };
            Ok(Expr::new(ExprKind::Ident(name), span))
        }
        Some(Token::LParen) => {
            stream.advance();
            let inner = parse_expr(stream)?;
            stream.expect(Token::RParen)?;
            Ok(inner)
        }
        Some(Token::LBracket) => parse_array(stream),
        Some(Token::LBrace) => parse_object(stream),
        Some(Token::New) => {
            stream.advance();
            let name = {
                let span = stream.current_span();
                match stream.advance() {
                    Some(Token::Ident(s)) => s.clone(),
                    other => {
                        return Err(ParseError::unexpected_token(other, "after `new`", span));
                    }
                }
            };
            let args = if matches!(stream.peek(), Some(Token::LParen)) {
                parse_call_args(stream)?
            } else {
                Vec::new()
            };
            Ok(Expr::new(ExprKind::New { name, args }, span))
        }
        other => Err(ParseError::unexpected_token(
            other,
            "where an expression was expected",
            span,
        )),
    }
}

/// Parse an array literal, preserving element order.
fn parse_array(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let span = stream.current_span();
    stream.expect(Token::LBracket)?;

    let mut items = Vec::new();
    while !matches!(stream.peek(), Some(Token::RBracket)) {
        items.push(parse_expr(stream)?);
        if !matches!(stream.peek(), Some(Token::RBracket)) {
            stream.expect(Token::Comma)?;
        }
    }

    stream.expect(Token::RBracket)?;
    Ok(Expr::new(ExprKind::Array(items), span))
}

/// Parse an object literal, preserving property order.
pub(super) fn parse_object(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let span = stream.current_span();
    stream.expect(Token::LBrace)?;
    let props = parse_object_props(stream)?;
    stream.expect(Token::RBrace)?;
    Ok(Expr::new(ExprKind::Object(props), span))
}

/// Parse the `key: value` interior of an object literal, up to the closing
/// brace (not consumed).
pub(super) fn parse_object_props(
    stream: &mut TokenStream,
) -> Result<Vec<(String, Expr)>, ParseError> {
    let mut props = Vec::new();
    while !matches!(stream.peek(), Some(Token::RBrace)) {
        let key = parse_property_key(stream)?;
        stream.expect(Token::Colon)?;
        let value = parse_expr(stream)?;
        props.push((key, value));

        if !matches!(stream.peek(), Some(Token::RBrace)) {
            stream.expect(Token::Comma)?;
        }
    }
    Ok(props)
}

/// Parse an object property key: identifier, string literal, or word-like
/// keyword.
pub(super) fn parse_property_key(stream: &mut TokenStream) -> Result<String, ParseError> {
    let span = stream.current_span();
    match stream.advance() {
        Some(Token::Ident(s)) => Ok(s.clone()),
        Some(Token::String(s)) => Ok(s.clone()),
        Some(token) => token_utils::keyword_to_string(token)
            .ok_or_else(|| ParseError::unexpected_token(Some(token), "as a property key", span)),
        None => Err(ParseError::unexpected_token(None, "as a property key", span)),
    }
}

/// Expect an identifier-like word (identifier or word-like keyword).
pub(super) fn expect_word(stream: &mut TokenStream, context: &str) -> Result<String, ParseError> {
    let span = stream.current_span();
    match stream.advance() {
        Some(Token::Ident(s)) => Ok(s.clone()),
        Some(token) => token_utils::keyword_to_string(token)
            .ok_or_else(|| ParseError::unexpected_token(Some(token), context, span)),
        None => Err(ParseError::unexpected_token(None, context, span)),
    }
}
