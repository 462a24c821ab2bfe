//! Statement parsers, keyword-dispatched.

use super::expr::parse_expr;
use super::{event, ParseError, TokenStream};
use cx_ast::{AiVerb, ClassDecl, EntityDecl, Expr, FunctionDecl, Stmt, StmtKind};
use cx_lexer::Token;

/// Parse a single statement (keyword-dispatched).
pub(super) fn parse_statement(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    match stream.peek() {
        Some(Token::Let) => parse_let(stream, true),
        Some(Token::Function) => parse_function(stream),
        Some(Token::Class) => parse_class(stream),
        Some(Token::Conscious) => parse_entity(stream),
        Some(Token::If) => parse_if(stream),
        Some(Token::While) => parse_while(stream),
        Some(Token::For) => parse_for(stream),
        Some(Token::Break) => {
            let span = stream.expect(Token::Break)?;
            stream.expect(Token::Semicolon)?;
            Ok(Stmt::new(StmtKind::Break, span))
        }
        Some(Token::Continue) => {
            let span = stream.expect(Token::Continue)?;
            stream.expect(Token::Semicolon)?;
            Ok(Stmt::new(StmtKind::Continue, span))
        }
        Some(Token::Return) => {
            let span = stream.expect(Token::Return)?;
            let value = if matches!(stream.peek(), Some(Token::Semicolon)) {
                None
            } else {
                Some(parse_expr(stream)?)
            };
            stream.expect(Token::Semicolon)?;
            Ok(Stmt::new(StmtKind::Return(value), span))
        }
        Some(Token::Try) => parse_try(stream),
        Some(Token::Throw) => {
            let span = stream.expect(Token::Throw)?;
            let value = parse_expr(stream)?;
            stream.expect(Token::Semicolon)?;
            Ok(Stmt::new(StmtKind::Throw(value), span))
        }
        Some(Token::On) => {
            let handler = event::parse_on(stream)?;
            let span = handler.span;
            Ok(Stmt::new(StmtKind::On(handler), span))
        }
        Some(Token::Emit) => event::parse_emit(stream),
        Some(Token::Think) | Some(Token::Learn) | Some(Token::Generate) | Some(Token::Embed) => {
            parse_ai_call(stream)
        }
        Some(Token::LBrace) => {
            let span = stream.current_span();
            let body = parse_block_body(stream)?;
            Ok(Stmt::new(StmtKind::Block(body), span))
        }
        _ => parse_expr_or_assign(stream, true),
    }
}

/// Parse a braced statement list: `{ stmt* }`.
pub(super) fn parse_block_body(stream: &mut TokenStream) -> Result<Vec<Stmt>, ParseError> {
    stream.expect(Token::LBrace)?;
    let mut body = Vec::new();
    while !matches!(stream.peek(), Some(Token::RBrace)) {
        if stream.at_end() {
            return Err(ParseError::unexpected_token(
                None,
                "while parsing a block (missing `}`)",
                stream.current_span(),
            ));
        }
        body.push(parse_statement(stream)?);
    }
    stream.expect(Token::RBrace)?;
    Ok(body)
}

/// Parse `let name (= expr)? ;`.
///
/// With `terminated = false` the trailing semicolon is left alone (used in
/// `for` headers, which own their separators).
fn parse_let(stream: &mut TokenStream, terminated: bool) -> Result<Stmt, ParseError> {
    let span = stream.expect(Token::Let)?;
    let name = expect_ident(stream, "after `let`")?;

    let init = if stream.eat(&Token::Eq) {
        Some(parse_expr(stream)?)
    } else {
        None
    };

    if terminated {
        stream.expect(Token::Semicolon)?;
    }
    Ok(Stmt::new(StmtKind::Let { name, init }, span))
}

/// Parse an expression statement or an assignment.
fn parse_expr_or_assign(stream: &mut TokenStream, terminated: bool) -> Result<Stmt, ParseError> {
    let span = stream.current_span();
    let expr = parse_expr(stream)?;

    let stmt = if stream.eat(&Token::Eq) {
        if !expr.is_assign_target() {
            return Err(ParseError::invalid_syntax(
                "invalid assignment target",
                span,
            ));
        }
        let value = parse_expr(stream)?;
        Stmt::new(
            StmtKind::Assign {
                target: expr,
                value,
            },
            span,
        )
    } else {
        Stmt::new(StmtKind::Expr(expr), span)
    };

    if terminated {
        stream.expect(Token::Semicolon)?;
    }
    Ok(stmt)
}

/// Parse `function name(params) { ... }`.
fn parse_function(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let span = stream.expect(Token::Function)?;
    let name = expect_ident(stream, "after `function`")?;

    stream.expect(Token::LParen)?;
    let mut params = Vec::new();
    while !matches!(stream.peek(), Some(Token::RParen)) {
        params.push(expect_ident(stream, "as a parameter name")?);
        if !matches!(stream.peek(), Some(Token::RParen)) {
            stream.expect(Token::Comma)?;
        }
    }
    stream.expect(Token::RParen)?;

    let body = parse_block_body(stream)?;

    Ok(Stmt::new(
        StmtKind::Function(FunctionDecl {
            name,
            params,
            body,
            span,
        }),
        span,
    ))
}

/// Parse `class Name { let field = expr; ... }`.
fn parse_class(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let span = stream.expect(Token::Class)?;
    let name = expect_ident(stream, "after `class`")?;

    stream.expect(Token::LBrace)?;
    let mut fields = Vec::new();
    while !matches!(stream.peek(), Some(Token::RBrace)) {
        fields.push(parse_field_decl(stream)?);
    }
    stream.expect(Token::RBrace)?;

    Ok(Stmt::new(
        StmtKind::Class(ClassDecl { name, fields, span }),
        span,
    ))
}

/// Parse `conscious Name { fields, realize(), on handlers }`.
fn parse_entity(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let span = stream.expect(Token::Conscious)?;
    let name = expect_ident(stream, "after `conscious`")?;

    stream.expect(Token::LBrace)?;

    let mut fields = Vec::new();
    let mut realize = None;
    let mut handlers = Vec::new();

    loop {
        match stream.peek() {
            Some(Token::RBrace) => break,
            Some(Token::Let) => fields.push(parse_field_decl(stream)?),
            Some(Token::Realize) => {
                let realize_span = stream.current_span();
                stream.advance();
                stream.expect(Token::LParen)?;
                stream.expect(Token::RParen)?;
                let body = parse_block_body(stream)?;
                if realize.is_some() {
                    return Err(ParseError::invalid_syntax(
                        format!("entity `{}` declares realize() twice", name),
                        realize_span,
                    ));
                }
                realize = Some(body);
            }
            Some(Token::On) => handlers.push(event::parse_on(stream)?),
            other => {
                return Err(ParseError::unexpected_token(
                    other,
                    "in entity body (expected `let`, `realize`, or `on`)",
                    stream.current_span(),
                ));
            }
        }
    }
    stream.expect(Token::RBrace)?;

    Ok(Stmt::new(
        StmtKind::Entity(EntityDecl {
            name,
            fields,
            realize,
            handlers,
            span,
        }),
        span,
    ))
}

/// Parse a field declaration inside a class or entity body.
fn parse_field_decl(stream: &mut TokenStream) -> Result<(String, Option<Expr>), ParseError> {
    stream.expect(Token::Let)?;
    let name = expect_ident(stream, "as a field name")?;
    let init = if stream.eat(&Token::Eq) {
        Some(parse_expr(stream)?)
    } else {
        None
    };
    stream.expect(Token::Semicolon)?;
    Ok((name, init))
}

/// Parse `if (cond) stmt (else stmt)?`.
///
/// A dangling `else` binds to the nearest unmatched `if` — the natural
/// result of this recursive descent.
fn parse_if(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let span = stream.expect(Token::If)?;
    stream.expect(Token::LParen)?;
    let condition = parse_expr(stream)?;
    stream.expect(Token::RParen)?;

    let then_branch = Box::new(parse_statement(stream)?);
    let else_branch = if stream.eat(&Token::Else) {
        Some(Box::new(parse_statement(stream)?))
    } else {
        None
    };

    Ok(Stmt::new(
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        },
        span,
    ))
}

/// Parse `while (cond) stmt`.
fn parse_while(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let span = stream.expect(Token::While)?;
    stream.expect(Token::LParen)?;
    let condition = parse_expr(stream)?;
    stream.expect(Token::RParen)?;
    let body = Box::new(parse_statement(stream)?);

    Ok(Stmt::new(StmtKind::While { condition, body }, span))
}

/// Parse `for (init; cond; step) stmt`; every header slot is optional.
fn parse_for(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let span = stream.expect(Token::For)?;
    stream.expect(Token::LParen)?;

    let init = if stream.eat(&Token::Semicolon) {
        None
    } else if stream.check(&Token::Let) {
        let stmt = parse_let(stream, false)?;
        stream.expect(Token::Semicolon)?;
        Some(Box::new(stmt))
    } else {
        let stmt = parse_expr_or_assign(stream, false)?;
        stream.expect(Token::Semicolon)?;
        Some(Box::new(stmt))
    };

    let condition = if matches!(stream.peek(), Some(Token::Semicolon)) {
        None
    } else {
        Some(parse_expr(stream)?)
    };
    stream.expect(Token::Semicolon)?;

    let step = if matches!(stream.peek(), Some(Token::RParen)) {
        None
    } else {
        Some(Box::new(parse_expr_or_assign(stream, false)?))
    };
    stream.expect(Token::RParen)?;

    let body = Box::new(parse_statement(stream)?);

    Ok(Stmt::new(
        StmtKind::For {
            init,
            condition,
            step,
            body,
        },
        span,
    ))
}

/// Parse `try { ... } catch (e)? { ... }`.
fn parse_try(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let span = stream.expect(Token::Try)?;
    let body = parse_block_body(stream)?;

    stream.expect(Token::Catch)?;
    let binding = if stream.eat(&Token::LParen) {
        let name = expect_ident(stream, "as the catch binding")?;
        stream.expect(Token::RParen)?;
        Some(name)
    } else {
        None
    };
    let handler = parse_block_body(stream)?;

    Ok(Stmt::new(
        StmtKind::Try {
            body,
            binding,
            handler,
        },
        span,
    ))
}

/// Parse an AI-capability statement: `VERB goal (, { options })? ;`.
fn parse_ai_call(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let span = stream.current_span();
    let verb = match stream.advance() {
        Some(Token::Think) => AiVerb::Think,
        Some(Token::Learn) => AiVerb::Learn,
        Some(Token::Generate) => AiVerb::Generate,
        Some(Token::Embed) => AiVerb::Embed,
        other => {
            return Err(ParseError::unexpected_token(
                other,
                "where an AI-capability verb was expected",
                span,
            ));
        }
    };

    let goal = parse_expr(stream)?;
    let options = if stream.eat(&Token::Comma) {
        Some(super::expr::parse_object(stream)?)
    } else {
        None
    };
    stream.expect(Token::Semicolon)?;

    Ok(Stmt::new(
        StmtKind::AiCall {
            verb,
            goal,
            options,
        },
        span,
    ))
}

/// Expect a plain identifier (keywords are not names here).
fn expect_ident(stream: &mut TokenStream, context: &str) -> Result<String, ParseError> {
    let span = stream.current_span();
    match stream.advance() {
        Some(Token::Ident(s)) => Ok(s.clone()),
        other => Err(ParseError::unexpected_token(other, context, span)),
    }
}
