//! Event-oriented grammar: event names, `on` handlers, and `emit`
//! statements with their declarative handler chains.

use super::expr::{expect_word, parse_expr, parse_object_props, parse_property_key};
use super::{stmt, ParseError, TokenStream};
use cx_ast::{EmitStmt, EventName, HandlerItem, OnHandler, Span, Stmt, StmtKind};
use cx_lexer::Token;

/// Parse a dotted event name: `word (. word)*`.
///
/// Word-like keywords (`think`, `handlers`, ...) are legal parts, so names
/// like `ai.think.result` parse as written.
pub(super) fn parse_event_name(stream: &mut TokenStream) -> Result<EventName, ParseError> {
    let mut parts = vec![expect_word(stream, "as an event name")?];
    while stream.eat(&Token::Dot) {
        parts.push(expect_word(stream, "as an event name part")?);
    }
    Ok(EventName::new(parts))
}

/// Parse an `on` handler registration.
///
/// ```cx
/// on sensor.reading (e) { ... }
/// ```
pub(super) fn parse_on(stream: &mut TokenStream) -> Result<OnHandler, ParseError> {
    let span = stream.expect(Token::On)?;
    let event = parse_event_name(stream)?;

    stream.expect(Token::LParen)?;
    let param = match stream.peek() {
        Some(Token::Ident(_)) => {
            let Some(Token::Ident(name)) = stream.advance().cloned() else {
                unreachable!("peeked an identifier");
            };
            Some(name)
        }
        _ => None,
    };
    stream.expect(Token::RParen)?;

    let body = stmt::parse_block_body(stream)?;

    Ok(OnHandler {
        event,
        param,
        body,
        span,
    })
}

/// Parse an `emit` statement.
///
/// The optional payload literal's `handlers:` key is separated out into the
/// declarative chain at parse time; the remaining properties, in source
/// order, form the payload.
pub(super) fn parse_emit(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let span = stream.expect(Token::Emit)?;
    let event = parse_event_name(stream)?;

    let mut payload = Vec::new();
    let mut chain = Vec::new();

    if stream.eat(&Token::LBrace) {
        let mut saw_chain = false;
        while !matches!(stream.peek(), Some(Token::RBrace)) {
            if stream.check(&Token::Handlers) && matches!(stream.peek_nth(1), Some(Token::Colon)) {
                let handlers_span = stream.current_span();
                stream.advance();
                stream.advance();
                if saw_chain {
                    return Err(ParseError::invalid_syntax(
                        "duplicate `handlers:` list in emit payload",
                        handlers_span,
                    ));
                }
                saw_chain = true;
                chain = parse_handler_chain(stream)?;
            } else {
                let key = parse_property_key(stream)?;
                stream.expect(Token::Colon)?;
                let value = parse_expr(stream)?;
                payload.push((key, value));
            }

            if !matches!(stream.peek(), Some(Token::RBrace)) {
                stream.expect(Token::Comma)?;
            }
        }
        stream.expect(Token::RBrace)?;
    }

    stream.expect(Token::Semicolon)?;

    Ok(Stmt::new(
        StmtKind::Emit(EmitStmt {
            event,
            payload,
            chain,
            span,
        }),
        span,
    ))
}

/// Parse the bracketed handler-chain list:
/// `[ event.name, event.name { extra: value } ]`.
fn parse_handler_chain(stream: &mut TokenStream) -> Result<Vec<HandlerItem>, ParseError> {
    stream.expect(Token::LBracket)?;

    let mut items = Vec::new();
    while !matches!(stream.peek(), Some(Token::RBracket)) {
        items.push(parse_handler_item(stream)?);
        if !matches!(stream.peek(), Some(Token::RBracket)) {
            stream.expect(Token::Comma)?;
        }
    }

    stream.expect(Token::RBracket)?;
    Ok(items)
}

/// Parse one chain item: an event name with an optional extra-payload
/// literal.
fn parse_handler_item(stream: &mut TokenStream) -> Result<HandlerItem, ParseError> {
    let span: Span = stream.current_span();
    let event = parse_event_name(stream)?;

    let extra = if stream.eat(&Token::LBrace) {
        let props = parse_object_props(stream)?;
        stream.expect(Token::RBrace)?;
        props
    } else {
        Vec::new()
    };

    Ok(HandlerItem { event, extra, span })
}
