//! Token stream wrapper for the hand-written parser.

use cx_ast::{SourceFile, Span};
use cx_lexer::Token;
use std::ops::Range;

/// Token stream with lookahead and position tracking.
///
/// Each token is paired with its byte range in the source; the stream
/// resolves byte offsets to line/column spans through the [`SourceFile`]'s
/// line index, so every AST node and diagnostic carries human-readable
/// coordinates.
pub struct TokenStream<'src> {
    tokens: &'src [(Token, Range<usize>)],
    file: &'src SourceFile,
    file_id: u16,
    pos: usize,
}

impl<'src> TokenStream<'src> {
    /// Create a new token stream.
    pub fn new(
        tokens: &'src [(Token, Range<usize>)],
        file: &'src SourceFile,
        file_id: u16,
    ) -> Self {
        Self {
            tokens,
            file,
            file_id,
            pos: 0,
        }
    }

    /// Peek at the current token without consuming it.
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(tok, _)| tok)
    }

    /// Peek at the nth token ahead without consuming.
    pub fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|(tok, _)| tok)
    }

    /// Advance to the next token and return the consumed one.
    pub fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos).map(|(tok, _)| tok);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Check whether the current token matches the expected token kind.
    ///
    /// Data-carrying tokens compare by discriminant, so `check(&Token::Ident
    /// (String::new()))` matches any identifier.
    pub fn check(&self, expected: &Token) -> bool {
        matches!(self.peek(), Some(t) if std::mem::discriminant(t) == std::mem::discriminant(expected))
    }

    /// Expect a specific token and advance past it.
    pub fn expect(&mut self, expected: Token) -> Result<Span, super::ParseError> {
        if self.check(&expected) {
            let span = self.current_span();
            self.advance();
            Ok(span)
        } else {
            Err(super::ParseError::expected_token(
                &expected,
                self.peek(),
                self.current_span(),
            ))
        }
    }

    /// Consume the current token if it matches, returning whether it did.
    pub fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Check if the end of the token stream has been reached.
    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Get the current position in the token stream.
    pub fn current_pos(&self) -> usize {
        self.pos
    }

    /// Get the span of the current token, or of EOF if exhausted.
    pub fn current_span(&self) -> Span {
        if let Some((_, range)) = self.tokens.get(self.pos) {
            self.file.span_at(self.file_id, range.start as u32)
        } else if let Some((_, range)) = self.tokens.last() {
            self.file.span_at(self.file_id, range.end as u32)
        } else {
            Span::start_of(self.file_id)
        }
    }

    /// Synchronize to the next statement boundary for error recovery.
    ///
    /// Skips tokens until just past a `;`, or until a token that can start a
    /// statement (or close a block) is next.
    pub fn synchronize(&mut self) {
        while let Some(token) = self.peek() {
            match token {
                Token::Semicolon => {
                    self.advance();
                    return;
                }
                Token::RBrace
                | Token::Conscious
                | Token::Function
                | Token::Class
                | Token::Let
                | Token::On
                | Token::Emit
                | Token::If
                | Token::While
                | Token::For
                | Token::Try
                | Token::Throw
                | Token::Return => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}
