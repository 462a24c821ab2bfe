//! Hand-written recursive descent parser for the Cx event language.
//!
//! ## Architecture
//!
//! - `stream`: token stream wrapper with lookahead and span resolution
//! - `error`: parse errors and recovery
//! - `expr`: expression parser (precedence climbing + postfix loop)
//! - `stmt`: statement parsers (keyword-dispatched)
//! - `event`: event names, `on` handlers, `emit` + handler chains
//! - `token_utils`: canonical keyword-to-word mappings

mod error;
mod stream;

pub use error::{ParseError, ParseErrorKind};
use stream::TokenStream;

mod event;
mod expr;
mod stmt;
pub mod token_utils;

use cx_ast::{SourceFile, Stmt};
use cx_lexer::Token;
use std::ops::Range;

/// Parse a whole compilation unit into its top-level statements.
///
/// Never fails fast: on error, the parser records the diagnostic,
/// synchronizes to a statement boundary, and continues, so one call reports
/// every syntax error in the unit.
pub(crate) fn parse_unit(
    tokens: &[(Token, Range<usize>)],
    file: &SourceFile,
    file_id: u16,
) -> Result<Vec<Stmt>, Vec<ParseError>> {
    let mut stream = TokenStream::new(tokens, file, file_id);
    let mut body = Vec::new();
    let mut errors = Vec::new();

    while !stream.at_end() {
        let before = stream.current_pos();
        match stmt::parse_statement(&mut stream) {
            Ok(stmt) => body.push(stmt),
            Err(e) => {
                errors.push(e);
                stream.synchronize();
                // Recovery must always make progress; skip the offending
                // token if synchronization stalled on it.
                if stream.current_pos() == before {
                    stream.advance();
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(body)
    } else {
        Err(errors)
    }
}
