// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Front-end entry point for the Cx event language.
//!
//! [`parse`] takes raw source text and an optional logical file name and
//! returns either a [`Program`] or a batched, ordered list of structured
//! diagnostics. It performs no I/O.
//!
//! Error policy: all detectable lexical and syntax errors in a unit are
//! collected and returned together — a unit that fails to parse yields no
//! partial program, so nothing half-parsed ever executes.
//!
//! # Examples
//!
//! ```
//! let program = cx_parser::parse("emit boot.done {};", Some("boot.cx")).unwrap();
//! assert_eq!(program.body.len(), 1);
//! ```

mod parser;

pub use parser::{ParseError, ParseErrorKind};

use cx_ast::{Program, SourceFile};
use cx_lexer::Token;
use logos::Logos;

/// A reported front-end problem with its source position.
///
/// Lines and columns are 1-based. Diagnostics are ordered by position, so
/// tooling can render one report for the whole unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based line number
    pub line: u32,
    /// 1-based column number
    pub column: u32,
    /// Human-readable message
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

/// Parse Cx source text into a program.
///
/// Returns every lexical and syntax error together; parsing continues past
/// errors so a single call reports all problems in the unit.
pub fn parse(source: &str, file_name: Option<&str>) -> Result<Program, Vec<Diagnostic>> {
    let file = SourceFile::new(file_name.unwrap_or("<input>"), source);

    let mut tokens = Vec::new();
    let mut diagnostics = Vec::new();

    for (result, range) in Token::lexer(source).spanned() {
        match result {
            Ok(token) => tokens.push((token, range)),
            Err(lex_error) => {
                let (line, column) = file.line_col(range.start as u32);
                let snippet = &source[range.clone()];
                diagnostics.push(Diagnostic {
                    line,
                    column,
                    message: format!("{}: `{}`", lex_error, snippet),
                });
            }
        }
    }

    let body = match parser::parse_unit(&tokens, &file, 0) {
        Ok(body) => Some(body),
        Err(errors) => {
            diagnostics.extend(errors.into_iter().map(|e| Diagnostic {
                line: e.span.line,
                column: e.span.column,
                message: e.message,
            }));
            None
        }
    };

    if diagnostics.is_empty() {
        Ok(Program {
            file_name: file_name.map(String::from),
            // Parse succeeded with no lexical errors, so the body is present.
            body: body.unwrap_or_default(),
        })
    } else {
        diagnostics.sort_by_key(|d| (d.line, d.column));
        Err(diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_returns_program() {
        let program = parse("let x = 1;", None).unwrap();
        assert_eq!(program.body.len(), 1);
        assert_eq!(program.file_name, None);
    }

    #[test]
    fn file_name_is_threaded() {
        let program = parse("emit a.b {};", Some("unit.cx")).unwrap();
        assert_eq!(program.file_name.as_deref(), Some("unit.cx"));
    }

    #[test]
    fn lexical_and_syntax_errors_batch_together() {
        // `@` is a lexical error; `let 5` is a syntax error on line 2.
        let source = "let x = @;\nlet 5 = 1;";
        let errors = parse(source, None).unwrap_err();
        assert!(errors.len() >= 2);
        assert!(errors.windows(2).all(|w| (w[0].line, w[0].column) <= (w[1].line, w[1].column)));
    }

    #[test]
    fn failed_parse_yields_no_program() {
        assert!(parse("emit ;", None).is_err());
    }
}
