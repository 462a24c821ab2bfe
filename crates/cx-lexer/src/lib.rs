// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Lexical analysis for the Cx event language.
//!
//! Tokenization of Cx source code using logos.
//!
//! # Design
//!
//! - `Token` — all Cx token types (keywords, operators, literals, identifiers)
//! - Comments are stripped during lexing (not tokens)
//! - String literals are unescaped during lexing; an unknown escape is a
//!   `LexicalError::InvalidEscape` carried on the error token
//!
//! # Examples
//!
//! ```
//! # use cx_lexer::Token;
//! # use logos::Logos;
//! let source = "emit sensor.reading { value: 42 };";
//! let tokens: Vec<_> = Token::lexer(source).collect();
//! ```

use logos::Logos;

/// Lexical error attached to an unrecognized or malformed token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LexicalError {
    /// Input that matches no token rule.
    #[default]
    InvalidToken,
    /// String literal containing an escape outside the supported set.
    InvalidEscape,
    /// Numeric literal that overflows its representation.
    InvalidNumber,
}

impl std::fmt::Display for LexicalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexicalError::InvalidToken => write!(f, "invalid token"),
            LexicalError::InvalidEscape => write!(f, "invalid escape sequence in string literal"),
            LexicalError::InvalidNumber => write!(f, "numeric literal out of range"),
        }
    }
}

/// Cx token.
///
/// Represents all lexical elements of the Cx language: keywords, operators,
/// delimiters, literals, and identifiers.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(error = LexicalError)]
#[logos(skip r"[ \t\r\n]+")] // Skip whitespace
#[logos(skip r"//[^\n]*")] // Skip line comments
#[logos(skip r"/\*([^*]|\*[^/])*\*/")] // Skip block comments
pub enum Token {
    // === Keywords ===

    // Entities & events
    /// Keyword `conscious`
    #[token("conscious")]
    Conscious,
    /// Keyword `realize`
    #[token("realize")]
    Realize,
    /// Keyword `on`
    #[token("on")]
    On,
    /// Keyword `emit`
    #[token("emit")]
    Emit,
    /// Keyword `handlers`
    #[token("handlers")]
    Handlers,

    // Declarations
    /// Keyword `let`
    #[token("let")]
    Let,
    /// Keyword `function`
    #[token("function")]
    Function,
    /// Keyword `class`
    #[token("class")]
    Class,
    /// Keyword `new`
    #[token("new")]
    New,

    // Control flow
    /// Keyword `if`
    #[token("if")]
    If,
    /// Keyword `else`
    #[token("else")]
    Else,
    /// Keyword `while`
    #[token("while")]
    While,
    /// Keyword `for`
    #[token("for")]
    For,
    /// Keyword `break`
    #[token("break")]
    Break,
    /// Keyword `continue`
    #[token("continue")]
    Continue,
    /// Keyword `return`
    #[token("return")]
    Return,
    /// Keyword `try`
    #[token("try")]
    Try,
    /// Keyword `catch`
    #[token("catch")]
    Catch,
    /// Keyword `throw`
    #[token("throw")]
    Throw,

    // AI-capability verbs (statement-level; the runtime lowers them to events)
    /// Keyword `think`
    #[token("think")]
    Think,
    /// Keyword `learn`
    #[token("learn")]
    Learn,
    /// Keyword `generate`
    #[token("generate")]
    Generate,
    /// Keyword `embed`
    #[token("embed")]
    Embed,

    // Literal keywords
    /// Literal `true`
    #[token("true")]
    True,
    /// Literal `false`
    #[token("false")]
    False,
    /// Literal `null`
    #[token("null")]
    Null,

    // === Operators ===
    /// Operator `+`
    #[token("+")]
    Plus,
    /// Operator `-`
    #[token("-")]
    Minus,
    /// Operator `*`
    #[token("*")]
    Star,
    /// Operator `/`
    #[token("/")]
    Slash,
    /// Operator `%`
    #[token("%")]
    Percent,

    /// Operator `==`
    #[token("==")]
    EqEq,
    /// Operator `!=`
    #[token("!=")]
    BangEq,
    /// Operator `<`
    #[token("<")]
    Lt,
    /// Operator `<=`
    #[token("<=")]
    LtEq,
    /// Operator `>`
    #[token(">")]
    Gt,
    /// Operator `>=`
    #[token(">=")]
    GtEq,

    /// Operator `&&`
    #[token("&&")]
    AmpAmp,
    /// Operator `||`
    #[token("||")]
    PipePipe,
    /// Operator `!`
    #[token("!")]
    Bang,

    /// Operator `=`
    #[token("=")]
    Eq,
    /// Operator `:`
    #[token(":")]
    Colon,
    /// Operator `.`
    #[token(".")]
    Dot,
    /// Operator `,`
    #[token(",")]
    Comma,
    /// Operator `;`
    #[token(";")]
    Semicolon,

    // === Delimiters ===
    /// Delimiter `(`
    #[token("(")]
    LParen,
    /// Delimiter `)`
    #[token(")")]
    RParen,
    /// Delimiter `{`
    #[token("{")]
    LBrace,
    /// Delimiter `}`
    #[token("}")]
    RBrace,
    /// Delimiter `[`
    #[token("[")]
    LBracket,
    /// Delimiter `]`
    #[token("]")]
    RBracket,

    // === Literals ===
    /// Integer literal (no decimal point): `42`, `0`, `1000`
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().map_err(|_| LexicalError::InvalidNumber))]
    Integer(i64),

    /// Float literal (decimal point or exponent): `3.14`, `1.0`, `5e-3`
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().map_err(|_| LexicalError::InvalidNumber))]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().map_err(|_| LexicalError::InvalidNumber))]
    Float(f64),

    /// String literal, unescaped during lexing: `"hello\n"`
    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        unescape_string(&s[1..s.len() - 1]).ok_or(LexicalError::InvalidEscape)
    })]
    String(String),

    /// Identifier: `payload`, `sensor`, `my_var`
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_owned())]
    Ident(String),
}

/// Unescape a string literal's contents.
///
/// The supported set is total: `\n \r \t \\ \" \' \0`. Anything else
/// (including a trailing backslash) returns `None`.
fn unescape_string(s: &str) -> Option<String> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some('\'') => result.push('\''),
                Some('0') => result.push('\0'),
                _ => return None,
            }
        } else {
            result.push(c);
        }
    }
    Some(result)
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Conscious => write!(f, "conscious"),
            Token::Realize => write!(f, "realize"),
            Token::On => write!(f, "on"),
            Token::Emit => write!(f, "emit"),
            Token::Handlers => write!(f, "handlers"),
            Token::Let => write!(f, "let"),
            Token::Function => write!(f, "function"),
            Token::Class => write!(f, "class"),
            Token::New => write!(f, "new"),
            Token::If => write!(f, "if"),
            Token::Else => write!(f, "else"),
            Token::While => write!(f, "while"),
            Token::For => write!(f, "for"),
            Token::Break => write!(f, "break"),
            Token::Continue => write!(f, "continue"),
            Token::Return => write!(f, "return"),
            Token::Try => write!(f, "try"),
            Token::Catch => write!(f, "catch"),
            Token::Throw => write!(f, "throw"),
            Token::Think => write!(f, "think"),
            Token::Learn => write!(f, "learn"),
            Token::Generate => write!(f, "generate"),
            Token::Embed => write!(f, "embed"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Null => write!(f, "null"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::EqEq => write!(f, "=="),
            Token::BangEq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::LtEq => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::GtEq => write!(f, ">="),
            Token::AmpAmp => write!(f, "&&"),
            Token::PipePipe => write!(f, "||"),
            Token::Bang => write!(f, "!"),
            Token::Eq => write!(f, "="),
            Token::Colon => write!(f, ":"),
            Token::Dot => write!(f, "."),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Integer(n) => write!(f, "{}", n),
            Token::Float(x) => write!(f, "{}", x),
            Token::String(s) => write!(f, "\"{}\"", s),
            Token::Ident(id) => write!(f, "{}", id),
        }
    }
}

impl Token {
    /// The AI-capability verb name for this token, if it is one.
    pub fn ai_verb(&self) -> Option<&'static str> {
        match self {
            Token::Think => Some("think"),
            Token::Learn => Some("learn"),
            Token::Generate => Some("generate"),
            Token::Embed => Some("embed"),
            _ => None,
        }
    }
}
