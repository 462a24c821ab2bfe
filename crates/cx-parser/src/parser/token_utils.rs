//! Canonical keyword-to-string mappings.
//!
//! Several keywords are ordinary words (`think`, `handlers`, `on`) that may
//! legitimately appear where the grammar wants an identifier: event-name
//! parts, object-literal keys, member-access fields. This is the single
//! source of truth for treating those tokens as plain words.

use cx_lexer::Token;

/// Convert a word-like keyword token to its identifier string.
///
/// Returns `None` for operators, delimiters, and data-carrying tokens.
pub fn keyword_to_string(token: &Token) -> Option<String> {
    let s = match token {
        Token::Conscious => "conscious",
        Token::Realize => "realize",
        Token::On => "on",
        Token::Emit => "emit",
        Token::Handlers => "handlers",
        Token::New => "new",
        Token::Think => "think",
        Token::Learn => "learn",
        Token::Generate => "generate",
        Token::Embed => "embed",
        _ => return None,
    };
    Some(s.to_string())
}
