//! Tokenizer for CommonJS source text.
//!
//! Built on logos, following the same shape as any hand-tuned scanning
//! lexer: trivia (whitespace, comments, template literals) is skipped via
//! callbacks, strings are captured with a light unescape, and every
//! character the export patterns do not care about collapses into
//! [`Token::Other`]. The matcher in [`crate::parse`] only ever needs
//! identifiers, strings, and a handful of punctuators.

use logos::Logos;

/// Logos-based token enum used internally for scanning.
#[derive(Logos, Debug, Clone, PartialEq)]
enum RawToken {
    // Whitespace (skip); BOM included since module files may carry one
    #[regex(r"[ \t\r\n\u{feff}]+", logos::skip)]
    Whitespace,

    // Comments (skip)
    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    #[regex(r"/\*", lex_block_comment)]
    BlockComment,

    // Template literals are opaque to export analysis; consume them whole
    #[token("`", lex_template)]
    Template,

    #[regex(r#""(?:[^"\\\n]|\\[^\n])*""#, lex_string)]
    #[regex(r#"'(?:[^'\\\n]|\\[^\n])*'"#, lex_string)]
    Str(String),

    #[regex(r"[\p{XID_Start}$_][\p{XID_Continue}$]*", |lex| lex.slice().to_owned())]
    Ident(String),

    // Numbers are consumed so their digits never masquerade as identifiers
    #[regex(r"[0-9][0-9A-Za-z_.]*")]
    Number,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(".")]
    Dot,

    #[token("...")]
    Ellipsis,

    #[token(",")]
    Comma,

    #[token(":")]
    Colon,

    #[token(";")]
    Semi,

    // Longer operators carrying `=` must win over plain assignment
    #[token("===")]
    #[token("==")]
    #[token("=>")]
    #[token("<=")]
    #[token(">=")]
    #[token("!==")]
    #[token("!=")]
    #[token("+=")]
    #[token("-=")]
    #[token("*=")]
    #[token("/=")]
    #[token("%=")]
    #[token("&&=")]
    #[token("||=")]
    #[token("??=")]
    NonAssignOperator,

    #[token("=")]
    Assign,
}

// Helper parsing functions
fn lex_block_comment(lex: &mut logos::Lexer<RawToken>) -> logos::Skip {
    // We've already consumed "/*", now find "*/"
    let remainder = lex.remainder();

    if let Some(end) = remainder.find("*/") {
        lex.bump(end + 2);
    } else {
        // Unterminated comment - consume to end
        lex.bump(remainder.len());
    }

    logos::Skip
}

/// Consume a template literal, tracking `${ ... }` substitution nesting so a
/// backtick inside a substitution does not end the template early.
fn lex_template(lex: &mut logos::Lexer<RawToken>) -> logos::Skip {
    let remainder = lex.remainder();
    let bytes = remainder.as_bytes();
    let mut brace_depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'$' if brace_depth == 0 && bytes.get(i + 1) == Some(&b'{') => {
                brace_depth = 1;
                i += 1;
            }
            b'{' if brace_depth > 0 => brace_depth += 1,
            b'}' if brace_depth > 0 => brace_depth -= 1,
            b'`' if brace_depth == 0 => {
                lex.bump(i + 1);
                return logos::Skip;
            }
            _ => {}
        }
        i += 1;
    }

    // Unterminated template - consume to end
    lex.bump(remainder.len());
    logos::Skip
}

fn lex_string(lex: &mut logos::Lexer<RawToken>) -> Option<String> {
    let s = lex.slice();
    let inner = &s[1..s.len() - 1]; // Remove quotes
    Some(unescape_string(inner))
}

fn unescape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('0') => result.push('\0'),
                Some(c) => result.push(c),
                None => break,
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Token stream consumed by the export-pattern matcher.
///
/// Anything the patterns never inspect (operators, numbers, unknown
/// characters) is flattened to [`Token::Other`] so it still occupies a
/// position in the stream and keeps adjacency checks honest.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifier or keyword.
    Ident(String),
    /// Single- or double-quoted string literal, unescaped.
    Str(String),
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `;`
    Semi,
    /// `=` (plain assignment only; compound/comparison operators are `Other`)
    Assign,
    /// Any other token.
    Other,
}

/// Tokenize CommonJS source text.
///
/// Never fails: input the scanner cannot make sense of (regex literals,
/// stray operators, malformed escapes) degrades to [`Token::Other`].
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();

    for result in RawToken::lexer(source) {
        let token = match result {
            Ok(RawToken::Ident(name)) => Token::Ident(name),
            Ok(RawToken::Str(value)) => Token::Str(value),
            Ok(RawToken::LParen) => Token::LParen,
            Ok(RawToken::RParen) => Token::RParen,
            Ok(RawToken::LBrace) => Token::LBrace,
            Ok(RawToken::RBrace) => Token::RBrace,
            Ok(RawToken::LBracket) => Token::LBracket,
            Ok(RawToken::RBracket) => Token::RBracket,
            Ok(RawToken::Dot) => Token::Dot,
            Ok(RawToken::Comma) => Token::Comma,
            Ok(RawToken::Colon) => Token::Colon,
            Ok(RawToken::Semi) => Token::Semi,
            Ok(RawToken::Assign) => Token::Assign,
            Ok(
                RawToken::Number
                | RawToken::Ellipsis
                | RawToken::NonAssignOperator
                | RawToken::Whitespace
                | RawToken::LineComment
                | RawToken::BlockComment
                | RawToken::Template,
            ) => Token::Other,
            Err(()) => Token::Other,
        };
        tokens.push(token);
    }

    tokens
}
