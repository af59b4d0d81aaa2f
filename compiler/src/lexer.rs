// Lexer for textual IR graphs (.cir files).
//
// Tokenizes the block/operation listing consumed by the parser. Uses the
// `logos` crate for DFA-based lexing.
//
// `block` and `loop` are reserved: they always lex as keywords, so neither
// can be used as a block name or an opcode spelling. Longer identifiers that
// merely start with them (`blocks`, `looped`) are ordinary identifiers.
//
// Preconditions: input is valid UTF-8.
// Postconditions: returns all tokens with byte-offset spans, plus any lex errors.
// Failure modes: unrecognized characters produce `LexError`; lexing continues.
// Side effects: none.

use logos::Logos;
use std::fmt;

/// Byte-offset span in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// A lexer error with location.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub span: Span,
    pub message: String,
}

/// Result of lexing: tokens plus any errors (non-fatal).
#[derive(Debug)]
pub struct LexResult {
    pub tokens: Vec<(Token, Span)>,
    pub errors: Vec<LexError>,
}

/// IR token types.
///
/// Identifiers carry no value; use the span to retrieve the text from the
/// source. Value references (`%name`) carry the name without the sigil.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+|#[^\n]*")]
pub enum Token {
    // ── Keywords ──
    #[token("block")]
    Block,
    #[token("loop")]
    Loop,

    // ── Symbols ──
    #[token("=")]
    Equals,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,

    /// Value reference: `%name`.
    #[regex(r"%[a-zA-Z0-9_.]+", parse_value)]
    Value(String),

    /// Identifier: `[a-zA-Z_][a-zA-Z0-9_]*` (opcode and block names).
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    /// One or more newlines (operation terminator).
    #[regex(r"\n+")]
    Newline,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Block => write!(f, "block"),
            Token::Loop => write!(f, "loop"),
            Token::Equals => write!(f, "="),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Comma => write!(f, ","),
            Token::Value(name) => write!(f, "%{name}"),
            Token::Ident => write!(f, "<ident>"),
            Token::Newline => write!(f, "<newline>"),
        }
    }
}

fn parse_value(lex: &mut logos::Lexer<'_, Token>) -> String {
    lex.slice()[1..].to_string()
}

// ── Public API ──

/// Lex an IR source string into tokens.
///
/// Lexing is non-fatal: errors are collected and the lexer continues past
/// bad characters.
pub fn lex(source: &str) -> LexResult {
    let lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    for (result, range) in lexer.spanned() {
        let span = Span {
            start: range.start,
            end: range.end,
        };
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => errors.push(LexError {
                span,
                message: format!("unexpected character: {:?}", &source[span.start..span.end]),
            }),
        }
    }

    LexResult { tokens, errors }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        let result = lex(source);
        assert!(result.errors.is_empty(), "lex errors: {:?}", result.errors);
        result.tokens.into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn keywords_and_symbols() {
        assert_eq!(
            kinds("block b loop { }"),
            vec![
                Token::Block,
                Token::Ident,
                Token::Loop,
                Token::LBrace,
                Token::RBrace
            ]
        );
    }

    #[test]
    fn operation_line() {
        assert_eq!(
            kinds("%c = StringConcat(%n, %a, %b)\n"),
            vec![
                Token::Value("c".into()),
                Token::Equals,
                Token::Ident,
                Token::LParen,
                Token::Value("n".into()),
                Token::Comma,
                Token::Value("a".into()),
                Token::Comma,
                Token::Value("b".into()),
                Token::RParen,
                Token::Newline,
            ]
        );
    }

    #[test]
    fn numeric_value_names() {
        assert_eq!(kinds("%0 %1.a"), vec![Token::Value("0".into()), Token::Value("1.a".into())]);
    }

    #[test]
    fn comments_and_blank_lines() {
        assert_eq!(
            kinds("# header\n\n\nReturn # trailing\r\n"),
            vec![Token::Newline, Token::Ident, Token::Newline]
        );
    }

    #[test]
    fn keyword_prefix_is_identifier() {
        assert_eq!(kinds("blocks looped"), vec![Token::Ident, Token::Ident]);
    }

    #[test]
    fn unexpected_character_is_reported() {
        let result = lex("Return(%a) ;");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].span, Span { start: 11, end: 12 });
        assert_eq!(result.tokens.len(), 4);
    }

    #[test]
    fn spans_are_byte_offsets() {
        let result = lex("block entry");
        assert_eq!(result.tokens[1].1, Span { start: 6, end: 11 });
    }
}
