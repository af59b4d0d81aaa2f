// Parser for textual IR graphs (.cir files).
//
// Parses a token stream (from the lexer) into an AST of blocks and
// operations. Uses chumsky combinators.
//
// Grammar:
//   program := NL* (block (NL+ block)*)? NL*
//   block   := 'block' IDENT 'loop'? '{' NL* (op (NL+ op)*)? NL* '}'
//   op      := (VALUE '=')? IDENT ('(' (VALUE (',' VALUE)*)? ')')?
//
// Preconditions: input is a valid token stream from `lexer::lex()`.
// Postconditions: returns an AST plus any parse errors (non-fatal).
// Failure modes: syntax errors produce `Rich` diagnostics.
// Side effects: none.

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;
use chumsky::span::SimpleSpan;

use crate::ast::*;
use crate::lexer::Token;

/// Result of parsing: AST plus any errors.
#[derive(Debug)]
pub struct ParseResult {
    pub program: Option<Program>,
    pub errors: Vec<Rich<'static, Token, SimpleSpan>>,
}

/// Parse an IR source string. Lexes then parses.
///
/// Returns an AST (if parsing succeeded) plus any errors.
pub fn parse(source: &str) -> ParseResult {
    let lex_result = crate::lexer::lex(source);
    let len = source.len();

    // Convert lexer output to chumsky stream.
    let token_iter = lex_result.tokens.into_iter().map(|(tok, span)| {
        let cspan: SimpleSpan = (span.start..span.end).into();
        (tok, cspan)
    });
    let eoi: SimpleSpan = (len..len).into();
    let stream = Stream::from_iter(token_iter).map(eoi, |(t, s): (_, _)| (t, s));

    let parser = program_parser(source);
    let (program, parse_errors) = parser.parse(stream).into_output_errors();

    // Merge lex errors + parse errors.
    let mut all_errors: Vec<Rich<'static, Token, SimpleSpan>> = lex_result
        .errors
        .into_iter()
        .map(|e| {
            let span: SimpleSpan = (e.span.start..e.span.end).into();
            Rich::custom(span, e.message)
        })
        .collect();
    all_errors.extend(parse_errors.into_iter().map(|e| e.into_owned()));

    ParseResult {
        program,
        errors: all_errors,
    }
}

// ── Main parser builder ──
//
// All rules are built inside `program_parser` so that the `source` reference
// is captured once and shared by all combinators.

fn program_parser<'tokens, 'src: 'tokens, I>(
    source: &'src str,
) -> impl Parser<'tokens, I, Program, extra::Err<Rich<'tokens, Token, SimpleSpan>>> + 'src
where
    'tokens: 'src,
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    let nl = just(Token::Newline).repeated().ignored();

    let ident = just(Token::Ident).map_with(move |_, e| {
        let span: SimpleSpan = e.span();
        Ident {
            name: source[span.start()..span.end()].to_string(),
            span,
        }
    });

    let value = select! {
        Token::Value(name) = e => Ident { name, span: e.span() },
    };

    // ── Operation ──

    let inputs = value
        .clone()
        .separated_by(just(Token::Comma))
        .collect::<Vec<_>>()
        .delimited_by(just(Token::LParen), just(Token::RParen));

    let op = value
        .then_ignore(just(Token::Equals))
        .or_not()
        .then(ident.clone())
        .then(inputs.or_not())
        .map_with(|((result, opcode), inputs), e| OpDecl {
            result,
            opcode,
            inputs: inputs.unwrap_or_default(),
            span: e.span(),
        });

    let body = nl
        .clone()
        .ignore_then(
            op.separated_by(just(Token::Newline).repeated().at_least(1))
                .allow_trailing()
                .collect::<Vec<_>>(),
        )
        .then_ignore(nl.clone());

    // ── Block ──

    let block = just(Token::Block)
        .ignore_then(ident)
        .then(just(Token::Loop).or_not().map(|l| l.is_some()))
        .then(body.delimited_by(just(Token::LBrace), just(Token::RBrace)))
        .map(|((name, is_loop), ops)| BlockDecl { name, is_loop, ops });

    // ── Program ──

    nl.clone()
        .ignore_then(
            block
                .separated_by(just(Token::Newline).repeated().at_least(1))
                .allow_trailing()
                .collect::<Vec<_>>(),
        )
        .then_ignore(nl)
        .map(|blocks| Program { blocks })
}

// ── Tests ──
