// AST node types for textual IR graphs.
//
// Operations and names carry a `SimpleSpan` for error reporting in lowering
// and verification.
//
// Preconditions: produced by the parser from a valid or partially-valid token stream.
// Postconditions: each span covers the source range of its construct.
// Failure modes: none (data-only module).
// Side effects: none.

use chumsky::span::SimpleSpan;

/// Byte-offset span (alias for chumsky's `SimpleSpan`).
pub type Span = SimpleSpan;

/// A complete IR listing: blocks in graph order.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub blocks: Vec<BlockDecl>,
}

/// `block IDENT 'loop'? '{' op* '}'`
#[derive(Debug, Clone, PartialEq)]
pub struct BlockDecl {
    pub name: Ident,
    pub is_loop: bool,
    pub ops: Vec<OpDecl>,
}

/// `(VALUE '=')? IDENT ('(' VALUE (',' VALUE)* ')')?`
#[derive(Debug, Clone, PartialEq)]
pub struct OpDecl {
    pub result: Option<Ident>,
    pub opcode: Ident,
    pub inputs: Vec<Ident>,
    pub span: Span,
}

/// A name with its span. Value names are stored without the `%` sigil.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}
