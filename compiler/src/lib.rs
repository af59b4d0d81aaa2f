// cea — Concat Escape Analyzer
//
// Library root. Front end (lexer, parser, lower) builds an IR graph from a
// textual listing; `escape` classifies every StringConcat as escaping or
// elidable; `report` and `dot` render the result.

pub mod ast;
pub mod diag;
pub mod dot;
pub mod escape;
pub mod graph;
pub mod id;
pub mod lexer;
pub mod logging;
pub mod lower;
pub mod parser;
pub mod pass;
pub mod pipeline;
pub mod report;
pub mod verify;
