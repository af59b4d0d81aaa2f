// lower.rs — Lowering from the IR AST to a `Graph`
//
// Assigns dense operation indices in textual order, resolves `%name`
// references (forward references included, so loop phis can name operands
// defined later), and records a source map from indices back to names and
// spans for diagnostics and reports.
//
// Preconditions: `program` is a parsed AST.
// Postconditions: `LowerResult.lowered.graph` is a finished graph whose
//                 inputs are all in range; unresolved inputs are dropped and
//                 reported as errors.
// Failure modes: duplicate value / block names, undefined values →
//                `Diagnostic` errors.
// Side effects: none.

use std::collections::HashMap;
use std::fmt;

use crate::ast::*;
use crate::diag::codes;
use crate::diag::{DiagLevel, Diagnostic};
use crate::graph::{BlockKind, Graph, GraphBuilder, Opcode};
use crate::id::{BlockIndex, OpIndex};

// ── Public types ────────────────────────────────────────────────────────────

/// A graph plus the source map that produced it.
#[derive(Debug, Clone)]
pub struct LoweredProgram {
    pub graph: Graph,
    /// Result name per operation (`None` for unnamed operations).
    pub op_names: Vec<Option<String>>,
    pub op_spans: Vec<Span>,
    pub block_names: Vec<String>,
}

impl LoweredProgram {
    /// `%name` when the operation is named, otherwise its index (`#n`).
    pub fn display_name(&self, op: OpIndex) -> String {
        match self.op_names.get(op.index()).and_then(|n| n.as_deref()) {
            Some(name) => format!("%{}", name),
            None => op.to_string(),
        }
    }

    pub fn block_name(&self, block: BlockIndex) -> &str {
        &self.block_names[block.index()]
    }

    pub fn op_span(&self, op: OpIndex) -> Span {
        self.op_spans[op.index()]
    }

    /// Look up an operation by its result name.
    pub fn find(&self, name: &str) -> Option<OpIndex> {
        self.op_names
            .iter()
            .position(|n| n.as_deref() == Some(name))
            .map(|i| OpIndex(i as u32))
    }
}

/// Result of lowering.
#[derive(Debug)]
pub struct LowerResult {
    pub lowered: LoweredProgram,
    pub diagnostics: Vec<Diagnostic>,
}

// ── Public entry point ──────────────────────────────────────────────────────

/// Lower a parsed IR program into a graph.
pub fn lower(program: &Program) -> LowerResult {
    let mut diagnostics = Vec::new();
    let names = collect_names(program, &mut diagnostics);

    let mut builder = GraphBuilder::new();
    let mut op_names = Vec::new();
    let mut op_spans = Vec::new();
    let mut block_names = Vec::with_capacity(program.blocks.len());

    for block in &program.blocks {
        let kind = if block.is_loop {
            BlockKind::Loop
        } else {
            BlockKind::Plain
        };
        builder.begin_block(kind);
        block_names.push(block.name.name.clone());

        for op in &block.ops {
            let mut inputs = Vec::with_capacity(op.inputs.len());
            for input in &op.inputs {
                match names.get(input.name.as_str()) {
                    Some(&(index, _)) => inputs.push(index),
                    None => diagnostics.push(
                        Diagnostic::new(
                            DiagLevel::Error,
                            input.span,
                            format!("undefined value `%{}`", input.name),
                        )
                        .with_code(codes::E0101),
                    ),
                }
            }
            builder.push(Opcode::from_name(&op.opcode.name), inputs);
            op_names.push(op.result.as_ref().map(|r| r.name.clone()));
            op_spans.push(op.span);
        }
    }

    // Inputs only name indices collected above, all of which were pushed.
    let graph = builder.finish().unwrap_or_default();

    LowerResult {
        lowered: LoweredProgram {
            graph,
            op_names,
            op_spans,
            block_names,
        },
        diagnostics,
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

/// First pass: map every value name to its future index, reporting
/// duplicate value and block names.
fn collect_names<'p>(
    program: &'p Program,
    diagnostics: &mut Vec<Diagnostic>,
) -> HashMap<&'p str, (OpIndex, Span)> {
    let mut names: HashMap<&str, (OpIndex, Span)> = HashMap::new();
    let mut blocks: HashMap<&str, Span> = HashMap::new();
    let mut next = 0u32;

    for block in &program.blocks {
        if let Some(&first) = blocks.get(block.name.name.as_str()) {
            diagnostics.push(
                Diagnostic::new(
                    DiagLevel::Error,
                    block.name.span,
                    format!("duplicate block name `{}`", block.name.name),
                )
                .with_code(codes::E0102)
                .with_related(first, "first defined here"),
            );
        } else {
            blocks.insert(block.name.name.as_str(), block.name.span);
        }

        for op in &block.ops {
            let index = OpIndex(next);
            next += 1;
            let Some(result) = &op.result else {
                continue;
            };
            if let Some(&(_, first)) = names.get(result.name.as_str()) {
                diagnostics.push(
                    Diagnostic::new(
                        DiagLevel::Error,
                        result.span,
                        format!("duplicate value `%{}`", result.name),
                    )
                    .with_code(codes::E0100)
                    .with_hint("every value is defined exactly once")
                    .with_related(first, "first defined here"),
                );
            } else {
                names.insert(result.name.as_str(), (index, result.span));
            }
        }
    }

    names
}

// ── Display ─────────────────────────────────────────────────────────────────

impl fmt::Display for LoweredProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in self.graph.blocks() {
            let suffix = if block.is_loop() { " loop" } else { "" };
            writeln!(f, "block {}{} {{", self.block_name(block.index), suffix)?;
            for index in self.graph.operation_indices(block) {
                let op = self.graph.get(index);
                write!(f, "  ")?;
                if self.op_names[index.index()].is_some() {
                    write!(f, "{} = ", self.display_name(index))?;
                }
                write!(f, "{}", op.opcode)?;
                if !op.inputs().is_empty() {
                    let args: Vec<String> =
                        op.inputs().iter().map(|&i| self.display_name(i)).collect();
                    write!(f, "({})", args.join(", "))?;
                }
                writeln!(f)?;
            }
            writeln!(f, "}}")?;
        }
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
