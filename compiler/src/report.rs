// report.rs — Text and JSON reports of the escape classification
//
// Preconditions: `analysis` was computed over `lowered.graph`.
// Postconditions: deterministic output (graph order, sorted indices).
// Failure modes: none (pure formatting).
// Side effects: none.

use std::fmt::Write;

use serde::Serialize;

use crate::escape::{EscapeAnalysis, EscapeStats};
use crate::graph::Opcode;
use crate::lower::LoweredProgram;

/// Status word used in reports.
pub fn status(escaping: bool) -> &'static str {
    if escaping {
        "escaping"
    } else {
        "elidable"
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Human-readable report: summary line, then one line per StringConcat.
pub fn emit_text(lowered: &LoweredProgram, analysis: &EscapeAnalysis) -> String {
    let graph = &lowered.graph;
    let (escaping, elidable) = analysis.string_concats(graph);
    let concats = escaping.len() + elidable.len();
    let mut buf = String::new();
    writeln!(
        buf,
        "escape analysis: {} op{}, {} string concat{} ({} escaping, {} elidable)",
        graph.op_count(),
        plural(graph.op_count()),
        concats,
        plural(concats),
        escaping.len(),
        elidable.len()
    )
    .unwrap();

    let width = graph
        .operations()
        .filter(|(_, op)| op.is(&Opcode::StringConcat))
        .map(|(i, _)| lowered.display_name(i).len())
        .max()
        .unwrap_or(0);

    for block in graph.blocks() {
        for index in graph.operation_indices(block) {
            if !graph.get(index).is(&Opcode::StringConcat) {
                continue;
            }
            writeln!(
                buf,
                "  {:<width$}  {:<8}  [{}]",
                lowered.display_name(index),
                status(analysis.is_escaping(index)),
                lowered.block_name(block.index),
                width = width
            )
            .unwrap();
        }
    }
    buf
}

// ── JSON ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ConcatEntry {
    pub index: u32,
    pub name: Option<String>,
    pub block: String,
    pub escaping: bool,
}

/// Machine-readable report.
#[derive(Debug, Serialize)]
pub struct EscapeReport {
    pub ops: usize,
    pub blocks: usize,
    pub stats: EscapeStats,
    pub concats: Vec<ConcatEntry>,
    /// Every escaping operation, concat or not, in index order.
    pub escaping: Vec<u32>,
}

impl EscapeReport {
    pub fn build(lowered: &LoweredProgram, analysis: &EscapeAnalysis) -> Self {
        let graph = &lowered.graph;
        let mut concats = Vec::new();
        for block in graph.blocks() {
            for index in graph.operation_indices(block) {
                if graph.get(index).is(&Opcode::StringConcat) {
                    concats.push(ConcatEntry {
                        index: index.0,
                        name: lowered.op_names[index.index()].clone(),
                        block: lowered.block_name(block.index).to_string(),
                        escaping: analysis.is_escaping(index),
                    });
                }
            }
        }
        EscapeReport {
            ops: graph.op_count(),
            blocks: graph.block_count(),
            stats: *analysis.stats(),
            concats,
            escaping: analysis.escaping_ops().into_iter().map(|i| i.0).collect(),
        }
    }
}

/// Pretty-printed JSON report followed by a newline.
pub fn emit_json(lowered: &LoweredProgram, analysis: &EscapeAnalysis) -> serde_json::Result<String> {
    let mut json = serde_json::to_string_pretty(&EscapeReport::build(lowered, analysis))?;
    json.push('\n');
    Ok(json)
}

// ── Tests ───────────────────────────────────────────────────────────────────
