// dot.rs — Graphviz DOT output for IR graphs
//
// Transforms a LoweredProgram (optionally with its escape classification)
// into DOT format suitable for rendering with `dot` or other Graphviz layout
// engines. One cluster per block; edges run from input to consumer.
//
// Preconditions: `lowered` is a lowered program; `escape`, when given, was
//                computed over `lowered.graph`.
// Postconditions: returns a valid DOT string representing the graph.
// Failure modes: none (pure string formatting).
// Side effects: none.

use std::fmt::Write;

use crate::escape::EscapeAnalysis;
use crate::graph::{Opcode, Operation};
use crate::id::OpIndex;
use crate::lower::LoweredProgram;

/// Emit the graph as a Graphviz DOT string.
///
/// StringConcat nodes are colored by escape status when `escape` is given.
/// References to later operations (loop back-edges) are drawn dashed.
pub fn emit_dot(lowered: &LoweredProgram, escape: Option<&EscapeAnalysis>) -> String {
    let graph = &lowered.graph;
    let mut buf = String::new();
    writeln!(buf, "digraph cir {{").unwrap();
    writeln!(buf, "    rankdir=TB;").unwrap();
    writeln!(buf, "    node [fontname=\"Helvetica\", fontsize=10];").unwrap();
    writeln!(buf, "    edge [fontname=\"Helvetica\", fontsize=9];").unwrap();

    for block in graph.blocks() {
        let name = lowered.block_name(block.index);
        let kind = if block.is_loop() { " (loop)" } else { "" };
        writeln!(buf).unwrap();
        writeln!(buf, "    subgraph cluster_b{} {{", block.index.0).unwrap();
        writeln!(buf, "        label=\"block: {}{}\";", name, kind).unwrap();
        writeln!(buf, "        style=rounded;").unwrap();
        writeln!(
            buf,
            "        color={};",
            if block.is_loop() { "blue" } else { "gray50" }
        )
        .unwrap();
        for index in graph.operation_indices(block) {
            let attrs = node_attrs(lowered, index, graph.get(index), escape);
            writeln!(buf, "        n{} [{}];", index.0, attrs).unwrap();
        }
        writeln!(buf, "    }}").unwrap();
    }

    // Edges (outside any cluster)
    if graph.op_count() > 0 {
        writeln!(buf).unwrap();
    }
    for (index, op) in graph.operations() {
        for &input in op.inputs() {
            if input >= index {
                writeln!(
                    buf,
                    "    n{} -> n{} [style=dashed, color=blue, constraint=false];",
                    input.0, index.0
                )
                .unwrap();
            } else {
                writeln!(buf, "    n{} -> n{};", input.0, index.0).unwrap();
            }
        }
    }

    writeln!(buf, "}}").unwrap();
    buf
}

// ── Helpers ─────────────────────────────────────────────────────────────────

/// Return DOT attributes string for an operation.
fn node_attrs(
    lowered: &LoweredProgram,
    index: OpIndex,
    op: &Operation,
    escape: Option<&EscapeAnalysis>,
) -> String {
    let (shape, color) = match (&op.opcode, escape) {
        (Opcode::StringConcat, Some(e)) if e.is_escaping(index) => ("box", "salmon"),
        (Opcode::StringConcat, Some(_)) => ("box", "palegreen"),
        (Opcode::StringConcat, None) => ("box", "lightyellow"),
        (Opcode::FrameState, _) => ("note", "gray90"),
        (Opcode::Phi, _) => ("diamond", "lightblue"),
        _ => ("ellipse", "white"),
    };
    let label = if lowered.op_names[index.index()].is_some() {
        format!("{}\\n{}", lowered.display_name(index), op.opcode)
    } else {
        op.opcode.to_string()
    };
    format!("shape={shape}, style=filled, fillcolor={color}, label=\"{label}\"")
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn lowered(source: &str) -> LoweredProgram {
        let program = crate::parser::parse(source).program.expect("parse failed");
        crate::lower::lower(&program).lowered
    }

    const LOOP: &str = "block entry {
  %s = Parameter
  %n = StringLength(%s)
}
block body loop {
  %acc = Phi(%s, %next)
  %next = StringConcat(%n, %acc, %s)
  Return(%acc)
}
";

    #[test]
    fn clusters_and_edges() {
        let lowered = lowered(LOOP);
        let dot = emit_dot(&lowered, None);
        assert!(dot.starts_with("digraph cir {\n"));
        assert!(dot.ends_with("}\n"));
        assert!(dot.contains("subgraph cluster_b0 {"));
        assert!(dot.contains("label=\"block: body (loop)\";"));
        assert!(dot.contains("    n0 -> n1;"));
        assert!(dot.contains("    n3 -> n2 [style=dashed, color=blue, constraint=false];"));
        assert!(dot.contains("fillcolor=lightyellow, label=\"%next\\nStringConcat\""));
        assert!(dot.contains("label=\"Return\""));
    }

    #[test]
    fn concats_colored_by_status() {
        let lowered = lowered(LOOP);
        let analysis = crate::escape::analyze(&lowered.graph);
        let dot = emit_dot(&lowered, Some(&analysis));
        assert!(dot.contains("n3 [shape=box, style=filled, fillcolor=salmon"));
    }

    #[test]
    fn elidable_concat_is_green() {
        let lowered = lowered("block b {\n  %s = Parameter\n  %c = StringConcat(%s, %s, %s)\n  StringLength(%c)\n}");
        let analysis = crate::escape::analyze(&lowered.graph);
        let dot = emit_dot(&lowered, Some(&analysis));
        assert!(dot.contains("n1 [shape=box, style=filled, fillcolor=palegreen"));
    }
}
