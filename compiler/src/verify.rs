// verify.rs — Structural checks on a lowered graph before escape analysis
//
// Checks operand counts for the operation kinds the analysis gives special
// meaning to, and flags forward references that do not come from a loop
// phi. Forward references are the one ordering hazard the analysis repairs
// after its sweep; anywhere else they indicate a malformed listing.
//
// Preconditions: `lowered` comes from `lower::lower`.
// Postconditions: returns all structural diagnostics (errors and warnings).
// Failure modes: arity violations → errors; stray forward references → warnings.
// Side effects: none.

use crate::diag::codes;
use crate::diag::{DiagLevel, Diagnostic};
use crate::graph::Opcode;
use crate::lower::LoweredProgram;

/// Verify the shape of every operation in `lowered`.
pub fn verify(lowered: &LoweredProgram) -> Vec<Diagnostic> {
    let graph = &lowered.graph;
    let mut diagnostics = Vec::new();

    for block in graph.blocks() {
        for index in graph.operation_indices(block) {
            let op = graph.get(index);
            let span = lowered.op_span(index);
            let name = lowered.display_name(index);
            let arity = op.inputs().len();

            match op.opcode {
                Opcode::StringConcat if arity != 3 => diagnostics.push(
                    Diagnostic::new(
                        DiagLevel::Error,
                        span,
                        format!("StringConcat {} has {} inputs, expected 3", name, arity),
                    )
                    .with_code(codes::E0200)
                    .with_hint("StringConcat takes (length, left, right)"),
                ),
                Opcode::StringLength if arity != 1 => diagnostics.push(
                    Diagnostic::new(
                        DiagLevel::Error,
                        span,
                        format!("StringLength {} has {} inputs, expected 1", name, arity),
                    )
                    .with_code(codes::E0201),
                ),
                Opcode::Parameter | Opcode::Constant if arity != 0 => diagnostics.push(
                    Diagnostic::new(
                        DiagLevel::Error,
                        span,
                        format!("{} {} takes no inputs, found {}", op.opcode, name, arity),
                    )
                    .with_code(codes::E0202),
                ),
                _ => {}
            }

            let loop_phi = block.is_loop() && op.is(&Opcode::Phi);
            if loop_phi {
                continue;
            }
            for &input in op.inputs() {
                if input >= index {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagLevel::Warning,
                            span,
                            format!(
                                "{} uses {} before its definition",
                                name,
                                lowered.display_name(input)
                            ),
                        )
                        .with_code(codes::W0200)
                        .with_hint("only phis in a `loop` block may reference later values")
                        .with_related(lowered.op_span(input), "defined here"),
                    );
                }
            }
        }
    }

    diagnostics
}

// ── Tests ───────────────────────────────────────────────────────────────────
