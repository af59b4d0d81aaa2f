// Property-based tests for escape analysis invariants.
//
// Four categories:
// 1. Determinism: re-running on the same graph gives the same flags
// 2. Agreement with a naive iterate-to-fixed-point oracle: equal on graphs
//    without forward references, a subset of it otherwise
// 3. Concat closure: a concat input of an escaping concat always escapes
// 4. Transparency and monotonicity under appended consumers
//
// Uses proptest with explicit configuration to prevent CI flakiness.

use cea::escape::analyze;
use cea::graph::{BlockKind, Graph, GraphBuilder, Opcode};
use cea::id::OpIndex;
use proptest::prelude::*;

// ── Graph generator ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct OpShape {
    kind: u8,
    inputs: Vec<usize>,
}

#[derive(Debug, Clone)]
struct BlockShape {
    is_loop: bool,
    ops: Vec<OpShape>,
}

fn arb_op() -> impl Strategy<Value = OpShape> {
    (0u8..6, prop::collection::vec(any::<usize>(), 0..4))
        .prop_map(|(kind, inputs)| OpShape { kind, inputs })
}

fn arb_blocks() -> impl Strategy<Value = Vec<BlockShape>> {
    prop::collection::vec(
        (
            prop::bool::ANY,
            prop::collection::vec(arb_op(), 1..8),
        )
            .prop_map(|(is_loop, ops)| BlockShape { is_loop, ops }),
        1..6,
    )
}

fn opcode(kind: u8) -> Opcode {
    match kind {
        0 => Opcode::Parameter,
        1 => Opcode::Call,
        2 => Opcode::StringConcat,
        3 => Opcode::StringLength,
        4 => Opcode::FrameState,
        _ => Opcode::Phi,
    }
}

/// Build a graph. With `forward_refs`, loop phis may reference any
/// operation; everything else only references earlier operations. `extra`
/// is appended to the last block and may reference any generated operation.
fn build(blocks: &[BlockShape], forward_refs: bool, extra: Option<&OpShape>) -> Graph {
    let total: usize = blocks.iter().map(|b| b.ops.len()).sum();
    let mut builder = GraphBuilder::new();
    let mut next = 0usize;
    for block in blocks {
        let kind = if block.is_loop {
            BlockKind::Loop
        } else {
            BlockKind::Plain
        };
        builder.begin_block(kind);
        for op in &block.ops {
            let code = opcode(op.kind);
            let bound = if forward_refs && block.is_loop && code == Opcode::Phi {
                total
            } else {
                next
            };
            builder.push(code, inputs_within(op, bound));
            next += 1;
        }
    }
    if let Some(op) = extra {
        builder.push(opcode(op.kind), inputs_within(op, total));
    }
    builder.finish().expect("generated graph is well formed")
}

fn inputs_within(op: &OpShape, bound: usize) -> Vec<OpIndex> {
    if bound == 0 || opcode(op.kind) == Opcode::Parameter {
        return Vec::new();
    }
    op.inputs
        .iter()
        .map(|&i| OpIndex((i % bound) as u32))
        .collect()
}

/// Least fixed point of the classification rules, by naive iteration.
fn oracle(graph: &Graph) -> Vec<bool> {
    let mut flags = vec![false; graph.op_count()];
    loop {
        let mut changed = false;
        for (index, op) in graph.operations() {
            let forces = match op.opcode {
                Opcode::FrameState | Opcode::StringLength => false,
                Opcode::StringConcat => flags[index.index()],
                _ => true,
            };
            if forces {
                for &input in op.inputs() {
                    if !flags[input.index()] {
                        flags[input.index()] = true;
                        changed = true;
                    }
                }
            }
        }
        if !changed {
            return flags;
        }
    }
}

fn flags_of(graph: &Graph) -> Vec<bool> {
    let result = analyze(graph);
    (0..graph.op_count())
        .map(|i| result.is_escaping(OpIndex(i as u32)))
        .collect()
}

// ── Properties ──────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 200,
        max_shrink_iters: 200,
        .. ProptestConfig::default()
    })]

    #[test]
    fn rerun_is_identical(blocks in arb_blocks(), forward in prop::bool::ANY) {
        let graph = build(&blocks, forward, None);
        prop_assert_eq!(analyze(&graph), analyze(&graph));
    }

    #[test]
    fn matches_fixed_point_without_forward_references(blocks in arb_blocks()) {
        let graph = build(&blocks, false, None);
        prop_assert_eq!(flags_of(&graph), oracle(&graph), "graph:\n{}", graph);
    }

    #[test]
    fn never_exceeds_fixed_point(blocks in arb_blocks()) {
        let graph = build(&blocks, true, None);
        let flags = flags_of(&graph);
        let bound = oracle(&graph);
        for (i, (&got, &max)) in flags.iter().zip(&bound).enumerate() {
            prop_assert!(!got || max, "#{} escaping beyond fixed point\n{}", i, graph);
        }
    }

    #[test]
    fn concat_inputs_of_escaping_concats_escape(blocks in arb_blocks()) {
        let graph = build(&blocks, true, None);
        let result = analyze(&graph);
        for (index, op) in graph.operations() {
            if op.opcode != Opcode::StringConcat || !result.is_escaping(index) {
                continue;
            }
            for &input in op.inputs() {
                if graph.get(input).opcode == Opcode::StringConcat {
                    prop_assert!(
                        result.is_escaping(input),
                        "{} escapes but its concat input {} does not\n{}",
                        index, input, graph
                    );
                }
            }
        }
    }

    #[test]
    fn appended_frame_state_changes_nothing(
        blocks in arb_blocks(),
        inputs in prop::collection::vec(any::<usize>(), 1..5),
    ) {
        let before = build(&blocks, true, None);
        let after = build(&blocks, true, Some(&OpShape { kind: 4, inputs }));
        let n = before.op_count();
        prop_assert_eq!(&flags_of(&after)[..n], &flags_of(&before)[..]);
    }

    #[test]
    fn appended_consumer_only_adds_escapes(
        blocks in arb_blocks(),
        inputs in prop::collection::vec(any::<usize>(), 1..5),
    ) {
        let before = flags_of(&build(&blocks, true, None));
        let after = flags_of(&build(&blocks, true, Some(&OpShape { kind: 1, inputs })));
        for (i, &was) in before.iter().enumerate() {
            prop_assert!(!was || after[i], "#{} stopped escaping", i);
        }
    }
}
