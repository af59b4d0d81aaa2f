// graph.rs — Block-structured IR graph consumed by the escape analysis
//
// A graph is a sequence of blocks, each owning a contiguous run of
// operations. Operations reference their inputs by `OpIndex`; a reference to
// an operation later in the graph models a loop phi's back-edge operand.
//
// Preconditions: none (construct through `GraphBuilder`).
// Postconditions: every input index of a finished `Graph` is `< op_count()`.
// Failure modes: dangling input references → `GraphError`.
// Side effects: none.

use std::fmt;
use std::ops::Range;

use crate::id::{BlockIndex, OpIndex};

// ── Public types ────────────────────────────────────────────────────────────

/// Operation kind tag.
///
/// Only `FrameState`, `StringConcat` and `StringLength` carry special meaning
/// for the escape analysis; every other kind is an ordinary consumer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Deoptimization metadata.
    FrameState,
    /// `(length, left, right)`.
    StringConcat,
    /// `(string)`.
    StringLength,
    Phi,
    Parameter,
    Constant,
    Call,
    Return,
    Other(String),
}

impl Opcode {
    pub fn from_name(name: &str) -> Opcode {
        match name {
            "FrameState" => Opcode::FrameState,
            "StringConcat" => Opcode::StringConcat,
            "StringLength" => Opcode::StringLength,
            "Phi" => Opcode::Phi,
            "Parameter" => Opcode::Parameter,
            "Constant" => Opcode::Constant,
            "Call" => Opcode::Call,
            "Return" => Opcode::Return,
            other => Opcode::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Opcode::FrameState => "FrameState",
            Opcode::StringConcat => "StringConcat",
            Opcode::StringLength => "StringLength",
            Opcode::Phi => "Phi",
            Opcode::Parameter => "Parameter",
            Opcode::Constant => "Constant",
            Opcode::Call => "Call",
            Opcode::Return => "Return",
            Opcode::Other(name) => name,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single IR operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub opcode: Opcode,
    inputs: Vec<OpIndex>,
}

impl Operation {
    pub fn new(opcode: Opcode, inputs: Vec<OpIndex>) -> Self {
        Operation { opcode, inputs }
    }

    pub fn inputs(&self) -> &[OpIndex] {
        &self.inputs
    }

    pub fn is(&self, opcode: &Opcode) -> bool {
        &self.opcode == opcode
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Plain,
    /// Loop header; its phis may reference operations defined later.
    Loop,
}

/// A basic block: a contiguous, ordered run of operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub index: BlockIndex,
    pub kind: BlockKind,
    ops: Range<u32>,
}

impl Block {
    pub fn is_loop(&self) -> bool {
        self.kind == BlockKind::Loop
    }

    pub fn contains(&self, op: OpIndex) -> bool {
        self.ops.contains(&op.0)
    }
}

/// Immutable IR graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    ops: Vec<Operation>,
    blocks: Vec<Block>,
}

impl Graph {
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn op_count(&self) -> usize {
        self.ops.len()
    }

    pub fn block(&self, index: BlockIndex) -> &Block {
        &self.blocks[index.index()]
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    /// Look up an operation. Panics on an index outside the graph.
    pub fn get(&self, index: OpIndex) -> &Operation {
        &self.ops[index.index()]
    }

    /// Operation indices of `block` in definition order.
    pub fn operation_indices(&self, block: &Block) -> impl DoubleEndedIterator<Item = OpIndex> {
        block.ops.clone().map(OpIndex)
    }

    /// All operations with their indices, in definition order.
    pub fn operations(&self) -> impl Iterator<Item = (OpIndex, &Operation)> {
        self.ops
            .iter()
            .enumerate()
            .map(|(i, op)| (OpIndex(i as u32), op))
    }

    /// Block containing `op`.
    pub fn block_of(&self, op: OpIndex) -> Option<&Block> {
        self.blocks.iter().find(|b| b.contains(op))
    }
}

// ── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// An input references an operation that does not exist.
    DanglingInput {
        op: OpIndex,
        input: OpIndex,
        op_count: usize,
    },
    /// `set_inputs` named an operation that was never pushed.
    UnknownOperation { op: OpIndex, op_count: usize },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::DanglingInput {
                op,
                input,
                op_count,
            } => write!(
                f,
                "operation {} references {} but the graph has only {} operations",
                op, input, op_count
            ),
            GraphError::UnknownOperation { op, op_count } => write!(
                f,
                "cannot patch {}: the graph has only {} operations",
                op, op_count
            ),
        }
    }
}

impl std::error::Error for GraphError {}

// ── Builder ─────────────────────────────────────────────────────────────────

/// Incremental graph construction.
///
/// Inputs may name indices that have not been pushed yet; they are checked
/// once in `finish()`. Use `next_index()` or `set_inputs()` to wire loop phis
/// to operands defined later in the graph.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    ops: Vec<Operation>,
    blocks: Vec<Block>,
    open: Option<(BlockKind, u32)>,
    errors: Vec<GraphError>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the current block (if any) and open a new one.
    pub fn begin_block(&mut self, kind: BlockKind) -> BlockIndex {
        self.close_block();
        self.open = Some((kind, self.ops.len() as u32));
        BlockIndex(self.blocks.len() as u32)
    }

    /// Append an operation to the open block, opening a plain block first if
    /// none is open.
    pub fn push(&mut self, opcode: Opcode, inputs: Vec<OpIndex>) -> OpIndex {
        if self.open.is_none() {
            self.begin_block(BlockKind::Plain);
        }
        let index = self.next_index();
        self.ops.push(Operation::new(opcode, inputs));
        index
    }

    /// Index the next pushed operation will receive.
    pub fn next_index(&self) -> OpIndex {
        OpIndex(self.ops.len() as u32)
    }

    /// Replace the inputs of an already pushed operation.
    pub fn set_inputs(&mut self, op: OpIndex, inputs: Vec<OpIndex>) {
        match self.ops.get_mut(op.index()) {
            Some(operation) => operation.inputs = inputs,
            None => self.errors.push(GraphError::UnknownOperation {
                op,
                op_count: self.ops.len(),
            }),
        }
    }

    pub fn finish(mut self) -> Result<Graph, GraphError> {
        self.close_block();
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }
        let op_count = self.ops.len();
        for (i, op) in self.ops.iter().enumerate() {
            if let Some(&input) = op.inputs.iter().find(|input| input.index() >= op_count) {
                return Err(GraphError::DanglingInput {
                    op: OpIndex(i as u32),
                    input,
                    op_count,
                });
            }
        }
        Ok(Graph {
            ops: self.ops,
            blocks: self.blocks,
        })
    }

    fn close_block(&mut self) {
        if let Some((kind, start)) = self.open.take() {
            self.blocks.push(Block {
                index: BlockIndex(self.blocks.len() as u32),
                kind,
                ops: start..self.ops.len() as u32,
            });
        }
    }
}

// ── Display ─────────────────────────────────────────────────────────────────

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Graph ({} blocks, {} ops)",
            self.block_count(),
            self.op_count()
        )?;
        for block in &self.blocks {
            if block.is_loop() {
                writeln!(f, "  {} (loop):", block.index)?;
            } else {
                writeln!(f, "  {}:", block.index)?;
            }
            for index in self.operation_indices(block) {
                let op = self.get(index);
                write!(f, "    {} = {}", index, op.opcode)?;
                if !op.inputs.is_empty() {
                    let args: Vec<String> = op.inputs.iter().map(|i| i.to_string()).collect();
                    write!(f, "({})", args.join(", "))?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_names_roundtrip() {
        for name in [
            "FrameState",
            "StringConcat",
            "StringLength",
            "Phi",
            "Parameter",
            "Constant",
            "Call",
            "Return",
            "CheckMaps",
        ] {
            assert_eq!(Opcode::from_name(name).name(), name);
        }
        assert_eq!(
            Opcode::from_name("CheckMaps"),
            Opcode::Other("CheckMaps".to_string())
        );
    }

    #[test]
    fn builder_assigns_dense_indices_and_blocks() {
        let mut b = GraphBuilder::new();
        let p = b.push(Opcode::Parameter, vec![]);
        let len = b.push(Opcode::StringLength, vec![p]);
        b.begin_block(BlockKind::Loop);
        let c = b.push(Opcode::StringConcat, vec![len, p, p]);
        let graph = b.finish().unwrap();

        assert_eq!(graph.op_count(), 3);
        assert_eq!(graph.block_count(), 2);
        assert_eq!(c, OpIndex(2));
        let b1 = graph.block(BlockIndex(1));
        assert!(b1.is_loop());
        assert_eq!(graph.operation_indices(b1).collect::<Vec<_>>(), vec![c]);
        assert_eq!(graph.block_of(len).map(|b| b.index), Some(BlockIndex(0)));
    }

    #[test]
    fn operation_indices_reverse() {
        let mut b = GraphBuilder::new();
        b.push(Opcode::Constant, vec![]);
        b.push(Opcode::Constant, vec![]);
        b.push(Opcode::Constant, vec![]);
        let graph = b.finish().unwrap();
        let rev: Vec<_> = graph
            .operation_indices(graph.block(BlockIndex(0)))
            .rev()
            .collect();
        assert_eq!(rev, vec![OpIndex(2), OpIndex(1), OpIndex(0)]);
    }

    #[test]
    fn forward_reference_is_accepted_when_defined() {
        let mut b = GraphBuilder::new();
        let init = b.push(Opcode::Parameter, vec![]);
        b.begin_block(BlockKind::Loop);
        let phi = b.push(Opcode::Phi, vec![]);
        let next = b.push(Opcode::Call, vec![phi]);
        b.set_inputs(phi, vec![init, next]);
        let graph = b.finish().unwrap();
        assert_eq!(graph.get(phi).inputs(), &[init, next]);
    }

    #[test]
    fn dangling_input_rejected() {
        let mut b = GraphBuilder::new();
        b.push(Opcode::Return, vec![OpIndex(5)]);
        let err = b.finish().unwrap_err();
        assert_eq!(
            err,
            GraphError::DanglingInput {
                op: OpIndex(0),
                input: OpIndex(5),
                op_count: 1
            }
        );
        assert!(err.to_string().contains("#5"));
    }

    #[test]
    fn patching_unknown_operation_rejected() {
        let mut b = GraphBuilder::new();
        b.set_inputs(OpIndex(3), vec![]);
        assert!(matches!(
            b.finish(),
            Err(GraphError::UnknownOperation { .. })
        ));
    }

    #[test]
    fn empty_builder_gives_empty_graph() {
        let graph = GraphBuilder::new().finish().unwrap();
        assert_eq!(graph.block_count(), 0);
        assert_eq!(graph.op_count(), 0);
    }

    #[test]
    fn display_lists_blocks_and_ops() {
        let mut b = GraphBuilder::new();
        let p = b.push(Opcode::Parameter, vec![]);
        b.begin_block(BlockKind::Loop);
        b.push(Opcode::Return, vec![p]);
        let text = b.finish().unwrap().to_string();
        assert_eq!(
            text,
            "Graph (2 blocks, 2 ops)\n  B0:\n    #0 = Parameter\n  B1 (loop):\n    #1 = Return(#0)\n"
        );
    }
}
