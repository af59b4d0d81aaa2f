// escape.rs — String concatenation escape analysis
//
// Decides, for every operation, whether its result must exist as a
// materialized string ("escaping") or whether a StringConcat producing it may
// stay a lazy concatenation descriptor. One backward sweep over all blocks
// classifies each use; a fix-up pass then repairs concats that only became
// escaping after they were visited (loop phis referencing later operations).
//
// Preconditions: `graph` is a finished `Graph` (all inputs in range).
// Postconditions: `EscapeAnalysis::is_escaping` answers for every op index.
// Failure modes: none; an out-of-range query is a caller bug and panics.
// Side effects: none.

use log::{debug, trace};

use crate::graph::{Block, Graph, Opcode, Operation};
use crate::id::{BlockIndex, OpIndex};

// ── Flag store ──────────────────────────────────────────────────────────────

/// Dense per-operation escape flags. Flags only ever go from false to true.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapeFlags {
    flags: Vec<bool>,
}

impl EscapeFlags {
    pub fn new(op_count: usize) -> Self {
        EscapeFlags {
            flags: vec![false; op_count],
        }
    }

    pub fn get(&self, index: OpIndex) -> bool {
        assert!(
            index.index() < self.flags.len(),
            "escape query for {} outside graph of {} operations",
            index,
            self.flags.len()
        );
        self.flags[index.index()]
    }

    /// Flag `index` as escaping. Returns true if it was not escaping before.
    pub fn mark(&mut self, index: OpIndex) -> bool {
        let slot = &mut self.flags[index.index()];
        let changed = !*slot;
        *slot = true;
        changed
    }

    pub fn iter(&self) -> impl Iterator<Item = (OpIndex, bool)> + '_ {
        self.flags
            .iter()
            .enumerate()
            .map(|(i, &f)| (OpIndex(i as u32), f))
    }
}

// ── Result ──────────────────────────────────────────────────────────────────

/// Counters collected during one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct EscapeStats {
    pub ops_visited: usize,
    pub string_concats: usize,
    /// Concats not yet escaping when the sweep reached them.
    pub deferred_candidates: usize,
    /// Concats flagged by the fix-up pass rather than the sweep.
    pub fixup_propagations: usize,
}

/// Final classification handed to the consumer of the analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapeAnalysis {
    flags: EscapeFlags,
    stats: EscapeStats,
}

impl EscapeAnalysis {
    /// Whether the operation at `index` must be materialized.
    ///
    /// Panics if `index` is outside the analyzed graph.
    pub fn is_escaping(&self, index: OpIndex) -> bool {
        self.flags.get(index)
    }

    pub fn flags(&self) -> &EscapeFlags {
        &self.flags
    }

    pub fn stats(&self) -> &EscapeStats {
        &self.stats
    }

    /// All escaping operations in index order.
    pub fn escaping_ops(&self) -> Vec<OpIndex> {
        self.flags
            .iter()
            .filter_map(|(i, f)| f.then_some(i))
            .collect()
    }

    /// StringConcat operations of `graph`, split into (escaping, elidable).
    pub fn string_concats(&self, graph: &Graph) -> (Vec<OpIndex>, Vec<OpIndex>) {
        graph
            .operations()
            .filter(|(_, op)| op.is(&Opcode::StringConcat))
            .map(|(i, _)| i)
            .partition(|&i| self.is_escaping(i))
    }
}

// ── Analyzer ────────────────────────────────────────────────────────────────

/// Single-use analyzer state for one graph.
pub struct StringEscapeAnalyzer<'g> {
    graph: &'g Graph,
    escaping: EscapeFlags,
    maybe_non_escaping_concats: Vec<OpIndex>,
    stats: EscapeStats,
}

impl<'g> StringEscapeAnalyzer<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        StringEscapeAnalyzer {
            graph,
            escaping: EscapeFlags::new(graph.op_count()),
            maybe_non_escaping_concats: Vec::new(),
            stats: EscapeStats::default(),
        }
    }

    pub fn run(mut self) -> EscapeAnalysis {
        let graph = self.graph;
        // Blocks last to first: without back-edges, uses come after defs.
        for processed in (1..=graph.block_count()).rev() {
            let block = graph.block(BlockIndex((processed - 1) as u32));
            self.process_block(block);
        }

        // Loop phis can make a concat escaping after it was visited.
        self.reprocess_string_concats();

        debug!(
            "string escape analysis: {} ops, {} concats, {} deferred, {} fixed up",
            self.stats.ops_visited,
            self.stats.string_concats,
            self.stats.deferred_candidates,
            self.stats.fixup_propagations
        );

        EscapeAnalysis {
            flags: self.escaping,
            stats: self.stats,
        }
    }

    fn process_block(&mut self, block: &Block) {
        let graph = self.graph;
        for index in graph.operation_indices(block).rev() {
            self.process_operation(index, graph.get(index));
        }
    }

    fn process_operation(&mut self, index: OpIndex, op: &Operation) {
        self.stats.ops_visited += 1;
        match op.opcode {
            // Deopt metadata never reads the string on the fast path.
            Opcode::FrameState => {}
            Opcode::StringConcat => {
                self.stats.string_concats += 1;
                if self.escaping.get(index) {
                    self.mark_all_inputs_as_escaping(op);
                } else {
                    trace!("deferring {}", index);
                    self.stats.deferred_candidates += 1;
                    self.maybe_non_escaping_concats.push(index);
                }
            }
            // StringLength(StringConcat(len, left, right)) == len
            Opcode::StringLength => {}
            _ => self.mark_all_inputs_as_escaping(op),
        }
    }

    fn mark_all_inputs_as_escaping(&mut self, op: &Operation) {
        for &input in op.inputs() {
            self.escaping.mark(input);
        }
    }

    fn recursively_mark_all_string_concat_inputs_as_escaping(&mut self, concat: OpIndex) {
        let graph = self.graph;
        let mut to_mark = vec![concat];

        while let Some(curr) = to_mark.pop() {
            for &input in graph.get(curr).inputs() {
                if graph.get(input).is(&Opcode::StringConcat) && self.escaping.mark(input) {
                    trace!("fix-up: {} escapes through {}", input, curr);
                    self.stats.fixup_propagations += 1;
                    to_mark.push(input);
                }
            }
        }
    }

    fn reprocess_string_concats(&mut self) {
        let candidates = std::mem::take(&mut self.maybe_non_escaping_concats);
        for index in candidates {
            if self.escaping.get(index) {
                self.recursively_mark_all_string_concat_inputs_as_escaping(index);
            }
        }
    }
}

// ── Public entry point ──────────────────────────────────────────────────────

/// Run the string escape analysis over `graph`.
pub fn analyze(graph: &Graph) -> EscapeAnalysis {
    StringEscapeAnalyzer::new(graph).run()
}

// ── Tests ───────────────────────────────────────────────────────────────────
