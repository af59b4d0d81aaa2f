// pass.rs — Pass descriptor module: metadata, dependency resolution, artifact IDs
//
// Declares the analyzer's passes (parse is outside the runner), their
// dependency edges, and the artifacts they produce. Used by the pipeline
// runner to compute minimal pass subsets for each --emit target.

use std::collections::HashSet;

// ── Pass and Artifact identifiers ──────────────────────────────────────────

/// Identifies each pass (parse excluded — handled before the runner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassId {
    BuildGraph,
    Verify,
    EscapeAnalysis,
}

/// Machine-readable artifact identifiers. Each maps to a concrete type
/// in the compilation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactId {
    Graph,   // LoweredProgram
    Checked, // verification diagnostics only
    Escape,  // EscapeAnalysis
}

// ── Pass descriptor ────────────────────────────────────────────────────────

/// Static metadata about a pass.
pub struct PassDescriptor {
    /// Human-readable name for diagnostics/verbose output.
    pub name: &'static str,
    /// Pass dependencies (other passes whose outputs this pass consumes).
    pub inputs: &'static [PassId],
    /// Artifacts this pass produces.
    pub outputs: &'static [ArtifactId],
    /// Pre/post conditions (documentation only).
    pub invariants: &'static str,
}

/// Return the static descriptor for a given pass.
pub fn descriptor(id: PassId) -> PassDescriptor {
    match id {
        PassId::BuildGraph => PassDescriptor {
            name: "build_graph",
            inputs: &[],
            outputs: &[ArtifactId::Graph],
            invariants: "all value references resolved, indices dense",
        },
        PassId::Verify => PassDescriptor {
            name: "verify",
            inputs: &[PassId::BuildGraph],
            outputs: &[ArtifactId::Checked],
            invariants: "concat/length arity checked, forward refs only from loop phis",
        },
        PassId::EscapeAnalysis => PassDescriptor {
            name: "escape_analysis",
            inputs: &[PassId::Verify],
            outputs: &[ArtifactId::Escape],
            invariants: "every op classified, flags monotonic",
        },
    }
}

// ── Dependency resolution ──────────────────────────────────────────────────

/// All pass IDs in declaration order (used for iteration).
pub const ALL_PASSES: [PassId; 3] = [PassId::BuildGraph, PassId::Verify, PassId::EscapeAnalysis];

/// Compute the minimal ordered set of passes needed to produce `terminal`.
/// Returns passes in topological (execution) order.
pub fn required_passes(terminal: PassId) -> Vec<PassId> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    visit(terminal, &mut visited, &mut order);
    order
}

fn visit(id: PassId, visited: &mut HashSet<PassId>, order: &mut Vec<PassId>) {
    if !visited.insert(id) {
        return;
    }
    for &dep in descriptor(id).inputs {
        visit(dep, visited, order);
    }
    order.push(id);
}

// ── Tests ──────────────────────────────────────────────────────────────────
