// pipeline.rs — Analysis state and pass orchestration
//
// Holds all pass artifacts and runs the minimal set of passes for a given
// terminal PassId.
//
// Preconditions: the parsed Program must be set before calling run_pipeline.
// Postconditions: all artifacts for required passes are populated, or has_error is set.
// Failure modes: any pass emitting error-level diagnostics.
// Side effects: calls on_pass_complete callback after each pass for immediate display;
//               prints per-pass timing to stderr when verbose.

use std::fmt;
use std::time::{Duration, Instant};

use crate::ast::Program;
use crate::diag::Diagnostic;
use crate::escape::EscapeAnalysis;
use crate::lower::LoweredProgram;
use crate::pass::{descriptor, required_passes, PassId};

// ── Provenance ─────────────────────────────────────────────────────────────

/// Provenance metadata for reproducible runs.
///
/// `source_hash`: SHA-256 of the raw IR source text.
/// `compiler_version`: crate version from `Cargo.toml`.
#[derive(Debug, Clone)]
pub struct Provenance {
    pub source_hash: [u8; 32],
    pub compiler_version: &'static str,
}

impl Provenance {
    /// Hex string of the source hash (64 characters).
    pub fn source_hash_hex(&self) -> String {
        let mut s = String::with_capacity(64);
        for b in &self.source_hash {
            use std::fmt::Write;
            let _ = write!(s, "{:02x}", b);
        }
        s
    }

    /// Serialize provenance as a JSON string for `--emit build-info`.
    pub fn to_json(&self) -> String {
        let value = serde_json::json!({
            "source_hash": self.source_hash_hex(),
            "compiler_version": self.compiler_version,
        });
        format!("{:#}\n", value)
    }
}

/// Compute provenance from source text.
pub fn compute_provenance(source: &str) -> Provenance {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    let result = hasher.finalize();
    let mut source_hash = [0u8; 32];
    source_hash.copy_from_slice(&result);

    Provenance {
        source_hash,
        compiler_version: env!("CARGO_PKG_VERSION"),
    }
}

// ── Artifact storage ───────────────────────────────────────────────────────

/// Holds all analysis artifacts and accumulated diagnostics.
pub struct CompilationState {
    pub program: Program,
    pub lowered: Option<LoweredProgram>,
    pub escape: Option<EscapeAnalysis>,
    pub diagnostics: Vec<Diagnostic>,
    pub has_error: bool,
    pub provenance: Option<Provenance>,
}

impl CompilationState {
    pub fn new(program: Program) -> Self {
        Self {
            program,
            lowered: None,
            escape: None,
            diagnostics: Vec::new(),
            has_error: false,
            provenance: None,
        }
    }
}

// ── Error type ─────────────────────────────────────────────────────────────

/// Pipeline execution failed due to error-level diagnostics in a pass.
/// The specific diagnostics are available in `CompilationState.diagnostics`.
#[derive(Debug)]
pub struct PipelineError {
    /// The pass that produced the error.
    pub failing_pass: PassId,
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed", descriptor(self.failing_pass).name)
    }
}

impl std::error::Error for PipelineError {}

fn has_error_diags(diags: &[Diagnostic]) -> bool {
    diags.iter().any(Diagnostic::is_error)
}

/// Per-pass post-processing: callback, accumulate, verbose, error check.
fn finish_pass(
    state: &mut CompilationState,
    pass_id: PassId,
    diags: Vec<Diagnostic>,
    elapsed: Duration,
    verbose: bool,
    on_pass_complete: &mut impl FnMut(PassId, &[Diagnostic]),
) -> Result<(), PipelineError> {
    on_pass_complete(pass_id, &diags);
    let is_err = has_error_diags(&diags);
    state.diagnostics.extend(diags);
    if verbose {
        eprintln!(
            "cea: {} complete, {:.1}ms",
            descriptor(pass_id).name,
            elapsed.as_secs_f64() * 1000.0
        );
    }
    if is_err {
        state.has_error = true;
        return Err(PipelineError {
            failing_pass: pass_id,
        });
    }
    Ok(())
}

// ── Pipeline runner ────────────────────────────────────────────────────────

/// Run the minimal set of passes to produce `terminal`.
///
/// Per-pass sequence: execute → on_pass_complete(callback) → verbose → error check.
pub fn run_pipeline(
    state: &mut CompilationState,
    terminal: PassId,
    verbose: bool,
    mut on_pass_complete: impl FnMut(PassId, &[Diagnostic]),
) -> Result<(), PipelineError> {
    for pass_id in required_passes(terminal) {
        let t = Instant::now();
        let diags = match pass_id {
            PassId::BuildGraph => {
                let result = crate::lower::lower(&state.program);
                state.lowered = Some(result.lowered);
                result.diagnostics
            }
            PassId::Verify => match &state.lowered {
                Some(lowered) => crate::verify::verify(lowered),
                None => Vec::new(),
            },
            PassId::EscapeAnalysis => {
                state.escape = state
                    .lowered
                    .as_ref()
                    .map(|lowered| crate::escape::analyze(&lowered.graph));
                Vec::new()
            }
        };
        let elapsed = t.elapsed();
        finish_pass(
            state,
            pass_id,
            diags,
            elapsed,
            verbose,
            &mut on_pass_complete,
        )?;
    }

    if verbose {
        if let (Some(lowered), Some(escape)) = (&state.lowered, &state.escape) {
            let (escaping, elidable) = escape.string_concats(&lowered.graph);
            eprintln!(
                "cea: {} ops, {} concats escaping, {} elidable",
                lowered.graph.op_count(),
                escaping.len(),
                elidable.len()
            );
        }
    }

    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────
