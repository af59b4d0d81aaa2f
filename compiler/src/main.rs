use clap::Parser;
use std::path::{Path, PathBuf};

use cea::pass::PassId;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum EmitStage {
    /// Per-concat escape report (text)
    Escape,
    /// Escape report as JSON
    Json,
    /// Graphviz DOT with concats colored by status
    Dot,
    /// Lowered graph with operation indices
    Graph,
    /// Normalized IR listing
    Cir,
    /// Source hash and analyzer version
    BuildInfo,
}

#[derive(Parser, Debug)]
#[command(
    name = "cea",
    version,
    about = "Concat Escape Analyzer — classifies string concatenations in IR graphs as escaping or elidable"
)]
struct Cli {
    /// Input .cir source file
    source: PathBuf,

    /// Output file path (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output stage
    #[arg(long, value_enum, default_value_t = EmitStage::Escape)]
    emit: EmitStage,

    /// Print passes and timing
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        cea::logging::init_with_level(log::LevelFilter::Debug);
    } else {
        cea::logging::init_from_env();
    }

    if cli.verbose {
        eprintln!("cea: source = {}", cli.source.display());
        eprintln!("cea: emit   = {:?}", cli.emit);
    }

    // ── Read and parse source ──
    let source = match std::fs::read_to_string(&cli.source) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("cea: error: {}: {}", cli.source.display(), e);
            std::process::exit(2);
        }
    };

    if let EmitStage::BuildInfo = cli.emit {
        let provenance = cea::pipeline::compute_provenance(&source);
        write_output(cli.output.as_deref(), &provenance.to_json());
        return;
    }

    let parse_result = cea::parser::parse(&source);
    if !parse_result.errors.is_empty() {
        for err in &parse_result.errors {
            let (line, col) = line_col(&source, err.span().start);
            eprintln!(
                "cea: {}:{}:{}: parse error: {}",
                cli.source.display(),
                line,
                col,
                err
            );
        }
        std::process::exit(1);
    }
    let program = match parse_result.program {
        Some(p) => p,
        None => {
            eprintln!("cea: parse failed with no output");
            std::process::exit(1);
        }
    };

    if cli.verbose {
        eprintln!("cea: parsed {} blocks", program.blocks.len());
    }

    // ── Passes ──
    let terminal = match cli.emit {
        EmitStage::Graph | EmitStage::Cir => PassId::BuildGraph,
        _ => PassId::EscapeAnalysis,
    };

    let mut state = cea::pipeline::CompilationState::new(program);
    state.provenance = Some(cea::pipeline::compute_provenance(&source));
    let source_path = cli.source.display().to_string();
    let result = cea::pipeline::run_pipeline(&mut state, terminal, cli.verbose, |_, diags| {
        for diag in diags {
            let (line, col) = line_col(&source, diag.span.start);
            eprintln!("cea: {}:{}:{}: {}", source_path, line, col, diag);
            for note in &diag.related_spans {
                let (line, col) = line_col(&source, note.span.start);
                eprintln!("cea: {}:{}:{}: note: {}", source_path, line, col, note.label);
            }
        }
    });
    if let Err(e) = result {
        eprintln!("cea: {}", e);
        std::process::exit(1);
    }

    let Some(lowered) = state.lowered.as_ref() else {
        eprintln!("cea: no graph produced");
        std::process::exit(1);
    };

    let text = match (cli.emit, state.escape.as_ref()) {
        (EmitStage::Graph, _) => lowered.graph.to_string(),
        (EmitStage::Cir, _) => lowered.to_string(),
        (EmitStage::Dot, escape) => cea::dot::emit_dot(lowered, escape),
        (EmitStage::Json, Some(escape)) => match cea::report::emit_json(lowered, escape) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("cea: error: cannot serialize report: {}", e);
                std::process::exit(2);
            }
        },
        (_, Some(escape)) => cea::report::emit_text(lowered, escape),
        (_, None) => {
            eprintln!("cea: escape analysis did not run");
            std::process::exit(1);
        }
    };
    write_output(cli.output.as_deref(), &text);
}

fn write_output(path: Option<&Path>, text: &str) {
    match path {
        Some(path) => {
            if let Err(e) = std::fs::write(path, text) {
                eprintln!("cea: error: {}: {}", path.display(), e);
                std::process::exit(2);
            }
        }
        None => print!("{}", text),
    }
}

/// 1-based line and column of a byte offset.
fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let prefix = &source[..offset.min(source.len())];
    let line = prefix.matches('\n').count() + 1;
    let col = prefix.rfind('\n').map_or(prefix.len(), |nl| prefix.len() - nl - 1) + 1;
    (line, col)
}
