//! Pseudocode VM host binary.
//!
//! Not part of the core (spec §6.4): a thin `clap`-driven binary that loads a
//! compiled chunk — either a bincode-encoded `ChunkBlob` (the wire format an
//! external compiler collaborator emits) or a hand-assembled `.pseudoasm`
//! listing (§C, a debugging convenience) — and runs it to completion.

use clap::Parser;
use pseudo_core::serialize::ChunkBlob;
use pseudo_core::{Chunk, Heap};
use pseudo_runtime::{builtins, Vm};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "pseudo")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run a compiled Pseudocode chunk or a .pseudoasm listing", long_about = None)]
struct Cli {
    /// Compiled chunk (.bin) or hand-assembled listing (.pseudoasm / .pasm)
    input: PathBuf,

    /// Trace every opcode and the stack to stderr as it executes
    #[arg(long)]
    debug: bool,

    /// At-exit activity report: "1" (human), "json", or "json:<path>".
    /// Overrides PSEUDO_REPORT when given.
    #[arg(long, value_name = "MODE")]
    report: Option<String>,

    /// Colon-separated extra import search paths, prepended to PSEUDO_PATH
    #[arg(long, value_name = "DIRS")]
    pseudo_path: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pseudo_cli=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(report) = &cli.report {
        // SAFETY: single-threaded at this point, before any worker spawns.
        unsafe { std::env::set_var("PSEUDO_REPORT", report) };
    }
    if let Some(extra) = &cli.pseudo_path {
        let existing = std::env::var("PSEUDO_PATH").unwrap_or_default();
        let merged = if existing.is_empty() {
            extra.clone()
        } else {
            format!("{extra}:{existing}")
        };
        unsafe { std::env::set_var("PSEUDO_PATH", merged) };
    }

    let mut heap = Heap::new();
    let chunk = match load_chunk(&cli.input, &mut heap) {
        Ok(chunk) => chunk,
        Err(msg) => {
            eprintln!("compile error: {msg}");
            process::exit(65);
        }
    };

    let mut vm = Vm::new();
    vm.heap = heap;
    builtins::install(&mut vm);
    vm.set_debug_mode(cli.debug);

    let result = vm.interpret(chunk);
    let report = vm.report_snapshot();
    pseudo_runtime::report::emit(&report);

    match result {
        Ok(_) => process::exit(0),
        Err(_) => {
            // Every VmError variant is a runtime-phase failure (spec §7); the
            // compile-error code (65) only applies to load_chunk's own
            // failures, before a Vm ever exists. The message and the
            // line-numbered stack trace were already written to stderr by
            // the VM itself at the point of failure.
            process::exit(70);
        }
    }
}

/// Loads a `Chunk` from `path`: `.pseudoasm`/`.pasm` is hand-assembled text
/// (§C); anything else is treated as a bincode-encoded `ChunkBlob`, the wire
/// format the out-of-scope source-text compiler is expected to emit (§6.2).
fn load_chunk(path: &Path, heap: &mut Heap) -> Result<Chunk, String> {
    let is_asm = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("pseudoasm") | Some("pasm")
    );

    if is_asm {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("reading '{}': {e}", path.display()))?;
        pseudo_runtime::assembler::assemble(&text, heap)
    } else {
        let bytes = std::fs::read(path).map_err(|e| format!("reading '{}': {e}", path.display()))?;
        let blob: ChunkBlob =
            bincode::deserialize(&bytes).map_err(|e| format!("decoding chunk: {e}"))?;
        Ok(blob.into_chunk(heap))
    }
}
