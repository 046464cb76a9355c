//! mtx-run
//!
//! Executes a JSON instruction program and prints the requested outputs.
//!
//! Usage: `mtx-run <program.json> [--lineage MODE] [--explain VAR]... [--json]`

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{error, info, warn};

use mtx_runtime::LineageMode;
use mtx_tools::{Program, ProgramReport, ToolError};

#[derive(Parser, Debug)]
#[command(name = "mtx-run")]
#[command(about = "Execute an n-ary matrix instruction program")]
struct Args {
    /// Path to the program file (JSON)
    path: PathBuf,

    /// Override the program's lineage mode (disabled, trace or reuse)
    #[arg(long)]
    lineage: Option<LineageMode>,

    /// Print the lineage trace of a variable after the run
    #[arg(long = "explain", value_name = "VAR")]
    explain: Vec<String>,

    /// Print outputs and cache statistics as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    mtx_tools::init_logging();

    let args = Args::parse();
    if let Err(err) = run(&args) {
        error!("{}", err);
        process::exit(err.exit_code());
    }
}

fn run(args: &Args) -> Result<(), ToolError> {
    let mut program = Program::load(&args.path)?;
    if let Some(mode) = args.lineage {
        program.config.lineage = mode;
    }

    let runtime = program.runtime();
    let report = program.run_on(&runtime)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    for name in &args.explain {
        match runtime.explain(name) {
            Some(trace) => {
                println!("lineage of {name}:");
                print!("{trace}");
            }
            None if !runtime.lineage_mode().records() => {
                warn!(%name, "lineage is disabled; nothing to explain");
            }
            None => warn!(%name, "no lineage recorded"),
        }
    }
    Ok(())
}

fn print_report(report: &ProgramReport) {
    for (name, value) in &report.outputs {
        println!("{name} = {value}");
    }
    info!(
        executed = report.executed,
        hits = report.cache.hits,
        misses = report.cache.misses,
        stored = report.cache.puts,
        "run complete"
    );
}
