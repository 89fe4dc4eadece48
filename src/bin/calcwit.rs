//! Computes the witness of a circuit for one input assignment.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use calcwit::{Circuit, EvalConfig, Fr, InputAssignment, WitnessCalculator, circuits, logging};

#[derive(Parser, Debug)]
#[command(name = "calcwit", about = "Witness calculator for hierarchical arithmetic circuits")]
struct Cli {
    /// JSON input assignment, e.g. `{ "unsolved": [[...]], "solved": [[...]] }`.
    #[arg(short, long)]
    input: PathBuf,

    /// JSON circuit description; defaults to the built-in Sudoku checker.
    #[arg(short, long)]
    circuit: Option<PathBuf>,

    /// JSON evaluation config.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(&cli.log_level)?;

    let circuit: Circuit<Fr> = match &cli.circuit {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading circuit {}", path.display()))?;
            Circuit::from_json(&json)?
        }
        None => circuits::sudoku::circuit()?,
    };
    let config = match &cli.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            EvalConfig::from_json(&json)?
        }
        None => EvalConfig::default(),
    };
    let json = fs::read_to_string(&cli.input)
        .with_context(|| format!("reading inputs {}", cli.input.display()))?;
    let inputs = InputAssignment::from_json(&json)?;

    info!(
        signals = circuit.total_signals(),
        components = circuit.total_components(),
        "evaluating circuit"
    );
    let witness = WitnessCalculator::with_config(&circuit, config).evaluate_assignment(&inputs)?;

    let digest: String = witness.digest().iter().map(|b| format!("{b:02x}")).collect();
    println!("signals: {}", witness.len());
    println!("sha256: {digest}");
    Ok(())
}
