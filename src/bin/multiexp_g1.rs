//! Prints the average nanoseconds of one G1 multi-exponentiation.

use anyhow::Result;
use clap::Parser;

use calcwit::bench;

#[derive(Parser, Debug)]
#[command(name = "multiexp_g1", about = "Times BN254 G1 multi-exponentiation")]
struct Cli {
    /// Number of bases and scalars.
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    x: u64,

    /// Number of repetitions.
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    n: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let x = usize::try_from(cli.x)?;
    print!("{}", bench::time_multi_exp(x, cli.n)?);
    Ok(())
}
