//! Prints the average nanoseconds of one BN254 scalar multiplication.

use clap::Parser;

use calcwit::bench;

#[derive(Parser, Debug)]
#[command(name = "fr_mul", about = "Times repeated BN254 scalar squaring")]
struct Cli {
    /// Number of multiplications.
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    n: u64,
}

fn main() {
    let cli = Cli::parse();
    print!("{}", bench::time_field_mul(cli.n));
}
