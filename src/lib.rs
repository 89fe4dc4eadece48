use sha2::{Digest, Sha256};

pub mod bench;
pub mod calculator;
pub mod circuit;
pub mod circuits;
pub mod component;
pub mod config;
pub mod error;
pub mod field;
pub mod input;
pub mod logging;
pub mod signals;
pub mod template;
pub mod witness;

pub use calculator::{EvalStats, WitnessCalculator, calculate_witness};
pub use circuit::{Circuit, CircuitDescription};
pub use component::{ComponentId, ComponentState};
pub use config::EvalConfig;
pub use error::{CircuitError, FieldError, InputError, MsmError, WitnessError};
pub use field::Fr;
pub use input::InputAssignment;
pub use witness::Witness;

pub fn digest_sha2(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}
