//! The computed witness: every signal value of one evaluated circuit instance.

use std::ops::{Index, Range};

use ark_ff::PrimeField;

use crate::{digest_sha2, field};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness<F> {
    values: Vec<F>,
}

impl<F: PrimeField> Witness<F> {
    pub fn new(values: Vec<F>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&F> {
        self.values.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &F> {
        self.values.iter()
    }

    /// Signals of a window, e.g. one component's signals.
    pub fn window(&self, range: Range<usize>) -> Option<&[F]> {
        self.values.get(range)
    }

    pub fn as_slice(&self) -> &[F] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<F> {
        self.values
    }

    /// SHA-256 over the little-endian canonical bytes of every signal, in order.
    pub fn digest(&self) -> [u8; 32] {
        let mut bytes = Vec::with_capacity(self.values.len() * 32);
        for value in &self.values {
            bytes.extend_from_slice(&field::to_bytes_le(value));
        }
        digest_sha2(&bytes)
    }
}

impl<F> Index<usize> for Witness<F> {
    type Output = F;

    fn index(&self, index: usize) -> &F {
        &self.values[index]
    }
}
