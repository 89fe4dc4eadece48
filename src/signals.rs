//! Flat signal storage shared by every component of one evaluation pass.
//!
//! Each component owns a contiguous window of the storage, addressed by the
//! window's base offset plus a local index. Windows of sibling components never
//! overlap; a parent's window encloses the windows of all of its descendants.

use ark_ff::PrimeField;

use crate::error::WitnessError;

/// Contiguous sub-range of the signal storage owned by one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalWindow {
    pub base: usize,
    pub len: usize,
}

impl SignalWindow {
    pub fn new(base: usize, len: usize) -> Self {
        Self { base, len }
    }

    /// Absolute storage index of local signal `index`, if it lies inside the window.
    pub fn absolute(&self, index: usize) -> Option<usize> {
        (index < self.len).then(|| self.base + index)
    }

    pub fn end(&self) -> usize {
        self.base + self.len
    }

    pub fn contains(&self, other: &SignalWindow) -> bool {
        other.base >= self.base && other.end() <= self.end()
    }
}

/// Signal values of one circuit instance. Signal 0 holds the constant `1`.
#[derive(Debug, Clone)]
pub struct SignalStorage<F> {
    values: Vec<F>,
}

impl<F: PrimeField> SignalStorage<F> {
    /// Allocates `len` signals, all zero except the constant-one signal.
    pub fn new(len: usize) -> Self {
        let mut values = vec![F::zero(); len.max(1)];
        values[0] = F::one();
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<F, WitnessError> {
        self.values
            .get(index)
            .copied()
            .ok_or(WitnessError::SignalOutOfRange {
                index,
                len: self.values.len(),
            })
    }

    pub fn set(&mut self, index: usize, value: F) -> Result<(), WitnessError> {
        let len = self.values.len();
        let slot = self
            .values
            .get_mut(index)
            .ok_or(WitnessError::SignalOutOfRange { index, len })?;
        *slot = value;
        Ok(())
    }

    pub fn as_slice(&self) -> &[F] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<F> {
        self.values
    }
}
