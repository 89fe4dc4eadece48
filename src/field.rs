//! Field element operations consumed by the witness calculator.
//!
//! Every operation works over the canonical integer representative of a
//! prime field element, so results are always reduced modulo the field
//! characteristic. Comparisons and boolean results are encoded as the field
//! elements `1` and `0`.

use std::str::FromStr;

use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;
use num_traits::ToPrimitive;

use crate::error::FieldError;

/// Field used by the bundled circuits: the BN254 scalar field.
pub type Fr = ark_bn254::Fr;

pub fn add<F: PrimeField>(a: &F, b: &F) -> F {
    *a + b
}

pub fn sub<F: PrimeField>(a: &F, b: &F) -> F {
    *a - b
}

pub fn mul<F: PrimeField>(a: &F, b: &F) -> F {
    *a * b
}

/// Field division `a / b`; fails when `b` is the additive identity.
pub fn div<F: PrimeField>(a: &F, b: &F) -> Result<F, FieldError> {
    let inv = b.inverse().ok_or(FieldError::DivisionByZero)?;
    Ok(*a * inv)
}

/// Logical right shift of the integer representative of `a` by `to_int(b)` bits.
pub fn shr<F: PrimeField>(a: &F, b: &F) -> Result<F, FieldError> {
    let shift = to_int(b)?;
    if shift >= F::MODULUS_BIT_SIZE as u64 {
        return Ok(F::zero());
    }
    let value: BigUint = (*a).into();
    Ok(F::from(value >> shift))
}

/// Bitwise AND of the integer representatives.
pub fn band<F: PrimeField>(a: &F, b: &F) -> F {
    let lhs: BigUint = (*a).into();
    let rhs: BigUint = (*b).into();
    F::from(lhs & rhs)
}

pub fn eq<F: PrimeField>(a: &F, b: &F) -> F {
    from_bool(a == b)
}

/// `a < b` over canonical representatives.
pub fn lt<F: PrimeField>(a: &F, b: &F) -> F {
    from_bool(a.into_bigint() < b.into_bigint())
}

/// `a` raised to the canonical integer of `e`.
pub fn pow<F: PrimeField>(a: &F, e: &F) -> F {
    a.pow(e.into_bigint())
}

pub fn is_true<F: PrimeField>(a: &F) -> bool {
    !a.is_zero()
}

/// Canonical representative of `a` as a machine integer.
pub fn to_int<F: PrimeField>(a: &F) -> Result<u64, FieldError> {
    let value: BigUint = (*a).into();
    value.to_u64().ok_or_else(|| FieldError::NotSmallInteger {
        value: value.to_string(),
    })
}

/// Same as [`to_int`], narrowed to an index.
pub fn to_index<F: PrimeField>(a: &F) -> Result<usize, FieldError> {
    let n = to_int(a)?;
    usize::try_from(n).map_err(|_| FieldError::NotSmallInteger {
        value: n.to_string(),
    })
}

pub fn from_int<F: PrimeField>(n: u64) -> F {
    F::from(n)
}

pub fn from_bool<F: PrimeField>(b: bool) -> F {
    if b { F::one() } else { F::zero() }
}

/// Parses a decimal string, reducing it modulo the field characteristic.
pub fn from_decimal<F: PrimeField>(s: &str) -> Result<F, FieldError> {
    let trimmed = s.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let value =
        BigUint::from_str(digits).map_err(|_| FieldError::InvalidDecimal(s.to_string()))?;
    let element = F::from(value);
    Ok(if negative { -element } else { element })
}

pub fn to_decimal<F: PrimeField>(a: &F) -> String {
    let value: BigUint = (*a).into();
    value.to_string()
}

/// Little-endian canonical bytes, as committed to by [`crate::witness::Witness::digest`].
pub fn to_bytes_le<F: PrimeField>(a: &F) -> Vec<u8> {
    a.into_bigint().to_bytes_le()
}
