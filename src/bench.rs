//! Timing harnesses for the BN254 primitives underneath witness generation.

use std::hint::black_box;
use std::time::Instant;

use ark_bn254::{Fr, G1Affine, G1Projective};
use ark_ec::{AffineRepr, CurveGroup, VariableBaseMSM};
use ark_ff::{BigInt, PrimeField};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::error::MsmError;

/// Seed of the scalar generator used by [`time_multi_exp`].
pub const SCALAR_SEED: u64 = 0xAAAA_AAAA_AAAA_AAAA;

/// Byte width of a serialized BN254 scalar.
pub const SCALAR_BYTES: usize = 32;

/// Aggregates `Σ scalar_i · base_i` over the first `count` terms.
///
/// `scalars` holds `count` little-endian byte strings of `scalar_size` bytes
/// each, reduced modulo the scalar field order.
pub fn multi_exp(
    bases: &[G1Affine],
    scalars: &[u8],
    scalar_size: usize,
    count: usize,
) -> Result<G1Projective, MsmError> {
    if scalar_size == 0 {
        return Err(MsmError::ZeroScalarWidth);
    }
    if bases.len() < count || scalars.len() / scalar_size < count {
        return Err(MsmError::NotEnoughTerms {
            count,
            bases: bases.len(),
            scalars: scalars.len() / scalar_size,
        });
    }
    let scalars: Vec<Fr> = scalars
        .chunks_exact(scalar_size)
        .take(count)
        .map(Fr::from_le_bytes_mod_order)
        .collect();
    let bases = &bases[..count];
    // lengths are equal by construction
    Ok(G1Projective::msm_unchecked(bases, &scalars))
}

/// `x` bases where `b[0] = b[1] = G` and `b[i] = b[i-1] + b[i-2]`.
pub fn fibonacci_bases(x: usize) -> Vec<G1Affine> {
    let generator = G1Affine::generator().into_group();
    let mut points: Vec<G1Projective> = Vec::with_capacity(x);
    for i in 0..x {
        let next = if i < 2 {
            generator
        } else {
            points[i - 1] + points[i - 2]
        };
        points.push(next);
    }
    G1Projective::normalize_batch(&points)
}

/// `x` little-endian scalars of [`SCALAR_BYTES`] bytes, reproducible from `seed`.
pub fn random_scalars(x: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut bytes = vec![0u8; x * SCALAR_BYTES];
    rng.fill_bytes(&mut bytes);
    bytes
}

/// Squares a fixed scalar `n` times; returns the average nanoseconds per multiplication.
pub fn time_field_mul(n: u64) -> u128 {
    let mut a = Fr::new(BigInt::new([0xAAAA_AAAA; 4]));
    let start = Instant::now();
    for _ in 0..n {
        a = black_box(a * a);
    }
    black_box(a);
    start.elapsed().as_nanos() / u128::from(n.max(1))
}

/// Runs an `x`-term multi-exponentiation `n` times; returns the average nanoseconds per run.
pub fn time_multi_exp(x: usize, n: u64) -> Result<u128, MsmError> {
    let bases = fibonacci_bases(x);
    let scalars = random_scalars(x, SCALAR_SEED);
    let start = Instant::now();
    for _ in 0..n {
        let _point = black_box(multi_exp(&bases, &scalars, SCALAR_BYTES, x)?);
    }
    Ok(start.elapsed().as_nanos() / u128::from(n.max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ec::PrimeGroup;

    #[test]
    fn test_multi_exp_matches_naive_sum() {
        let bases = fibonacci_bases(5);
        let scalars = random_scalars(5, 7);
        let expected = bases
            .iter()
            .zip(scalars.chunks_exact(SCALAR_BYTES))
            .fold(G1Projective::default(), |acc, (base, bytes)| {
                acc + *base * Fr::from_le_bytes_mod_order(bytes)
            });
        assert_eq!(multi_exp(&bases, &scalars, SCALAR_BYTES, 5).unwrap(), expected);
    }

    #[test]
    fn test_fibonacci_bases() {
        let bases = fibonacci_bases(4);
        let g = G1Projective::generator();
        assert_eq!(bases[0], bases[1]);
        assert_eq!(bases[2].into_group(), g + g);
        assert_eq!(bases[3].into_group(), g * Fr::from(3u64));
    }

    #[test]
    fn test_small_scalars_and_prefix() {
        let bases = fibonacci_bases(3);
        // 1·G + 2·G, third term ignored
        let result = multi_exp(&bases, &[1, 2, 9], 1, 2).unwrap();
        assert_eq!(result, G1Projective::generator() * Fr::from(3u64));
    }

    #[test]
    fn test_rejects_short_inputs() {
        let bases = fibonacci_bases(2);
        assert_eq!(
            multi_exp(&bases, &[0u8; 64], SCALAR_BYTES, 3),
            Err(MsmError::NotEnoughTerms {
                count: 3,
                bases: 2,
                scalars: 2
            })
        );
        assert_eq!(multi_exp(&bases, &[], 0, 0), Err(MsmError::ZeroScalarWidth));
    }

    #[test]
    fn test_seeded_scalars_are_reproducible() {
        assert_eq!(random_scalars(3, 1), random_scalars(3, 1));
        assert_ne!(random_scalars(3, 1), random_scalars(3, 2));
        assert_eq!(random_scalars(3, 1).len(), 96);
    }
}
