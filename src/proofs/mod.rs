//! The proofs library implements the four zero-knowledge authorization
//! proofs over veiled balances: withdrawal, transfer, key rotation, and
//! normalization. Each is a multi-statement sigma protocol made
//! non-interactive with a SHA-512 Fiat-Shamir challenge, paired with
//! per-chunk Bulletproofs range proofs.

use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar, traits::Identity};
use rand_core::{CryptoRng, RngCore};

use crate::{errors::Result, BALANCE_CHUNKS, CHUNK_BITS};

pub use bulletproofs;

pub mod transcript;

pub mod range_proof;

pub mod normalization;
pub mod rotation;
pub mod transfer;
pub mod withdrawal;

use self::range_proof::RangeProofBackend;

/// The positional weight `2^(32 * i)` of chunk `i`.
pub(crate) fn chunk_weight(i: usize) -> Scalar {
    Scalar::from(1u128 << (CHUNK_BITS as usize * i))
}

/// `sum(2^(32 * i) * scalars[i])`.
pub(crate) fn aggregate_scalars(scalars: &[Scalar; BALANCE_CHUNKS]) -> Scalar {
    scalars
        .iter()
        .enumerate()
        .map(|(i, scalar)| chunk_weight(i) * scalar)
        .sum()
}

/// `sum(2^(32 * i) * points[i])`.
pub(crate) fn aggregate_points(points: &[RistrettoPoint; BALANCE_CHUNKS]) -> RistrettoPoint {
    points
        .iter()
        .enumerate()
        .fold(RistrettoPoint::identity(), |acc, (i, point)| {
            acc + chunk_weight(i) * point
        })
}

/// The shared lifecycle of the four proof builders.
///
/// A builder is fully constructed by its `new` constructor: the current
/// balance is decrypted there, the new ciphertexts and all randomness
/// (including the sigma blinders) are derived up front. This makes
/// `gen_sigma_proof` a pure function of the builder - calling it twice
/// yields byte-identical proofs - and range proof generation independent
/// of it.
pub trait AuthorizationProver {
    type SigmaProof;
    type RangeProofs;
    type Authorization;

    /// Generate the sigma proof. Deterministic given the builder.
    fn gen_sigma_proof(&self) -> Self::SigmaProof;

    /// Generate the per-chunk range proofs.
    fn gen_range_proofs<B: RangeProofBackend, R: RngCore + CryptoRng>(
        &self,
        backend: &B,
        rng: &mut R,
    ) -> Result<Self::RangeProofs>;

    /// Run both and assemble the authorization bundle for the
    /// transaction-submission layer.
    fn authorize<B: RangeProofBackend, R: RngCore + CryptoRng>(
        &self,
        backend: &B,
        rng: &mut R,
    ) -> Result<Self::Authorization>;
}
