//! Per-chunk range proofs over a pluggable Bulletproofs backend.
//!
//! Every proof commits to a chunk value `v` as `K = v * V + r * R` for
//! statement-specific bases `(V, R)`:
//!
//! * transfer-amount chunks use `(G, H)` with the encryption blinding,
//!   so `K` is the recipient ciphertext's `C` component;
//! * new-balance chunks use `(G, D_i)` with the holder's secret key as
//!   the blinding, exploiting `s * D_i = r_i * H` so that `K` is the
//!   chunk ciphertext's `C` component itself.
//!
//! The second choice is what binds range validity to the concrete
//! ciphertext: a range proof for one ciphertext cannot be replayed for
//! another.

use bulletproofs::{BulletproofGens, PedersenGens, RangeProof};
use curve25519_dalek::{
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
};
use merlin::Transcript;
use rand_core::{CryptoRng, RngCore};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    balance::EncryptedBalance,
    dalek_ng_compat::{
        from_ng_compressed, pedersen_base, pedersen_blinding_base, to_ng_compressed,
        to_ng_point, to_ng_scalar,
    },
    errors::Result,
    BALANCE_CHUNKS,
};

/// The domain label for the bulletproof range proofs.
pub const RANGE_PROOF_DST: &[u8] = b"AptosVeiledCoin/BulletproofRangeProof";

/// Bit width proven for every balance or amount chunk.
pub const CHUNK_RANGE_BITS: usize = 32;

/// Holds a non-interactive single-value range proof.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InRangeProof(pub RangeProof);

#[cfg(feature = "rayon")]
pub trait MaybeSync: Sync {}
#[cfg(feature = "rayon")]
impl<T: Sync> MaybeSync for T {}

#[cfg(not(feature = "rayon"))]
pub trait MaybeSync {}
#[cfg(not(feature = "rayon"))]
impl<T> MaybeSync for T {}

/// A single-value range proof engine with caller-chosen commitment bases.
///
/// The backend is passed to the provers as a plain dependency; the crate
/// holds no global mutable state.
pub trait RangeProofBackend: MaybeSync {
    /// Prove that `commitment = value * value_base + blinding * blinding_base`
    /// opens to `value` in `[0, 2^bit_size)`.
    fn prove_range<R: RngCore + CryptoRng>(
        &self,
        value: u64,
        blinding: &Scalar,
        value_base: &RistrettoPoint,
        blinding_base: &RistrettoPoint,
        bit_size: usize,
        rng: &mut R,
    ) -> Result<(InRangeProof, CompressedRistretto)>;

    /// Verify a proof against a commitment over the same bases.
    fn verify_range<R: RngCore + CryptoRng>(
        &self,
        proof: &InRangeProof,
        commitment: &CompressedRistretto,
        value_base: &RistrettoPoint,
        blinding_base: &RistrettoPoint,
        bit_size: usize,
        rng: &mut R,
    ) -> Result<()>;
}

/// The Bulletproofs-backed implementation.
#[derive(Clone, Copy, Default, Debug)]
pub struct BulletproofsBackend;

impl RangeProofBackend for BulletproofsBackend {
    fn prove_range<R: RngCore + CryptoRng>(
        &self,
        value: u64,
        blinding: &Scalar,
        value_base: &RistrettoPoint,
        blinding_base: &RistrettoPoint,
        bit_size: usize,
        rng: &mut R,
    ) -> Result<(InRangeProof, CompressedRistretto)> {
        let pc_gens = PedersenGens {
            B: to_ng_point(value_base),
            B_blinding: to_ng_point(blinding_base),
        };
        let bp_gens = BulletproofGens::new(bit_size, 1);
        let mut transcript = Transcript::new(RANGE_PROOF_DST);

        let (proof, commitment) = RangeProof::prove_single_with_rng(
            &bp_gens,
            &pc_gens,
            &mut transcript,
            value,
            &to_ng_scalar(blinding),
            bit_size,
            rng,
        )?;

        Ok((InRangeProof(proof), from_ng_compressed(commitment)))
    }

    fn verify_range<R: RngCore + CryptoRng>(
        &self,
        proof: &InRangeProof,
        commitment: &CompressedRistretto,
        value_base: &RistrettoPoint,
        blinding_base: &RistrettoPoint,
        bit_size: usize,
        rng: &mut R,
    ) -> Result<()> {
        let pc_gens = PedersenGens {
            B: to_ng_point(value_base),
            B_blinding: to_ng_point(blinding_base),
        };
        let bp_gens = BulletproofGens::new(bit_size, 1);
        let mut transcript = Transcript::new(RANGE_PROOF_DST);

        Ok(proof.0.verify_single_with_rng(
            &bp_gens,
            &pc_gens,
            &mut transcript,
            &to_ng_compressed(commitment),
            bit_size,
            rng,
        )?)
    }
}

/// Prove every chunk of a new balance in `[0, 2^32)`, bound to its
/// ciphertext via the `(G, D_i)` bases and the holder's secret key as
/// the blinding.
#[cfg(not(feature = "rayon"))]
pub(crate) fn prove_balance_chunks<B: RangeProofBackend, R: RngCore + CryptoRng>(
    backend: &B,
    chunks: &[u64; BALANCE_CHUNKS],
    secret: &Scalar,
    balance: &EncryptedBalance,
    rng: &mut R,
) -> Result<[InRangeProof; BALANCE_CHUNKS]> {
    let mut proofs = sp_std::vec::Vec::with_capacity(BALANCE_CHUNKS);
    for (chunk, cipher) in chunks.iter().zip(balance.ciphertexts().iter()) {
        let (proof, _commitment) = backend.prove_range(
            *chunk,
            secret,
            &pedersen_base(),
            &cipher.d,
            CHUNK_RANGE_BITS,
            rng,
        )?;
        proofs.push(proof);
    }
    Ok(proofs.try_into().expect("BALANCE_CHUNKS proofs"))
}

/// Parallel variant: the four chunks are independent tasks.
#[cfg(feature = "rayon")]
pub(crate) fn prove_balance_chunks<B: RangeProofBackend, R: RngCore + CryptoRng>(
    backend: &B,
    chunks: &[u64; BALANCE_CHUNKS],
    secret: &Scalar,
    balance: &EncryptedBalance,
    _rng: &mut R,
) -> Result<[InRangeProof; BALANCE_CHUNKS]> {
    use rayon::prelude::*;

    let proofs = chunks
        .par_iter()
        .zip(balance.ciphertexts().par_iter())
        .map(|(chunk, cipher)| {
            let (proof, _commitment) = backend.prove_range(
                *chunk,
                secret,
                &pedersen_base(),
                &cipher.d,
                CHUNK_RANGE_BITS,
                &mut rand::thread_rng(),
            )?;
            Ok(proof)
        })
        .collect::<Result<sp_std::vec::Vec<_>>>()?;
    Ok(proofs.try_into().expect("BALANCE_CHUNKS proofs"))
}

/// Verify the per-chunk proofs of a new balance against its ciphertexts.
pub(crate) fn verify_balance_chunks<B: RangeProofBackend, R: RngCore + CryptoRng>(
    backend: &B,
    proofs: &[InRangeProof; BALANCE_CHUNKS],
    balance: &EncryptedBalance,
    rng: &mut R,
) -> Result<()> {
    for (proof, cipher) in proofs.iter().zip(balance.ciphertexts().iter()) {
        backend.verify_range(
            proof,
            &cipher.c.compress(),
            &pedersen_base(),
            &cipher.d,
            CHUNK_RANGE_BITS,
            rng,
        )?;
    }
    Ok(())
}

/// Prove every chunk of a transfer amount in `[0, 2^32)` over the fixed
/// `(G, H)` bases; the commitments are the recipient ciphertexts' `C`
/// components.
pub(crate) fn prove_amount_chunks<B: RangeProofBackend, R: RngCore + CryptoRng>(
    backend: &B,
    chunks: &[u64; BALANCE_CHUNKS],
    blindings: &[Scalar; BALANCE_CHUNKS],
    rng: &mut R,
) -> Result<[InRangeProof; BALANCE_CHUNKS]> {
    let mut proofs = sp_std::vec::Vec::with_capacity(BALANCE_CHUNKS);
    for (chunk, blinding) in chunks.iter().zip(blindings.iter()) {
        let (proof, _commitment) = backend.prove_range(
            *chunk,
            blinding,
            &pedersen_base(),
            &pedersen_blinding_base(),
            CHUNK_RANGE_BITS,
            rng,
        )?;
        proofs.push(proof);
    }
    Ok(proofs.try_into().expect("BALANCE_CHUNKS proofs"))
}

/// Verify the per-chunk amount proofs against the recipient ciphertexts.
pub(crate) fn verify_amount_chunks<B: RangeProofBackend, R: RngCore + CryptoRng>(
    backend: &B,
    proofs: &[InRangeProof; BALANCE_CHUNKS],
    amount: &EncryptedBalance,
    rng: &mut R,
) -> Result<()> {
    for (proof, cipher) in proofs.iter().zip(amount.ciphertexts().iter()) {
        backend.verify_range(
            proof,
            &cipher.c.compress(),
            &pedersen_base(),
            &pedersen_blinding_base(),
            CHUNK_RANGE_BITS,
            rng,
        )?;
    }
    Ok(())
}

// ------------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    extern crate wasm_bindgen_test;
    use super::*;
    use crate::{balance::EncryptedBalance, ElgamalKeys};
    use rand::{rngs::StdRng, SeedableRng};
    use wasm_bindgen_test::*;

    const SEED_1: [u8; 32] = [42u8; 32];

    #[test]
    #[wasm_bindgen_test]
    fn basic_range_proof() {
        let mut rng = StdRng::from_seed(SEED_1);
        let backend = BulletproofsBackend;

        let value = 42u64;
        let blinding = Scalar::random(&mut rng);
        let (proof, commitment) = backend
            .prove_range(
                value,
                &blinding,
                &pedersen_base(),
                &pedersen_blinding_base(),
                CHUNK_RANGE_BITS,
                &mut rng,
            )
            .expect("Range proof");
        assert_eq!(
            commitment,
            crate::dalek_ng_compat::pedersen_commit(&Scalar::from(value), &blinding).compress()
        );
        assert!(backend
            .verify_range(
                &proof,
                &commitment,
                &pedersen_base(),
                &pedersen_blinding_base(),
                CHUNK_RANGE_BITS,
                &mut rng
            )
            .is_ok());

        // Negative test: secret value outside the allowed range.
        let large_value: u64 = u64::from(u32::MAX) + 3;
        let (bad_proof, bad_commitment) = backend
            .prove_range(
                large_value,
                &blinding,
                &pedersen_base(),
                &pedersen_blinding_base(),
                CHUNK_RANGE_BITS,
                &mut rng,
            )
            .expect("Range proof");
        assert!(backend
            .verify_range(
                &bad_proof,
                &bad_commitment,
                &pedersen_base(),
                &pedersen_blinding_base(),
                CHUNK_RANGE_BITS,
                &mut rng
            )
            .is_err());
    }

    #[test]
    #[wasm_bindgen_test]
    fn ciphertext_bound_range_proof() {
        let mut rng = StdRng::from_seed(SEED_1);
        let keys = ElgamalKeys::generate(&mut rng);
        let backend = BulletproofsBackend;

        // A new-balance chunk proof commits to the ciphertext itself:
        // C = v * G + s * D.
        let (_, balance) = EncryptedBalance::encrypt(&keys.public, 70, &mut rng);
        let chunks = [70u64, 0, 0, 0];
        let proofs = prove_balance_chunks(
            &backend,
            &chunks,
            &keys.secret.secret(),
            &balance,
            &mut rng,
        )
        .expect("Range proofs");
        assert!(verify_balance_chunks(&backend, &proofs, &balance, &mut rng).is_ok());

        // Rebinding the proofs to a different balance ciphertext fails.
        let (_, other) = EncryptedBalance::encrypt(&keys.public, 70, &mut rng);
        assert!(verify_balance_chunks(&backend, &proofs, &other, &mut rng).is_err());
    }
}
