//! The normalization authorization proof.
//!
//! On-chain homomorphic additions add ciphertexts chunk-wise, so chunk
//! plaintexts can drift past the 32-bit bound (into `[0, 2^64)`).
//! Normalization re-splits the balance into 32-bit chunks under the same
//! key and proves the plaintext is unchanged and every new chunk is back
//! in range. The shape mirrors key rotation with both keys equal.
//!
//! Verifier checks, with `w_i = 2^(32 * i)` and challenge `chi`:
//!
//! ```text
//! (1) a1 * sum(w_i * (D_i - D'_i)) == X1 + chi * sum(w_i * (C_i - C'_i))
//! (2) a3_i * P                     == X2_i + chi * D'_i
//! (3) a4_i * G + a3_i * H          == X3_i + chi * C'_i
//! (4) a2 * H                       == X4 + chi * P
//! ```

use crate::{
    balance::{combine_chunks, split_balance, EncryptedBalance},
    codec_wrapper::{WrappedCompressedRistretto, WrappedScalar},
    elgamal::{CommitmentWitness, ElgamalPublicKey},
    errors::{Error, Result},
    proofs::{
        aggregate_points,
        range_proof::{
            prove_balance_chunks, verify_balance_chunks, InRangeProof, RangeProofBackend,
        },
        transcript::FiatShamirTranscript,
        AuthorizationProver,
    },
    ElgamalKeys, BALANCE_CHUNKS,
};

use crate::dalek_ng_compat::PedersenGens;
use curve25519_dalek::scalar::Scalar;
use rand_core::{CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop};

use codec::{Decode, Encode};

/// The domain-separation tag of the normalization sigma proof.
pub const NORMALIZATION_PROOF_DST: &[u8] = b"AptosVeiledCoin/NormalizationProofFiatShamir";

/// The normalization sigma proof. Fields are the wire layout.
#[derive(Clone, Copy, Encode, Decode, Debug, PartialEq, Eq)]
pub struct NormalizationSigmaProof {
    pub a1: WrappedScalar,
    pub a2: WrappedScalar,
    pub a3: [WrappedScalar; BALANCE_CHUNKS],
    pub a4: [WrappedScalar; BALANCE_CHUNKS],
    pub x1: WrappedCompressedRistretto,
    pub x2: [WrappedCompressedRistretto; BALANCE_CHUNKS],
    pub x3: [WrappedCompressedRistretto; BALANCE_CHUNKS],
    pub x4: WrappedCompressedRistretto,
}

/// The normalization authorization bundle.
#[derive(Clone, Encode, Decode, Debug)]
pub struct NormalizationProof {
    pub sigma: NormalizationSigmaProof,
    pub new_balance_range: [InRangeProof; BALANCE_CHUNKS],
    pub new_balance: EncryptedBalance,
}

/// Witness randomness of one normalization; wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
struct NormalizationSecrets {
    randomness: [Scalar; BALANCE_CHUNKS],
    x1: Scalar,
    x2: Scalar,
    x3: [Scalar; BALANCE_CHUNKS],
    x4: [Scalar; BALANCE_CHUNKS],
}

/// Builder for one normalization authorization.
pub struct NormalizationProver {
    keys: ElgamalKeys,
    current_balance: EncryptedBalance,
    new_chunks: [u64; BALANCE_CHUNKS],
    new_balance: EncryptedBalance,
    secrets: NormalizationSecrets,
}

impl NormalizationProver {
    /// Decrypt the unnormalized balance and re-encrypt it with 32-bit
    /// chunks and fresh randomness.
    ///
    /// Overflowed chunks make the decryption window caller-dependent:
    /// `max_chunk` bounds the per-chunk search, e.g. `2 * CHUNK_SIZE`
    /// right after a rollover of two normalized balances.
    pub fn new<R: RngCore + CryptoRng>(
        keys: &ElgamalKeys,
        current_balance: &EncryptedBalance,
        max_chunk: u64,
        rng: &mut R,
    ) -> Result<Self> {
        let chunks = current_balance.decrypt_chunks_bounded(&keys.secret, max_chunk)?;
        let balance = combine_chunks(&chunks).ok_or(Error::PlainTextRangeError)?;
        let new_chunks = split_balance(balance);

        let randomness: [Scalar; BALANCE_CHUNKS] =
            core::array::from_fn(|_| Scalar::random(rng));
        let witnesses: [CommitmentWitness; BALANCE_CHUNKS] = core::array::from_fn(|i| {
            CommitmentWitness::new(Scalar::from(new_chunks[i]), randomness[i])
        });
        let new_balance = EncryptedBalance::encrypt_with(&keys.public, &witnesses);

        Ok(Self {
            keys: keys.clone(),
            current_balance: *current_balance,
            new_chunks,
            new_balance,
            secrets: NormalizationSecrets {
                randomness,
                x1: Scalar::random(rng),
                x2: Scalar::random(rng),
                x3: core::array::from_fn(|_| Scalar::random(rng)),
                x4: core::array::from_fn(|_| Scalar::random(rng)),
            },
        })
    }

    pub fn new_balance(&self) -> &EncryptedBalance {
        &self.new_balance
    }

    fn sigma_proof(&self) -> NormalizationSigmaProof {
        let gens = PedersenGens::default();
        let pub_key = *self.keys.public.pub_key;
        let d_agg_diff = aggregate_points(&self.current_balance.ds())
            - aggregate_points(&self.new_balance.ds());
        let secrets = &self.secrets;

        let x1: WrappedCompressedRistretto = (secrets.x1 * d_agg_diff).into();
        let x2: [WrappedCompressedRistretto; BALANCE_CHUNKS] =
            core::array::from_fn(|i| (secrets.x3[i] * pub_key).into());
        let x3: [WrappedCompressedRistretto; BALANCE_CHUNKS] = core::array::from_fn(|i| {
            (secrets.x4[i] * gens.B + secrets.x3[i] * gens.B_blinding).into()
        });
        let x4: WrappedCompressedRistretto = (secrets.x2 * gens.B_blinding).into();

        let challenge = challenge(
            &self.keys.public,
            &self.current_balance,
            &self.new_balance,
            &x1,
            &x2,
            &x3,
            &x4,
        );

        let secret = self.keys.secret.secret();

        NormalizationSigmaProof {
            a1: (secrets.x1 + challenge * secret).into(),
            a2: (secrets.x2 + challenge * secret.invert()).into(),
            a3: core::array::from_fn(|i| {
                (secrets.x3[i] + challenge * secrets.randomness[i]).into()
            }),
            a4: core::array::from_fn(|i| {
                (secrets.x4[i] + challenge * Scalar::from(self.new_chunks[i])).into()
            }),
            x1,
            x2,
            x3,
            x4,
        }
    }

    fn range_proofs<B: RangeProofBackend, R: RngCore + CryptoRng>(
        &self,
        backend: &B,
        rng: &mut R,
    ) -> Result<[InRangeProof; BALANCE_CHUNKS]> {
        prove_balance_chunks(
            backend,
            &self.new_chunks,
            &self.keys.secret.secret(),
            &self.new_balance,
            rng,
        )
    }
}

impl AuthorizationProver for NormalizationProver {
    type SigmaProof = NormalizationSigmaProof;
    type RangeProofs = [InRangeProof; BALANCE_CHUNKS];
    type Authorization = NormalizationProof;

    fn gen_sigma_proof(&self) -> Self::SigmaProof {
        self.sigma_proof()
    }

    fn gen_range_proofs<B: RangeProofBackend, R: RngCore + CryptoRng>(
        &self,
        backend: &B,
        rng: &mut R,
    ) -> Result<Self::RangeProofs> {
        self.range_proofs(backend, rng)
    }

    fn authorize<B: RangeProofBackend, R: RngCore + CryptoRng>(
        &self,
        backend: &B,
        rng: &mut R,
    ) -> Result<Self::Authorization> {
        Ok(NormalizationProof {
            sigma: self.sigma_proof(),
            new_balance_range: self.range_proofs(backend, rng)?,
            new_balance: self.new_balance,
        })
    }
}

impl NormalizationProof {
    /// Verify the normalization against public inputs only.
    pub fn verify<B: RangeProofBackend, R: RngCore + CryptoRng>(
        &self,
        pub_key: &ElgamalPublicKey,
        current_balance: &EncryptedBalance,
        backend: &B,
        rng: &mut R,
    ) -> Result<()> {
        let gens = PedersenGens::default();
        let sigma = &self.sigma;
        let chi = challenge(
            pub_key,
            current_balance,
            &self.new_balance,
            &sigma.x1,
            &sigma.x2,
            &sigma.x3,
            &sigma.x4,
        );

        let pk = *pub_key.pub_key;
        let d_agg_diff = aggregate_points(&current_balance.ds())
            - aggregate_points(&self.new_balance.ds());
        let c_agg_diff = aggregate_points(&current_balance.cs())
            - aggregate_points(&self.new_balance.cs());
        let new_cs = self.new_balance.cs();
        let new_ds = self.new_balance.ds();

        // (1) the two balances decrypt to the same value under `P`.
        ensure!(
            *sigma.a1 * d_agg_diff == sigma.x1.decompress() + chi * c_agg_diff,
            Error::NormalizationProofVerificationError { check: 1 }
        );
        for i in 0..BALANCE_CHUNKS {
            // (2) new-balance decryption handles are under `P`.
            ensure!(
                *sigma.a3[i] * pk == sigma.x2[i].decompress() + chi * new_ds[i],
                Error::NormalizationProofVerificationError { check: 2 }
            );
            // (3) new-balance chunk openings.
            ensure!(
                *sigma.a4[i] * gens.B + *sigma.a3[i] * gens.B_blinding
                    == sigma.x3[i].decompress() + chi * new_cs[i],
                Error::NormalizationProofVerificationError { check: 3 }
            );
        }
        // (4) knowledge of the key inverse.
        ensure!(
            *sigma.a2 * gens.B_blinding == sigma.x4.decompress() + chi * pk,
            Error::NormalizationProofVerificationError { check: 4 }
        );

        verify_balance_chunks(backend, &self.new_balance_range, &self.new_balance, rng)
    }
}

/// Fiat-Shamir challenge over the declared absorption order.
fn challenge(
    pub_key: &ElgamalPublicKey,
    current_balance: &EncryptedBalance,
    new_balance: &EncryptedBalance,
    x1: &WrappedCompressedRistretto,
    x2: &[WrappedCompressedRistretto; BALANCE_CHUNKS],
    x3: &[WrappedCompressedRistretto; BALANCE_CHUNKS],
    x4: &WrappedCompressedRistretto,
) -> Scalar {
    let mut transcript = FiatShamirTranscript::new(NORMALIZATION_PROOF_DST);
    transcript.append_public_key(pub_key);
    transcript.append_balance(current_balance);
    transcript.append_balance(new_balance);
    transcript.append_compressed(x1);
    for x in x2 {
        transcript.append_compressed(x);
    }
    for x in x3 {
        transcript.append_compressed(x);
    }
    transcript.append_compressed(x4);
    transcript.challenge()
}

// ------------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    extern crate wasm_bindgen_test;
    use super::*;
    use crate::{
        balance::is_normalized, proofs::range_proof::BulletproofsBackend, CHUNK_SIZE,
    };
    use rand::{rngs::StdRng, SeedableRng};
    use wasm_bindgen_test::*;

    const SEED_1: [u8; 32] = [42u8; 32];

    /// Encrypt explicit (possibly overflowed) chunk values.
    fn encrypt_chunks(
        keys: &ElgamalKeys,
        chunks: [u64; BALANCE_CHUNKS],
        rng: &mut StdRng,
    ) -> EncryptedBalance {
        let witnesses: [CommitmentWitness; BALANCE_CHUNKS] = core::array::from_fn(|i| {
            CommitmentWitness::new(Scalar::from(chunks[i]), Scalar::random(rng))
        });
        EncryptedBalance::encrypt_with(&keys.public, &witnesses)
    }

    #[test]
    #[wasm_bindgen_test]
    fn normalize_already_normalized() {
        let mut rng = StdRng::from_seed(SEED_1);
        let keys = ElgamalKeys::generate(&mut rng);
        let backend = BulletproofsBackend;
        let (_, enc_balance) = EncryptedBalance::encrypt(&keys.public, 70, &mut rng);

        let prover =
            NormalizationProver::new(&keys, &enc_balance, CHUNK_SIZE, &mut rng).unwrap();
        let proof = prover.authorize(&backend, &mut rng).unwrap();

        proof
            .verify(&keys.public, &enc_balance, &backend, &mut rng)
            .unwrap();
        assert_eq!(proof.new_balance.decrypt(&keys.secret).unwrap(), 70);
    }

    #[cfg(feature = "discrete_log")]
    #[test]
    fn normalize_overflowed_chunks() {
        let mut rng = StdRng::from_seed(SEED_1);
        let keys = ElgamalKeys::generate(&mut rng);
        let backend = BulletproofsBackend;

        // Chunks as left behind by a homomorphic rollover.
        let chunks = [CHUNK_SIZE + 100, CHUNK_SIZE + 200, CHUNK_SIZE + 300, 0];
        let expected = combine_chunks(&chunks).unwrap();
        let enc_balance = encrypt_chunks(&keys, chunks, &mut rng);

        let prover =
            NormalizationProver::new(&keys, &enc_balance, 2 * CHUNK_SIZE, &mut rng).unwrap();
        let proof = prover.authorize(&backend, &mut rng).unwrap();

        proof
            .verify(&keys.public, &enc_balance, &backend, &mut rng)
            .unwrap();

        let new_chunks = proof.new_balance.decrypt_chunks(&keys.secret).unwrap();
        assert!(is_normalized(&new_chunks));
        assert_eq!(combine_chunks(&new_chunks).unwrap(), expected);
    }

    #[test]
    #[wasm_bindgen_test]
    fn tampered_inputs_rejected() {
        let mut rng = StdRng::from_seed(SEED_1);
        let keys = ElgamalKeys::generate(&mut rng);
        let backend = BulletproofsBackend;
        let (_, enc_balance) = EncryptedBalance::encrypt(&keys.public, 70, &mut rng);

        let prover =
            NormalizationProver::new(&keys, &enc_balance, CHUNK_SIZE, &mut rng).unwrap();
        let proof = prover.authorize(&backend, &mut rng).unwrap();

        // Wrong public key.
        let other = ElgamalKeys::generate(&mut rng);
        assert!(proof
            .verify(&other.public, &enc_balance, &backend, &mut rng)
            .is_err());

        // Tampered response scalar.
        let mut bad = proof.clone();
        bad.sigma.a1 = (*bad.sigma.a1 + Scalar::ONE).into();
        assert_err!(
            bad.verify(&keys.public, &enc_balance, &backend, &mut rng),
            Error::NormalizationProofVerificationError { check: 1 }
        );
    }

    #[test]
    #[wasm_bindgen_test]
    fn sigma_proof_codec_roundtrip() {
        let mut rng = StdRng::from_seed(SEED_1);
        let keys = ElgamalKeys::generate(&mut rng);
        let (_, enc_balance) = EncryptedBalance::encrypt(&keys.public, 70, &mut rng);

        let prover =
            NormalizationProver::new(&keys, &enc_balance, CHUNK_SIZE, &mut rng).unwrap();
        let sigma = prover.gen_sigma_proof();

        let bytes = sigma.encode();
        // 10 response scalars + 10 commitment points.
        assert_eq!(bytes.len(), 20 * 32);
        let decoded = NormalizationSigmaProof::decode(&mut bytes.as_slice()).unwrap();
        assert_eq!(decoded, sigma);
    }

    #[test]
    #[wasm_bindgen_test]
    fn bundle_codec_roundtrip() {
        let mut rng = StdRng::from_seed(SEED_1);
        let keys = ElgamalKeys::generate(&mut rng);
        let backend = BulletproofsBackend;
        let (_, enc_balance) = EncryptedBalance::encrypt(&keys.public, 70, &mut rng);

        let prover =
            NormalizationProver::new(&keys, &enc_balance, CHUNK_SIZE, &mut rng).unwrap();
        let proof = prover.authorize(&backend, &mut rng).unwrap();

        let bytes = proof.encode();
        let decoded = NormalizationProof::decode(&mut bytes.as_slice()).unwrap();
        assert_eq!(decoded.sigma, proof.sigma);
        assert_eq!(decoded.new_balance, proof.new_balance);
        assert_eq!(decoded.encode(), bytes);

        decoded
            .verify(&keys.public, &enc_balance, &backend, &mut rng)
            .unwrap();
    }
}
