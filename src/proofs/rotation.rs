//! The key rotation authorization proof.
//!
//! A holder re-encrypts their veiled balance from the old key pair
//! `(s_o, P_o)` to a new one `(s_n, P_n)` without changing the
//! plaintext. The proof shows that the old and new ciphertext vectors
//! encrypt the same aggregate value, that the new ciphertexts are well
//! formed under `P_n`, and that every re-encrypted chunk is back in
//! 32-bit range.
//!
//! Verifier checks, with `w_i = 2^(32 * i)` and challenge `chi`:
//!
//! ```text
//! (1) a1 * sum(w_i * D_i) - a2 * sum(w_i * D'_i)
//!         == X1 + chi * (sum(w_i * C_i) - sum(w_i * C'_i))
//! (2) a4_i * P_n          == X2_i + chi * D'_i
//! (3) a5_i * G + a4_i * H == X3_i + chi * C'_i
//! (4) a3 * H              == X4 + chi * P_o
//! ```
//!
//! Check (1) is the aggregate equality `s_o * D - s_n * D' = C - C'`,
//! which holds exactly when both vectors decrypt to the same value under
//! their respective keys.

use crate::{
    balance::EncryptedBalance,
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

/// The domain-separation tag of the key rotation sigma proof.
pub const ROTATION_PROOF_DST: &[u8] = b"AptosVeiledCoin/RotationProofFiatShamir";

/// The key rotation sigma proof. Fields are the wire layout.
#[derive(Clone, Copy, Encode, Decode, Debug, PartialEq, Eq)]
pub struct RotationSigmaProof {
    pub a1: WrappedScalar,
    pub a2: WrappedScalar,
    pub a3: WrappedScalar,
    pub a4: [WrappedScalar; BALANCE_CHUNKS],
    pub a5: [WrappedScalar; BALANCE_CHUNKS],
    pub x1: WrappedCompressedRistretto,
    pub x2: [WrappedCompressedRistretto; BALANCE_CHUNKS],
    pub x3: [WrappedCompressedRistretto; BALANCE_CHUNKS],
    pub x4: WrappedCompressedRistretto,
}

/// The key rotation authorization bundle.
#[derive(Clone, Encode, Decode, Debug)]
pub struct KeyRotationProof {
    pub sigma: RotationSigmaProof,
    pub new_balance_range: [InRangeProof; BALANCE_CHUNKS],
    pub new_balance: EncryptedBalance,
}

/// Witness randomness of one rotation; wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
struct RotationSecrets {
    randomness: [Scalar; BALANCE_CHUNKS],
    x1: Scalar,
    x2: Scalar,
    x3: Scalar,
    x4: [Scalar; BALANCE_CHUNKS],
    x5: [Scalar; BALANCE_CHUNKS],
}

/// Builder for one key rotation authorization.
pub struct KeyRotationProver {
    old_keys: ElgamalKeys,
    new_keys: ElgamalKeys,
    current_balance: EncryptedBalance,
    chunks: [u64; BALANCE_CHUNKS],
    new_balance: EncryptedBalance,
    secrets: RotationSecrets,
}

impl KeyRotationProver {
    /// Decrypt the balance under the old key and re-encrypt the same
    /// chunks under the new key with fresh randomness.
    pub fn new<R: RngCore + CryptoRng>(
        old_keys: &ElgamalKeys,
        new_keys: &ElgamalKeys,
        current_balance: &EncryptedBalance,
        rng: &mut R,
    ) -> Result<Self> {
        let chunks = current_balance.decrypt_chunks(&old_keys.secret)?;

        let randomness: [Scalar; BALANCE_CHUNKS] =
            core::array::from_fn(|_| Scalar::random(rng));
        let witnesses: [CommitmentWitness; BALANCE_CHUNKS] = core::array::from_fn(|i| {
            CommitmentWitness::new(Scalar::from(chunks[i]), randomness[i])
        });
        let new_balance = EncryptedBalance::encrypt_with(&new_keys.public, &witnesses);

        Ok(Self {
            old_keys: old_keys.clone(),
            new_keys: new_keys.clone(),
            current_balance: *current_balance,
            chunks,
            new_balance,
            secrets: RotationSecrets {
                randomness,
                x1: Scalar::random(rng),
                x2: Scalar::random(rng),
                x3: Scalar::random(rng),
                x4: core::array::from_fn(|_| Scalar::random(rng)),
                x5: core::array::from_fn(|_| Scalar::random(rng)),
            },
        })
    }

    pub fn new_balance(&self) -> &EncryptedBalance {
        &self.new_balance
    }

    fn sigma_proof(&self) -> RotationSigmaProof {
        let gens = PedersenGens::default();
        let new_pk = *self.new_keys.public.pub_key;
        let old_d_agg = aggregate_points(&self.current_balance.ds());
        let new_d_agg = aggregate_points(&self.new_balance.ds());
        let secrets = &self.secrets;

        let x1: WrappedCompressedRistretto =
            (secrets.x1 * old_d_agg - secrets.x2 * new_d_agg).into();
        let x2: [WrappedCompressedRistretto; BALANCE_CHUNKS] =
            core::array::from_fn(|i| (secrets.x4[i] * new_pk).into());
        let x3: [WrappedCompressedRistretto; BALANCE_CHUNKS] = core::array::from_fn(|i| {
            (secrets.x5[i] * gens.B + secrets.x4[i] * gens.B_blinding).into()
        });
        let x4: WrappedCompressedRistretto = (secrets.x3 * gens.B_blinding).into();

        let challenge = challenge(
            &self.old_keys.public,
            &self.new_keys.public,
            &self.current_balance,
            &self.new_balance,
            &x1,
            &x2,
            &x3,
            &x4,
        );

        let old_secret = self.old_keys.secret.secret();
        let new_secret = self.new_keys.secret.secret();

        RotationSigmaProof {
            a1: (secrets.x1 + challenge * old_secret).into(),
            a2: (secrets.x2 + challenge * new_secret).into(),
            a3: (secrets.x3 + challenge * old_secret.invert()).into(),
            a4: core::array::from_fn(|i| {
                (secrets.x4[i] + challenge * secrets.randomness[i]).into()
            }),
            a5: core::array::from_fn(|i| {
                (secrets.x5[i] + challenge * Scalar::from(self.chunks[i])).into()
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
            &self.chunks,
            &self.new_keys.secret.secret(),
            &self.new_balance,
            rng,
        )
    }
}

impl AuthorizationProver for KeyRotationProver {
    type SigmaProof = RotationSigmaProof;
    type RangeProofs = [InRangeProof; BALANCE_CHUNKS];
    type Authorization = KeyRotationProof;

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
        Ok(KeyRotationProof {
            sigma: self.sigma_proof(),
            new_balance_range: self.range_proofs(backend, rng)?,
            new_balance: self.new_balance,
        })
    }
}

impl KeyRotationProof {
    /// Verify the rotation against public inputs only.
    pub fn verify<B: RangeProofBackend, R: RngCore + CryptoRng>(
        &self,
        old_key: &ElgamalPublicKey,
        new_key: &ElgamalPublicKey,
        current_balance: &EncryptedBalance,
        backend: &B,
        rng: &mut R,
    ) -> Result<()> {
        let gens = PedersenGens::default();
        let sigma = &self.sigma;
        let chi = challenge(
            old_key,
            new_key,
            current_balance,
            &self.new_balance,
            &sigma.x1,
            &sigma.x2,
            &sigma.x3,
            &sigma.x4,
        );

        let new_pk = *new_key.pub_key;
        let old_d_agg = aggregate_points(&current_balance.ds());
        let old_c_agg = aggregate_points(&current_balance.cs());
        let new_d_agg = aggregate_points(&self.new_balance.ds());
        let new_c_agg = aggregate_points(&self.new_balance.cs());
        let new_cs = self.new_balance.cs();
        let new_ds = self.new_balance.ds();

        // (1) aggregate balance equality across the two keys.
        ensure!(
            *sigma.a1 * old_d_agg - *sigma.a2 * new_d_agg
                == sigma.x1.decompress() + chi * (old_c_agg - new_c_agg),
            Error::RotationProofVerificationError { check: 1 }
        );
        for i in 0..BALANCE_CHUNKS {
            // (2) new-balance decryption handles are under `P_n`.
            ensure!(
                *sigma.a4[i] * new_pk == sigma.x2[i].decompress() + chi * new_ds[i],
                Error::RotationProofVerificationError { check: 2 }
            );
            // (3) new-balance chunk openings.
            ensure!(
                *sigma.a5[i] * gens.B + *sigma.a4[i] * gens.B_blinding
                    == sigma.x3[i].decompress() + chi * new_cs[i],
                Error::RotationProofVerificationError { check: 3 }
            );
        }
        // (4) knowledge of the old key inverse.
        ensure!(
            *sigma.a3 * gens.B_blinding == sigma.x4.decompress() + chi * *old_key.pub_key,
            Error::RotationProofVerificationError { check: 4 }
        );

        verify_balance_chunks(backend, &self.new_balance_range, &self.new_balance, rng)
    }
}

/// Fiat-Shamir challenge over the declared absorption order.
fn challenge(
    old_key: &ElgamalPublicKey,
    new_key: &ElgamalPublicKey,
    current_balance: &EncryptedBalance,
    new_balance: &EncryptedBalance,
    x1: &WrappedCompressedRistretto,
    x2: &[WrappedCompressedRistretto; BALANCE_CHUNKS],
    x3: &[WrappedCompressedRistretto; BALANCE_CHUNKS],
    x4: &WrappedCompressedRistretto,
) -> Scalar {
    let mut transcript = FiatShamirTranscript::new(ROTATION_PROOF_DST);
    transcript.append_public_key(old_key);
    transcript.append_public_key(new_key);
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
    use crate::proofs::range_proof::BulletproofsBackend;
    use crate::Balance;
    use rand::{rngs::StdRng, SeedableRng};
    use wasm_bindgen_test::*;

    const SEED_1: [u8; 32] = [42u8; 32];

    fn setup(balance: Balance) -> (ElgamalKeys, ElgamalKeys, EncryptedBalance, StdRng) {
        let mut rng = StdRng::from_seed(SEED_1);
        let old_keys = ElgamalKeys::generate(&mut rng);
        let new_keys = ElgamalKeys::generate(&mut rng);
        let (_, enc_balance) = EncryptedBalance::encrypt(&old_keys.public, balance, &mut rng);
        (old_keys, new_keys, enc_balance, rng)
    }

    #[test]
    #[wasm_bindgen_test]
    fn rotate_and_verify() {
        let (old_keys, new_keys, enc_balance, mut rng) = setup(70);
        let backend = BulletproofsBackend;

        let prover =
            KeyRotationProver::new(&old_keys, &new_keys, &enc_balance, &mut rng).unwrap();
        let proof = prover.authorize(&backend, &mut rng).unwrap();

        proof
            .verify(
                &old_keys.public,
                &new_keys.public,
                &enc_balance,
                &backend,
                &mut rng,
            )
            .unwrap();

        // The new key decrypts the rotated balance.
        assert_eq!(proof.new_balance.decrypt(&new_keys.secret).unwrap(), 70);
        // The old key cannot locate the plaintext in a bounded window.
        assert_eq!(
            old_keys
                .secret
                .decrypt_with_hint(&proof.new_balance[0], 0, 1000),
            None
        );
    }

    #[test]
    #[wasm_bindgen_test]
    fn tampered_inputs_rejected() {
        let (old_keys, new_keys, enc_balance, mut rng) = setup(70);
        let backend = BulletproofsBackend;
        let prover =
            KeyRotationProver::new(&old_keys, &new_keys, &enc_balance, &mut rng).unwrap();
        let proof = prover.authorize(&backend, &mut rng).unwrap();

        // Keys swapped.
        assert!(proof
            .verify(
                &new_keys.public,
                &old_keys.public,
                &enc_balance,
                &backend,
                &mut rng,
            )
            .is_err());

        // Tampered response scalar.
        let mut bad = proof.clone();
        bad.sigma.a2 = (*bad.sigma.a2 + Scalar::ONE).into();
        assert_err!(
            bad.verify(
                &old_keys.public,
                &new_keys.public,
                &enc_balance,
                &backend,
                &mut rng,
            ),
            Error::RotationProofVerificationError { check: 1 }
        );
    }

    #[test]
    #[wasm_bindgen_test]
    fn sigma_proof_codec_roundtrip() {
        let (old_keys, new_keys, enc_balance, mut rng) = setup(70);
        let prover =
            KeyRotationProver::new(&old_keys, &new_keys, &enc_balance, &mut rng).unwrap();
        let sigma = prover.gen_sigma_proof();

        let bytes = sigma.encode();
        // 11 response scalars + 10 commitment points.
        assert_eq!(bytes.len(), 21 * 32);
        let decoded = RotationSigmaProof::decode(&mut bytes.as_slice()).unwrap();
        assert_eq!(decoded, sigma);
    }

    #[test]
    #[wasm_bindgen_test]
    fn bundle_codec_roundtrip() {
        let (old_keys, new_keys, enc_balance, mut rng) = setup(70);
        let backend = BulletproofsBackend;
        let prover =
            KeyRotationProver::new(&old_keys, &new_keys, &enc_balance, &mut rng).unwrap();
        let proof = prover.authorize(&backend, &mut rng).unwrap();

        let bytes = proof.encode();
        let decoded = KeyRotationProof::decode(&mut bytes.as_slice()).unwrap();
        assert_eq!(decoded.sigma, proof.sigma);
        assert_eq!(decoded.new_balance, proof.new_balance);
        assert_eq!(decoded.encode(), bytes);

        decoded
            .verify(
                &old_keys.public,
                &new_keys.public,
                &enc_balance,
                &backend,
                &mut rng,
            )
            .unwrap();
    }
}
