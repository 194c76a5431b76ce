//! The withdrawal authorization proof.
//!
//! A holder with veiled balance `B = (B_0..B_3)` under `P = s^-1 * H`
//! withdraws the public amount `a` by publishing replacement ciphertexts
//! `B'` of the new balance `v' = decrypt(B, s) - a` and proving, without
//! revealing `v'`:
//!
//! * the aggregate balance relation
//!   `sum(w_i * C_i) - a * G = v' * G + s * sum(w_i * D_i)`
//!   with `w_i = 2^(32 * i)`,
//! * knowledge of `s^-1` with `P = s^-1 * H`,
//! * that every `B'_i` is well formed under `P` and opens to the chunk
//!   `c'_i` of `v'`,
//! * per-chunk range proofs that each `c'_i` fits 32 bits.
//!
//! Verifier checks, with challenge `chi` over the transcript below:
//!
//! ```text
//! (1) a1 * G + a2 * sum(w_i * D_i) == X1 + chi * (sum(w_i * C_i) - a * G)
//! (2) a3_i * P                     == X2_i + chi * D'_i
//! (3) a4 * H                       == X3 + chi * P
//! (4) a5_i * G + a3_i * H          == X4_i + chi * C'_i
//! (5) a1                           == sum(w_i * a5_i)
//! ```
//!
//! Check (5) ties the aggregate balance response to the chunk openings;
//! the prover derives the `X1` blinder as the weighted sum of the chunk
//! blinders so that it holds.

use crate::{
    balance::{combine_chunks, split_balance, EncryptedBalance},
    codec_wrapper::{WrappedCompressedRistretto, WrappedScalar},
    elgamal::{CommitmentWitness, ElgamalPublicKey},
    errors::{Error, Result},
    proofs::{
        aggregate_points, aggregate_scalars,
        range_proof::{
            prove_balance_chunks, verify_balance_chunks, InRangeProof, RangeProofBackend,
        },
        transcript::FiatShamirTranscript,
        AuthorizationProver,
    },
    Balance, ElgamalKeys, BALANCE_CHUNKS,
};

use crate::dalek_ng_compat::PedersenGens;
use curve25519_dalek::scalar::Scalar;
use rand_core::{CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop};

use codec::{Decode, Encode};

/// The domain-separation tag of the withdrawal sigma proof.
pub const WITHDRAWAL_PROOF_DST: &[u8] = b"AptosVeiledCoin/WithdrawalSubproofFiatShamir";

/// The withdrawal sigma proof. Fields are the wire layout.
#[derive(Clone, Copy, Encode, Decode, Debug, PartialEq, Eq)]
pub struct WithdrawalSigmaProof {
    pub a1: WrappedScalar,
    pub a2: WrappedScalar,
    pub a3: [WrappedScalar; BALANCE_CHUNKS],
    pub a4: WrappedScalar,
    pub a5: [WrappedScalar; BALANCE_CHUNKS],
    pub x1: WrappedCompressedRistretto,
    pub x2: [WrappedCompressedRistretto; BALANCE_CHUNKS],
    pub x3: WrappedCompressedRistretto,
    pub x4: [WrappedCompressedRistretto; BALANCE_CHUNKS],
}

/// The withdrawal authorization bundle handed to the submission layer.
#[derive(Clone, Encode, Decode, Debug)]
pub struct WithdrawalProof {
    pub sigma: WithdrawalSigmaProof,
    pub new_balance_range: [InRangeProof; BALANCE_CHUNKS],
    pub new_balance: EncryptedBalance,
}

/// Witness randomness of one withdrawal; wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
struct WithdrawalSecrets {
    /// Fresh encryption randomness of the new balance chunks.
    randomness: [Scalar; BALANCE_CHUNKS],
    x1: Scalar,
    x2: Scalar,
    x3: [Scalar; BALANCE_CHUNKS],
    x4: Scalar,
    x5: [Scalar; BALANCE_CHUNKS],
}

/// Builder for one withdrawal authorization.
pub struct WithdrawalProver {
    keys: ElgamalKeys,
    current_balance: EncryptedBalance,
    amount: u64,
    new_chunks: [u64; BALANCE_CHUNKS],
    new_balance: EncryptedBalance,
    secrets: WithdrawalSecrets,
}

impl WithdrawalProver {
    /// Decrypt the current balance, derive the new chunked balance and
    /// all randomness. Fails with `NotEnoughFund` if `amount` exceeds
    /// the decrypted balance.
    pub fn new<R: RngCore + CryptoRng>(
        keys: &ElgamalKeys,
        current_balance: &EncryptedBalance,
        amount: u64,
        rng: &mut R,
    ) -> Result<Self> {
        let chunks = current_balance.decrypt_chunks(&keys.secret)?;
        let balance = combine_chunks(&chunks).ok_or(Error::PlainTextRangeError)?;
        ensure!(
            balance >= amount as Balance,
            Error::NotEnoughFund { balance, amount }
        );

        let new_chunks = split_balance(balance - amount as Balance);
        let randomness: [Scalar; BALANCE_CHUNKS] =
            core::array::from_fn(|_| Scalar::random(rng));
        let witnesses: [CommitmentWitness; BALANCE_CHUNKS] = core::array::from_fn(|i| {
            CommitmentWitness::new(Scalar::from(new_chunks[i]), randomness[i])
        });
        let new_balance = EncryptedBalance::encrypt_with(&keys.public, &witnesses);

        let x2 = Scalar::random(rng);
        let x3: [Scalar; BALANCE_CHUNKS] = core::array::from_fn(|_| Scalar::random(rng));
        let x4 = Scalar::random(rng);
        let x5: [Scalar; BALANCE_CHUNKS] = core::array::from_fn(|_| Scalar::random(rng));
        // Verifier check (5) requires the aggregate blinder to be the
        // weighted sum of the chunk blinders.
        let x1 = aggregate_scalars(&x5);

        Ok(Self {
            keys: keys.clone(),
            current_balance: *current_balance,
            amount,
            new_chunks,
            new_balance,
            secrets: WithdrawalSecrets {
                randomness,
                x1,
                x2,
                x3,
                x4,
                x5,
            },
        })
    }

    /// The new balance ciphertexts that accompany the proof.
    pub fn new_balance(&self) -> &EncryptedBalance {
        &self.new_balance
    }

    fn sigma_proof(&self) -> WithdrawalSigmaProof {
        let gens = PedersenGens::default();
        let pub_key = *self.keys.public.pub_key;
        let d_agg = aggregate_points(&self.current_balance.ds());
        let secrets = &self.secrets;

        let x1: WrappedCompressedRistretto =
            (secrets.x1 * gens.B + secrets.x2 * d_agg).into();
        let x2: [WrappedCompressedRistretto; BALANCE_CHUNKS] =
            core::array::from_fn(|i| (secrets.x3[i] * pub_key).into());
        let x3: WrappedCompressedRistretto = (secrets.x4 * gens.B_blinding).into();
        let x4: [WrappedCompressedRistretto; BALANCE_CHUNKS] = core::array::from_fn(|i| {
            (secrets.x5[i] * gens.B + secrets.x3[i] * gens.B_blinding).into()
        });

        let challenge = challenge(
            &self.keys.public,
            self.amount,
            &self.current_balance,
            &self.new_balance,
            &x1,
            &x2,
            &x3,
            &x4,
        );

        let secret = self.keys.secret.secret();
        let new_balance = combine_chunks(&self.new_chunks).unwrap_or_default();

        WithdrawalSigmaProof {
            a1: (secrets.x1 + challenge * Scalar::from(new_balance)).into(),
            a2: (secrets.x2 + challenge * secret).into(),
            a3: core::array::from_fn(|i| {
                (secrets.x3[i] + challenge * secrets.randomness[i]).into()
            }),
            a4: (secrets.x4 + challenge * secret.invert()).into(),
            a5: core::array::from_fn(|i| {
                (secrets.x5[i] + challenge * Scalar::from(self.new_chunks[i])).into()
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

impl AuthorizationProver for WithdrawalProver {
    type SigmaProof = WithdrawalSigmaProof;
    type RangeProofs = [InRangeProof; BALANCE_CHUNKS];
    type Authorization = WithdrawalProof;

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
        Ok(WithdrawalProof {
            sigma: self.sigma_proof(),
            new_balance_range: self.range_proofs(backend, rng)?,
            new_balance: self.new_balance,
        })
    }
}

impl WithdrawalProof {
    /// Verify the withdrawal against public inputs only.
    pub fn verify<B: RangeProofBackend, R: RngCore + CryptoRng>(
        &self,
        pub_key: &ElgamalPublicKey,
        current_balance: &EncryptedBalance,
        amount: u64,
        backend: &B,
        rng: &mut R,
    ) -> Result<()> {
        let gens = PedersenGens::default();
        let sigma = &self.sigma;
        let chi = challenge(
            pub_key,
            amount,
            current_balance,
            &self.new_balance,
            &sigma.x1,
            &sigma.x2,
            &sigma.x3,
            &sigma.x4,
        );

        let pk = *pub_key.pub_key;
        let d_agg = aggregate_points(&current_balance.ds());
        let c_agg = aggregate_points(&current_balance.cs());
        let new_cs = self.new_balance.cs();
        let new_ds = self.new_balance.ds();

        // (1) aggregate balance equation.
        ensure!(
            *sigma.a1 * gens.B + *sigma.a2 * d_agg
                == sigma.x1.decompress() + chi * (c_agg - Scalar::from(amount) * gens.B),
            Error::WithdrawalProofVerificationError { check: 1 }
        );
        // (2) new-balance decryption handles are under `P`.
        for i in 0..BALANCE_CHUNKS {
            ensure!(
                *sigma.a3[i] * pk == sigma.x2[i].decompress() + chi * new_ds[i],
                Error::WithdrawalProofVerificationError { check: 2 }
            );
        }
        // (3) knowledge of the key inverse.
        ensure!(
            *sigma.a4 * gens.B_blinding == sigma.x3.decompress() + chi * pk,
            Error::WithdrawalProofVerificationError { check: 3 }
        );
        // (4) new-balance chunk openings.
        for i in 0..BALANCE_CHUNKS {
            ensure!(
                *sigma.a5[i] * gens.B + *sigma.a3[i] * gens.B_blinding
                    == sigma.x4[i].decompress() + chi * new_cs[i],
                Error::WithdrawalProofVerificationError { check: 4 }
            );
        }
        // (5) aggregate response matches the weighted chunk responses.
        let a5: [Scalar; BALANCE_CHUNKS] = core::array::from_fn(|i| *sigma.a5[i]);
        ensure!(
            *sigma.a1 == aggregate_scalars(&a5),
            Error::WithdrawalProofVerificationError { check: 5 }
        );

        verify_balance_chunks(backend, &self.new_balance_range, &self.new_balance, rng)
    }
}

/// Fiat-Shamir challenge over the declared absorption order.
#[allow(clippy::too_many_arguments)]
fn challenge(
    pub_key: &ElgamalPublicKey,
    amount: u64,
    current_balance: &EncryptedBalance,
    new_balance: &EncryptedBalance,
    x1: &WrappedCompressedRistretto,
    x2: &[WrappedCompressedRistretto; BALANCE_CHUNKS],
    x3: &WrappedCompressedRistretto,
    x4: &[WrappedCompressedRistretto; BALANCE_CHUNKS],
) -> Scalar {
    let mut transcript = FiatShamirTranscript::new(WITHDRAWAL_PROOF_DST);
    transcript.append_public_key(pub_key);
    transcript.append_scalar(&Scalar::from(amount));
    transcript.append_balance(current_balance);
    transcript.append_balance(new_balance);
    transcript.append_compressed(x1);
    for x in x2 {
        transcript.append_compressed(x);
    }
    transcript.append_compressed(x3);
    for x in x4 {
        transcript.append_compressed(x);
    }
    transcript.challenge()
}

// ------------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------------
