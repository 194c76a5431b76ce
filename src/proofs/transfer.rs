//! The veiled transfer authorization proof.
//!
//! The sender debits a hidden amount `a < 2^64` from their balance and
//! credits the recipient, optionally granting a set of auditors the
//! ability to decrypt the amount. Per chunk `i` a single fresh
//! randomness `r_i` is shared between
//!
//! * the sender's new balance ciphertext `B'_i = (c'_i G + r_i H, r_i P_s)`,
//! * the recipient ciphertext `E_i = (a_i G + r_i H, r_i P_r)`,
//! * every auditor's decryption handle `r_i * P_a`,
//!
//! so that one set of randomness responses binds all of them. The amount
//! is chunked like a balance with its upper two chunks zero.
//!
//! Verifier checks, with `w_i = 2^(32 * i)` and challenge `chi`:
//!
//! ```text
//! (1) a1 * G + a2 * sum(w_i * D_i) == X1 + chi * sum(w_i * C_i)
//! (2) a3_i * P_r                   == X2_i + chi * E_i.D
//! (3) a3_i * P_s                   == X3_i + chi * D'_i
//! (4) a4_i * G + a3_i * H          == X4_i + chi * E_i.C
//! (5) a5 * H                       == X5 + chi * P_s
//! (6) a6_i * G + a3_i * H          == X6_i + chi * C'_i
//! (7) a3_i * P_a(k)                == X7_(k,i) + chi * Da_(k,i)
//! (8) a1                           == sum(w_i * (a4_i + a6_i))
//! ```
//!
//! Check (8) ties the aggregate balance response to the amount and
//! new-balance chunk openings: the extracted old balance equals
//! `a + v'`.

use crate::{
    balance::{combine_chunks, split_balance, EncryptedAmount, EncryptedBalance},
    codec_wrapper::{WrappedCompressedRistretto, WrappedRistretto, WrappedScalar},
    elgamal::{CipherText, CommitmentWitness, ElgamalPublicKey},
    errors::{Error, Result},
    proofs::{
        aggregate_points, aggregate_scalars,
        range_proof::{
            prove_amount_chunks, prove_balance_chunks, verify_amount_chunks,
            verify_balance_chunks, InRangeProof, RangeProofBackend,
        },
        transcript::FiatShamirTranscript,
        AuthorizationProver,
    },
    Balance, ElgamalKeys, BALANCE_CHUNKS,
};

use crate::dalek_ng_compat::PedersenGens;
use curve25519_dalek::scalar::Scalar;
use rand_core::{CryptoRng, RngCore};
use sp_std::vec::Vec;
use zeroize::{Zeroize, ZeroizeOnDrop};

use codec::{Decode, Encode, Error as CodecError, Input, Output};

/// The domain-separation tag of the transfer sigma proof.
pub const TRANSFER_PROOF_DST: &[u8] = b"AptosVeiledCoin/TransferSubproofFiatShamir";

pub const MAX_AUDITORS: usize = 10;

/// One auditor's per-chunk decryption handles `r_i * P_a`.
#[derive(Clone, Copy, Encode, Decode, Debug, PartialEq, Eq)]
pub struct AuditorHandles(pub [WrappedRistretto; BALANCE_CHUNKS]);

/// The transfer sigma proof.
///
/// The wire layout is the base fields in declaration order followed by
/// the `x7` auditor commitments as a bare tail of 32-byte points, four
/// per auditor; a tail that is not a whole number of points is rejected
/// as malformed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferSigmaProof {
    pub a1: WrappedScalar,
    pub a2: WrappedScalar,
    pub a3: [WrappedScalar; BALANCE_CHUNKS],
    pub a4: [WrappedScalar; BALANCE_CHUNKS],
    pub a5: WrappedScalar,
    pub a6: [WrappedScalar; BALANCE_CHUNKS],
    pub x1: WrappedCompressedRistretto,
    pub x2: [WrappedCompressedRistretto; BALANCE_CHUNKS],
    pub x3: [WrappedCompressedRistretto; BALANCE_CHUNKS],
    pub x4: [WrappedCompressedRistretto; BALANCE_CHUNKS],
    pub x5: WrappedCompressedRistretto,
    pub x6: [WrappedCompressedRistretto; BALANCE_CHUNKS],
    pub x7: Vec<[WrappedCompressedRistretto; BALANCE_CHUNKS]>,
}

impl Encode for TransferSigmaProof {
    fn size_hint(&self) -> usize {
        (15 + 18 + BALANCE_CHUNKS * self.x7.len()) * 32
    }

    fn encode_to<W: Output + ?Sized>(&self, dest: &mut W) {
        self.a1.encode_to(dest);
        self.a2.encode_to(dest);
        self.a3.encode_to(dest);
        self.a4.encode_to(dest);
        self.a5.encode_to(dest);
        self.a6.encode_to(dest);
        self.x1.encode_to(dest);
        self.x2.encode_to(dest);
        self.x3.encode_to(dest);
        self.x4.encode_to(dest);
        self.x5.encode_to(dest);
        self.x6.encode_to(dest);
        // Auditor commitments ride as a bare tail, no length prefix.
        for handles in &self.x7 {
            handles.encode_to(dest);
        }
    }
}

impl TransferSigmaProof {
    /// Decode the fixed-layout base fields, leaving `x7` empty.
    fn decode_base<I: Input>(input: &mut I) -> Result<Self, CodecError> {
        let a1 = WrappedScalar::decode(input)?;
        let a2 = WrappedScalar::decode(input)?;
        let a3 = <[WrappedScalar; BALANCE_CHUNKS]>::decode(input)?;
        let a4 = <[WrappedScalar; BALANCE_CHUNKS]>::decode(input)?;
        let a5 = WrappedScalar::decode(input)?;
        let a6 = <[WrappedScalar; BALANCE_CHUNKS]>::decode(input)?;
        let x1 = WrappedCompressedRistretto::decode(input)?;
        let x2 = <[WrappedCompressedRistretto; BALANCE_CHUNKS]>::decode(input)?;
        let x3 = <[WrappedCompressedRistretto; BALANCE_CHUNKS]>::decode(input)?;
        let x4 = <[WrappedCompressedRistretto; BALANCE_CHUNKS]>::decode(input)?;
        let x5 = WrappedCompressedRistretto::decode(input)?;
        let x6 = <[WrappedCompressedRistretto; BALANCE_CHUNKS]>::decode(input)?;

        Ok(Self {
            a1,
            a2,
            a3,
            a4,
            a5,
            a6,
            x1,
            x2,
            x3,
            x4,
            x5,
            x6,
            x7: Vec::new(),
        })
    }

    /// Decode a sigma proof whose auditor count is known from context,
    /// consuming exactly `auditors` tail strides. Used when the proof is
    /// embedded in a larger encoding and the tail cannot run to the end
    /// of the input.
    fn decode_with_auditors<I: Input>(
        input: &mut I,
        auditors: usize,
    ) -> Result<Self, CodecError> {
        let mut proof = Self::decode_base(input)?;
        for _ in 0..auditors {
            proof
                .x7
                .push(<[WrappedCompressedRistretto; BALANCE_CHUNKS]>::decode(
                    input,
                )?);
        }
        Ok(proof)
    }
}

impl Decode for TransferSigmaProof {
    /// Raw proof bytes: the auditor commitments are the terminal tail,
    /// consumed in 4-point strides until the input is exhausted.
    fn decode<I: Input>(input: &mut I) -> Result<Self, CodecError> {
        let mut proof = Self::decode_base(input)?;
        while let Some(remaining) = input.remaining_len()? {
            if remaining == 0 {
                break;
            }
            proof
                .x7
                .push(<[WrappedCompressedRistretto; BALANCE_CHUNKS]>::decode(
                    input,
                )?);
        }
        Ok(proof)
    }
}

/// The per-chunk range proofs of one transfer.
#[derive(Clone, Encode, Decode, Debug)]
pub struct TransferRangeProofs {
    /// Transfer amount chunks over `(G, H)`.
    pub amount: [InRangeProof; BALANCE_CHUNKS],
    /// Sender new-balance chunks over `(G, D'_i)`.
    pub new_balance: [InRangeProof; BALANCE_CHUNKS],
}

/// The transfer authorization bundle handed to the submission layer.
#[derive(Clone, Debug)]
pub struct TransferProof {
    pub sigma: TransferSigmaProof,
    pub range: TransferRangeProofs,
    /// Sender's replacement balance ciphertexts.
    pub new_balance: EncryptedBalance,
    /// Amount ciphertexts under the recipient key.
    pub recipient_amount: EncryptedAmount,
    /// Per-auditor decryption handles, in auditor order.
    pub auditor_handles: Vec<AuditorHandles>,
}

// The sigma proof's auditor tail carries no length prefix, so the
// bundle encoding leads with the auditor handles: their count tells the
// decoder how many tail strides belong to the sigma proof.

impl Encode for TransferProof {
    fn size_hint(&self) -> usize {
        self.auditor_handles.size_hint()
            + self.sigma.size_hint()
            + self.range.size_hint()
            + self.new_balance.size_hint()
            + self.recipient_amount.size_hint()
    }

    fn encode_to<W: Output + ?Sized>(&self, dest: &mut W) {
        self.auditor_handles.encode_to(dest);
        self.sigma.encode_to(dest);
        self.range.encode_to(dest);
        self.new_balance.encode_to(dest);
        self.recipient_amount.encode_to(dest);
    }
}

impl Decode for TransferProof {
    fn decode<I: Input>(input: &mut I) -> Result<Self, CodecError> {
        let auditor_handles = <Vec<AuditorHandles>>::decode(input)?;
        let sigma = TransferSigmaProof::decode_with_auditors(input, auditor_handles.len())?;
        let range = TransferRangeProofs::decode(input)?;
        let new_balance = EncryptedBalance::decode(input)?;
        let recipient_amount = EncryptedAmount::decode(input)?;
        Ok(Self {
            sigma,
            range,
            new_balance,
            recipient_amount,
            auditor_handles,
        })
    }
}

/// Witness randomness of one transfer; wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
struct TransferSecrets {
    /// Shared per-chunk randomness of new balance, recipient amount and
    /// auditor handles.
    randomness: [Scalar; BALANCE_CHUNKS],
    x1: Scalar,
    x2: Scalar,
    x3: [Scalar; BALANCE_CHUNKS],
    x4: [Scalar; BALANCE_CHUNKS],
    x5: Scalar,
    x6: [Scalar; BALANCE_CHUNKS],
}

/// Builder for one transfer authorization.
pub struct TransferProver {
    keys: ElgamalKeys,
    recipient: ElgamalPublicKey,
    auditors: Vec<ElgamalPublicKey>,
    current_balance: EncryptedBalance,
    amount_chunks: [u64; BALANCE_CHUNKS],
    new_chunks: [u64; BALANCE_CHUNKS],
    new_balance: EncryptedBalance,
    recipient_amount: EncryptedAmount,
    auditor_handles: Vec<AuditorHandles>,
    secrets: TransferSecrets,
}

impl TransferProver {
    /// Decrypt the sender's balance and derive the transfer ciphertexts.
    ///
    /// Fails with `NotEnoughFund` if `amount` exceeds the balance and
    /// with `TooManyAuditors` past the auditor limit.
    pub fn new<R: RngCore + CryptoRng>(
        keys: &ElgamalKeys,
        current_balance: &EncryptedBalance,
        recipient: &ElgamalPublicKey,
        auditors: &[ElgamalPublicKey],
        amount: u64,
        rng: &mut R,
    ) -> Result<Self> {
        ensure!(auditors.len() <= MAX_AUDITORS, Error::TooManyAuditors);

        let chunks = current_balance.decrypt_chunks(&keys.secret)?;
        let balance = combine_chunks(&chunks).ok_or(Error::PlainTextRangeError)?;
        ensure!(
            balance >= amount as Balance,
            Error::NotEnoughFund { balance, amount }
        );

        // The amount occupies the two low chunks; the upper two encrypt zero.
        let amount_chunks = split_balance(amount as Balance);
        let new_chunks = split_balance(balance - amount as Balance);

        // Randomness is drawn before any ciphertext is formed; the same
        // r_i feeds the new balance, the recipient ciphertext and every
        // auditor handle of chunk i.
        let randomness: [Scalar; BALANCE_CHUNKS] =
            core::array::from_fn(|_| Scalar::random(rng));

        let new_witnesses: [CommitmentWitness; BALANCE_CHUNKS] = core::array::from_fn(|i| {
            CommitmentWitness::new(Scalar::from(new_chunks[i]), randomness[i])
        });
        let new_balance = EncryptedBalance::encrypt_with(&keys.public, &new_witnesses);

        let amount_witnesses: [CommitmentWitness; BALANCE_CHUNKS] = core::array::from_fn(|i| {
            CommitmentWitness::new(Scalar::from(amount_chunks[i]), randomness[i])
        });
        let recipient_amount = EncryptedBalance::encrypt_with(recipient, &amount_witnesses);

        let auditor_handles = auditors
            .iter()
            .map(|auditor| {
                AuditorHandles(core::array::from_fn(|i| {
                    (randomness[i] * *auditor.pub_key).into()
                }))
            })
            .collect();

        let x2 = Scalar::random(rng);
        let x3: [Scalar; BALANCE_CHUNKS] = core::array::from_fn(|_| Scalar::random(rng));
        let x4: [Scalar; BALANCE_CHUNKS] = core::array::from_fn(|_| Scalar::random(rng));
        let x5 = Scalar::random(rng);
        let x6: [Scalar; BALANCE_CHUNKS] = core::array::from_fn(|_| Scalar::random(rng));
        // Verifier check (8) requires the aggregate blinder to be the
        // weighted sum of the amount and new-balance chunk blinders.
        let x1 = aggregate_scalars(&core::array::from_fn(|i| x4[i] + x6[i]));

        Ok(Self {
            keys: keys.clone(),
            recipient: *recipient,
            auditors: auditors.to_vec(),
            current_balance: *current_balance,
            amount_chunks,
            new_chunks,
            new_balance,
            recipient_amount,
            auditor_handles,
            secrets: TransferSecrets {
                randomness,
                x1,
                x2,
                x3,
                x4,
                x5,
                x6,
            },
        })
    }

    pub fn new_balance(&self) -> &EncryptedBalance {
        &self.new_balance
    }

    pub fn recipient_amount(&self) -> &EncryptedAmount {
        &self.recipient_amount
    }

    fn sigma_proof(&self) -> TransferSigmaProof {
        let gens = PedersenGens::default();
        let sender_pk = *self.keys.public.pub_key;
        let recipient_pk = *self.recipient.pub_key;
        let d_agg = aggregate_points(&self.current_balance.ds());
        let secrets = &self.secrets;

        let x1: WrappedCompressedRistretto =
            (secrets.x1 * gens.B + secrets.x2 * d_agg).into();
        let x2: [WrappedCompressedRistretto; BALANCE_CHUNKS] =
            core::array::from_fn(|i| (secrets.x3[i] * recipient_pk).into());
        let x3: [WrappedCompressedRistretto; BALANCE_CHUNKS] =
            core::array::from_fn(|i| (secrets.x3[i] * sender_pk).into());
        let x4: [WrappedCompressedRistretto; BALANCE_CHUNKS] = core::array::from_fn(|i| {
            (secrets.x4[i] * gens.B + secrets.x3[i] * gens.B_blinding).into()
        });
        let x5: WrappedCompressedRistretto = (secrets.x5 * gens.B_blinding).into();
        let x6: [WrappedCompressedRistretto; BALANCE_CHUNKS] = core::array::from_fn(|i| {
            (secrets.x6[i] * gens.B + secrets.x3[i] * gens.B_blinding).into()
        });
        let x7: Vec<[WrappedCompressedRistretto; BALANCE_CHUNKS]> = self
            .auditors
            .iter()
            .map(|auditor| {
                core::array::from_fn(|i| (secrets.x3[i] * *auditor.pub_key).into())
            })
            .collect();

        let challenge = challenge(
            &self.keys.public,
            &self.recipient,
            &self.current_balance,
            &self.new_balance,
            &self.recipient_amount,
            &self.auditor_handles,
            &x1,
            &x2,
            &x3,
            &x4,
            &x5,
            &x6,
            &x7,
        );

        let secret = self.keys.secret.secret();
        let balance = combine_chunks(&core::array::from_fn(|i| {
            self.amount_chunks[i] + self.new_chunks[i]
        }))
        .unwrap_or_default();

        TransferSigmaProof {
            a1: (secrets.x1 + challenge * Scalar::from(balance)).into(),
            a2: (secrets.x2 + challenge * secret).into(),
            a3: core::array::from_fn(|i| {
                (secrets.x3[i] + challenge * secrets.randomness[i]).into()
            }),
            a4: core::array::from_fn(|i| {
                (secrets.x4[i] + challenge * Scalar::from(self.amount_chunks[i])).into()
            }),
            a5: (secrets.x5 + challenge * secret.invert()).into(),
            a6: core::array::from_fn(|i| {
                (secrets.x6[i] + challenge * Scalar::from(self.new_chunks[i])).into()
            }),
            x1,
            x2,
            x3,
            x4,
            x5,
            x6,
            x7,
        }
    }

    fn range_proofs<B: RangeProofBackend, R: RngCore + CryptoRng>(
        &self,
        backend: &B,
        rng: &mut R,
    ) -> Result<TransferRangeProofs> {
        let amount = prove_amount_chunks(
            backend,
            &self.amount_chunks,
            &self.secrets.randomness,
            rng,
        )?;
        let new_balance = prove_balance_chunks(
            backend,
            &self.new_chunks,
            &self.keys.secret.secret(),
            &self.new_balance,
            rng,
        )?;
        Ok(TransferRangeProofs {
            amount,
            new_balance,
        })
    }
}

impl AuthorizationProver for TransferProver {
    type SigmaProof = TransferSigmaProof;
    type RangeProofs = TransferRangeProofs;
    type Authorization = TransferProof;

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
        Ok(TransferProof {
            sigma: self.sigma_proof(),
            range: self.range_proofs(backend, rng)?,
            new_balance: self.new_balance,
            recipient_amount: self.recipient_amount,
            auditor_handles: self.auditor_handles.clone(),
        })
    }
}

impl TransferProof {
    /// Verify the transfer against public inputs only.
    pub fn verify<B: RangeProofBackend, R: RngCore + CryptoRng>(
        &self,
        sender: &ElgamalPublicKey,
        recipient: &ElgamalPublicKey,
        auditors: &[ElgamalPublicKey],
        current_balance: &EncryptedBalance,
        backend: &B,
        rng: &mut R,
    ) -> Result<()> {
        let gens = PedersenGens::default();
        let sigma = &self.sigma;

        ensure!(
            auditors.len() == self.auditor_handles.len()
                && auditors.len() == sigma.x7.len(),
            Error::WrongNumberOfAuditors
        );

        let chi = challenge(
            sender,
            recipient,
            current_balance,
            &self.new_balance,
            &self.recipient_amount,
            &self.auditor_handles,
            &sigma.x1,
            &sigma.x2,
            &sigma.x3,
            &sigma.x4,
            &sigma.x5,
            &sigma.x6,
            &sigma.x7,
        );

        let sender_pk = *sender.pub_key;
        let recipient_pk = *recipient.pub_key;
        let d_agg = aggregate_points(&current_balance.ds());
        let c_agg = aggregate_points(&current_balance.cs());
        let new_cs = self.new_balance.cs();
        let new_ds = self.new_balance.ds();
        let amount_cs = self.recipient_amount.cs();
        let amount_ds = self.recipient_amount.ds();

        // (1) aggregate balance equation.
        ensure!(
            *sigma.a1 * gens.B + *sigma.a2 * d_agg
                == sigma.x1.decompress() + chi * c_agg,
            Error::TransferProofVerificationError { check: 1 }
        );
        for i in 0..BALANCE_CHUNKS {
            // (2) recipient decryption handles share the randomness.
            ensure!(
                *sigma.a3[i] * recipient_pk == sigma.x2[i].decompress() + chi * amount_ds[i],
                Error::TransferProofVerificationError { check: 2 }
            );
            // (3) sender new-balance handles share the randomness.
            ensure!(
                *sigma.a3[i] * sender_pk == sigma.x3[i].decompress() + chi * new_ds[i],
                Error::TransferProofVerificationError { check: 3 }
            );
            // (4) amount chunk openings.
            ensure!(
                *sigma.a4[i] * gens.B + *sigma.a3[i] * gens.B_blinding
                    == sigma.x4[i].decompress() + chi * amount_cs[i],
                Error::TransferProofVerificationError { check: 4 }
            );
        }
        // (5) knowledge of the sender key inverse.
        ensure!(
            *sigma.a5 * gens.B_blinding == sigma.x5.decompress() + chi * sender_pk,
            Error::TransferProofVerificationError { check: 5 }
        );
        // (6) new-balance chunk openings.
        for i in 0..BALANCE_CHUNKS {
            ensure!(
                *sigma.a6[i] * gens.B + *sigma.a3[i] * gens.B_blinding
                    == sigma.x6[i].decompress() + chi * new_cs[i],
                Error::TransferProofVerificationError { check: 6 }
            );
        }
        // (7) auditor handles share the randomness.
        for (k, auditor) in auditors.iter().enumerate() {
            let handles = &self.auditor_handles[k].0;
            for i in 0..BALANCE_CHUNKS {
                ensure!(
                    *sigma.a3[i] * *auditor.pub_key
                        == sigma.x7[k][i].decompress() + chi * *handles[i],
                    Error::TransferProofVerificationError { check: 7 }
                );
            }
        }
        // (8) aggregate response matches amount plus new-balance chunks.
        let a4: [Scalar; BALANCE_CHUNKS] = core::array::from_fn(|i| *sigma.a4[i]);
        let a6: [Scalar; BALANCE_CHUNKS] = core::array::from_fn(|i| *sigma.a6[i]);
        ensure!(
            *sigma.a1
                == aggregate_scalars(&core::array::from_fn(|i| a4[i] + a6[i])),
            Error::TransferProofVerificationError { check: 8 }
        );

        verify_amount_chunks(backend, &self.range.amount, &self.recipient_amount, rng)?;
        verify_balance_chunks(backend, &self.range.new_balance, &self.new_balance, rng)
    }

    /// Assemble the ciphertexts auditor `index` can decrypt: the amount
    /// `C` components paired with that auditor's decryption handles.
    pub fn auditor_ciphertexts(&self, index: usize) -> Result<EncryptedAmount> {
        let handles = self
            .auditor_handles
            .get(index)
            .ok_or(Error::WrongNumberOfAuditors)?;
        let ciphers: [CipherText; BALANCE_CHUNKS] = core::array::from_fn(|i| CipherText {
            c: self.recipient_amount[i].c,
            d: handles.0[i],
        });
        Ok(EncryptedBalance(ciphers))
    }
}

/// Fiat-Shamir challenge over the declared absorption order.
#[allow(clippy::too_many_arguments)]
fn challenge(
    sender: &ElgamalPublicKey,
    recipient: &ElgamalPublicKey,
    current_balance: &EncryptedBalance,
    new_balance: &EncryptedBalance,
    recipient_amount: &EncryptedAmount,
    auditor_handles: &[AuditorHandles],
    x1: &WrappedCompressedRistretto,
    x2: &[WrappedCompressedRistretto; BALANCE_CHUNKS],
    x3: &[WrappedCompressedRistretto; BALANCE_CHUNKS],
    x4: &[WrappedCompressedRistretto; BALANCE_CHUNKS],
    x5: &WrappedCompressedRistretto,
    x6: &[WrappedCompressedRistretto; BALANCE_CHUNKS],
    x7: &[[WrappedCompressedRistretto; BALANCE_CHUNKS]],
) -> Scalar {
    let mut transcript = FiatShamirTranscript::new(TRANSFER_PROOF_DST);
    transcript.append_public_key(sender);
    transcript.append_public_key(recipient);
    transcript.append_balance(current_balance);
    transcript.append_balance(new_balance);
    transcript.append_balance(recipient_amount);
    for handles in auditor_handles {
        for handle in &handles.0 {
            transcript.append_point(handle);
        }
    }
    transcript.append_compressed(x1);
    for x in x2 {
        transcript.append_compressed(x);
    }
    for x in x3 {
        transcript.append_compressed(x);
    }
    for x in x4 {
        transcript.append_compressed(x);
    }
    transcript.append_compressed(x5);
    for x in x6 {
        transcript.append_compressed(x);
    }
    for handles in x7 {
        for x in handles {
            transcript.append_compressed(x);
        }
    }
    transcript.challenge()
}

// ------------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------------
