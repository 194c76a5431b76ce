//! Chunked representation of veiled balances.
//!
//! A 128-bit balance `v` is split into [`BALANCE_CHUNKS`] chunks of
//! [`CHUNK_BITS`] bits, `v = sum(chunk_i * 2^(32 * i))`, and every chunk
//! is encrypted under its own blinding. A balance is *normalized* when
//! every chunk fits the 32-bit bound; on-chain homomorphic additions can
//! overflow chunks into `[0, 2^64)`, which the normalization proof
//! repairs.

use crate::{
    elgamal::{CipherText, CommitmentWitness, ElgamalPublicKey, ElgamalSecretKey},
    errors::Result,
    Balance, BALANCE_CHUNKS, CHUNK_BITS, CHUNK_SIZE,
};

use core::ops::{Add, AddAssign, Index, Sub, SubAssign};
use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar};
use rand_core::{CryptoRng, RngCore};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use codec::{Decode, Encode};

/// Split a balance into its 32-bit chunks, least significant first.
pub fn split_balance(value: Balance) -> [u64; BALANCE_CHUNKS] {
    let mut chunks = [0u64; BALANCE_CHUNKS];
    for (i, chunk) in chunks.iter_mut().enumerate() {
        *chunk = ((value >> (CHUNK_BITS * i as u32)) as u64) & (CHUNK_SIZE - 1);
    }
    chunks
}

/// Recombine chunks into a balance by positional weighting.
///
/// Returns `None` if the weighted sum overflows 128 bits, which can only
/// happen for unnormalized high chunks.
pub fn combine_chunks(chunks: &[u64; BALANCE_CHUNKS]) -> Option<Balance> {
    let mut value: Balance = 0;
    for (i, chunk) in chunks.iter().enumerate() {
        let weighted = (*chunk as Balance).checked_shl(CHUNK_BITS * i as u32)?;
        // `checked_shl` doesn't catch bits shifted out.
        if weighted >> (CHUNK_BITS * i as u32) != *chunk as Balance {
            return None;
        }
        value = value.checked_add(weighted)?;
    }
    Some(value)
}

/// Whether every chunk fits the 32-bit chunk bound.
pub fn is_normalized(chunks: &[u64; BALANCE_CHUNKS]) -> bool {
    chunks.iter().all(|chunk| *chunk < CHUNK_SIZE)
}

/// A veiled balance: one twisted-ElGamal ciphertext per chunk.
///
/// Wire form is the 4 ciphertexts concatenated in chunk order, 256 bytes.
#[derive(Copy, Clone, Encode, Decode, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EncryptedBalance(pub [CipherText; BALANCE_CHUNKS]);

/// A veiled transfer amount has the same shape as a balance; its upper
/// two chunks encrypt zero.
pub type EncryptedAmount = EncryptedBalance;

impl EncryptedBalance {
    /// Encrypt a balance with fresh per-chunk blindings.
    pub fn encrypt<R: RngCore + CryptoRng>(
        key: &ElgamalPublicKey,
        value: Balance,
        rng: &mut R,
    ) -> ([CommitmentWitness; BALANCE_CHUNKS], Self) {
        let chunks = split_balance(value);
        let witnesses = chunks.map(|chunk| {
            CommitmentWitness::new(Scalar::from(chunk), Scalar::random(rng))
        });
        let balance = Self::encrypt_with(key, &witnesses);
        (witnesses, balance)
    }

    /// Encrypt per-chunk witnesses under `key`.
    pub fn encrypt_with(
        key: &ElgamalPublicKey,
        witnesses: &[CommitmentWitness; BALANCE_CHUNKS],
    ) -> Self {
        Self([
            key.encrypt(&witnesses[0]),
            key.encrypt(&witnesses[1]),
            key.encrypt(&witnesses[2]),
            key.encrypt(&witnesses[3]),
        ])
    }

    /// Decrypt all chunks of a normalized balance.
    pub fn decrypt_chunks(&self, secret: &ElgamalSecretKey) -> Result<[u64; BALANCE_CHUNKS]> {
        let mut chunks = [0u64; BALANCE_CHUNKS];
        for (chunk, cipher) in chunks.iter_mut().zip(self.0.iter()) {
            *chunk = secret.decrypt(cipher)?;
        }
        Ok(chunks)
    }

    /// Decrypt all chunks, each searched in `[0, max_chunk)`.
    ///
    /// Used for unnormalized balances whose chunks may exceed the 32-bit
    /// bound after on-chain additions.
    pub fn decrypt_chunks_bounded(
        &self,
        secret: &ElgamalSecretKey,
        max_chunk: u64,
    ) -> Result<[u64; BALANCE_CHUNKS]> {
        let mut chunks = [0u64; BALANCE_CHUNKS];
        for (chunk, cipher) in chunks.iter_mut().zip(self.0.iter()) {
            *chunk = secret.decrypt_bounded(cipher, max_chunk)?;
        }
        Ok(chunks)
    }

    /// Decrypt a normalized balance and recombine the chunks.
    pub fn decrypt(&self, secret: &ElgamalSecretKey) -> Result<Balance> {
        let chunks = self.decrypt_chunks(secret)?;
        combine_chunks(&chunks).ok_or(crate::Error::PlainTextRangeError)
    }

    /// The `C` component of every chunk ciphertext.
    pub fn cs(&self) -> [RistrettoPoint; BALANCE_CHUNKS] {
        self.0.map(|cipher| *cipher.c)
    }

    /// The `D` component of every chunk ciphertext.
    pub fn ds(&self) -> [RistrettoPoint; BALANCE_CHUNKS] {
        self.0.map(|cipher| *cipher.d)
    }

    pub fn ciphertexts(&self) -> &[CipherText; BALANCE_CHUNKS] {
        &self.0
    }
}

impl Index<usize> for EncryptedBalance {
    type Output = CipherText;
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

// ------------------------------------------------------------------------
// Chunk-wise homomorphic operations, as the ledger applies them.
// ------------------------------------------------------------------------

impl<'a, 'b> Add<&'b EncryptedBalance> for &'a EncryptedBalance {
    type Output = EncryptedBalance;

    fn add(self, other: &'b EncryptedBalance) -> EncryptedBalance {
        let mut chunks = self.0;
        for (chunk, other) in chunks.iter_mut().zip(other.0.iter()) {
            *chunk += other;
        }
        EncryptedBalance(chunks)
    }
}
define_add_variants!(
    LHS = EncryptedBalance,
    RHS = EncryptedBalance,
    Output = EncryptedBalance
);

impl<'b> AddAssign<&'b EncryptedBalance> for EncryptedBalance {
    fn add_assign(&mut self, _rhs: &EncryptedBalance) {
        *self = (self as &EncryptedBalance) + _rhs;
    }
}
define_add_assign_variants!(LHS = EncryptedBalance, RHS = EncryptedBalance);

impl<'a, 'b> Sub<&'b EncryptedBalance> for &'a EncryptedBalance {
    type Output = EncryptedBalance;

    fn sub(self, other: &'b EncryptedBalance) -> EncryptedBalance {
        let mut chunks = self.0;
        for (chunk, other) in chunks.iter_mut().zip(other.0.iter()) {
            *chunk -= other;
        }
        EncryptedBalance(chunks)
    }
}
define_sub_variants!(
    LHS = EncryptedBalance,
    RHS = EncryptedBalance,
    Output = EncryptedBalance
);

impl<'b> SubAssign<&'b EncryptedBalance> for EncryptedBalance {
    fn sub_assign(&mut self, _rhs: &EncryptedBalance) {
        *self = (self as &EncryptedBalance) - _rhs;
    }
}
define_sub_assign_variants!(LHS = EncryptedBalance, RHS = EncryptedBalance);

// ------------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------------
