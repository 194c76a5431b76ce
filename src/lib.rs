//! veiled-balances implements the client-side cryptographic core for
//! veiled (confidential) token balances: twisted ElGamal encryption over
//! Ristretto255, chunked balance representation, and the four
//! zero-knowledge authorization proofs (withdrawal, transfer, key
//! rotation, normalization) that a ledger verifier checks before
//! applying an encrypted balance update.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use zeroize::{Zeroize, ZeroizeOnDrop};

use codec::{Decode, Encode};

pub use curve25519_dalek::scalar::Scalar;

#[macro_use]
pub(crate) mod macros;

pub mod errors;

pub(crate) mod dalek_ng_compat;

pub mod balance;
pub mod codec_wrapper;
pub mod elgamal;
pub mod proofs;

pub use balance::{combine_chunks, split_balance, EncryptedAmount, EncryptedBalance};
pub use elgamal::{
    CipherText, CompressedCipherText, CompressedElgamalPublicKey, ElgamalPublicKey,
    ElgamalSecretKey,
};
pub use errors::{Error, Result};
pub use proofs::{
    normalization::{NormalizationProof, NormalizationProver},
    range_proof::{BulletproofsBackend, InRangeProof, RangeProofBackend},
    rotation::{KeyRotationProof, KeyRotationProver},
    transfer::{TransferProof, TransferProver},
    withdrawal::{WithdrawalProof, WithdrawalProver},
    AuthorizationProver,
};

/// The plaintext balance kept veiled on-chain.
///
/// Balances are 128-bit integers split into [`BALANCE_CHUNKS`] chunks of
/// [`CHUNK_BITS`] bits each, and every chunk is encrypted separately.
/// Chunking is what keeps both decryption and range proving tractable:
/// ElGamal decryption is a brute-force discrete-log search bounded by the
/// chunk size, and the Bulletproofs backend proves each chunk in
/// `[0, 2^32)` independently.
pub type Balance = u128;

/// Number of 32-bit chunks in a veiled balance.
pub const BALANCE_CHUNKS: usize = 4;

/// Bit width of a single balance chunk.
pub const CHUNK_BITS: u32 = 32;

/// Upper bound (exclusive) of a normalized balance chunk.
pub const CHUNK_SIZE: u64 = 1 << CHUNK_BITS;

// -------------------------------------------------------------------------------------
// -                                 New Type Def                                      -
// -------------------------------------------------------------------------------------

/// Holds ElGamal encryption keys.
#[derive(Clone, Encode, Decode, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ElgamalKeys {
    #[zeroize(skip)]
    pub public: ElgamalPublicKey,
    pub secret: ElgamalSecretKey,
}

impl ElgamalKeys {
    /// Generate a fresh key pair.
    pub fn generate<R: rand_core::RngCore + rand_core::CryptoRng>(rng: &mut R) -> Self {
        let secret = ElgamalSecretKey::new(Scalar::random(rng));
        Self {
            public: secret.get_public_key(),
            secret,
        }
    }
}
