#[cfg(feature = "std")]
use thiserror::Error;

use crate::Balance;

/// Veiled balance error.
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Error))]
pub enum Error {
    /// Unable to encrypt a plain text outside of the valid range.
    #[cfg_attr(
        feature = "std",
        error("Unable to encrypt a plain text outside of the valid range")
    )]
    PlainTextRangeError,

    /// Encrypted value was not found within the valid range.
    #[cfg_attr(
        feature = "std",
        error("Encrypted value was not found within the valid range")
    )]
    CipherTextDecryptionError,

    /// The sender has attempted to spend more than their balance.
    #[cfg_attr(
        feature = "std",
        error("Amount {amount} must be less than or equal to {balance}")
    )]
    NotEnoughFund { balance: Balance, amount: u64 },

    /// Too many auditors.
    #[cfg_attr(
        feature = "std",
        error("The number of auditors is over the MAX_AUDITORS limit")
    )]
    TooManyAuditors,

    /// Wrong number of auditors.
    #[cfg_attr(
        feature = "std",
        error("The number of auditor keys doesn't match the number of auditor handles in the proof")
    )]
    WrongNumberOfAuditors,

    /// Proof bytes are truncated, not 32-byte aligned, or contain an
    /// invalid point or scalar encoding.
    #[cfg_attr(feature = "std", error("Malformed proof encoding"))]
    MalformedProof,

    /// A proof verification error occurred.
    #[cfg_attr(feature = "std", error("A proof verification error occurred"))]
    VerificationError,

    /// Failed to verify a withdrawal proof.
    #[cfg_attr(
        feature = "std",
        error("Failed to verify the check number {check} of the withdrawal proof")
    )]
    WithdrawalProofVerificationError { check: u16 },

    /// Failed to verify a transfer proof.
    #[cfg_attr(
        feature = "std",
        error("Failed to verify the check number {check} of the transfer proof")
    )]
    TransferProofVerificationError { check: u16 },

    /// Failed to verify a key rotation proof.
    #[cfg_attr(
        feature = "std",
        error("Failed to verify the check number {check} of the key rotation proof")
    )]
    RotationProofVerificationError { check: u16 },

    /// Failed to verify a normalization proof.
    #[cfg_attr(
        feature = "std",
        error("Failed to verify the check number {check} of the normalization proof")
    )]
    NormalizationProofVerificationError { check: u16 },

    /// A range proof error occurred.
    #[cfg_attr(feature = "std", error(transparent))]
    BulletproofProvingError(bulletproofs::ProofError),
}

impl From<bulletproofs::ProofError> for Error {
    fn from(err: bulletproofs::ProofError) -> Self {
        Self::BulletproofProvingError(err)
    }
}

impl From<codec::Error> for Error {
    fn from(_err: codec::Error) -> Self {
        Self::MalformedProof
    }
}

pub type Result<T, E = Error> = sp_std::result::Result<T, E>;
