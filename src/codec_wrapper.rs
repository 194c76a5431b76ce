use bulletproofs::RangeProof;
use codec::{Compact, CompactLen, Decode, Encode, Error as CodecError, Input, Output};
use curve25519_dalek::{
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use core::ops::{Deref, DerefMut};

use crate::InRangeProof;

/// Constants:
/// A serialized Ristretto point size.
pub const RISTRETTO_POINT_SIZE: usize = 32;

/// A serialized Scalar size.
pub const SCALAR_SIZE: usize = 32;

/// Wrapper for `RistrettoPoint` to implement SCALE encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WrappedRistretto(pub RistrettoPoint);

impl Encode for WrappedRistretto {
    #[inline]
    fn size_hint(&self) -> usize {
        RISTRETTO_POINT_SIZE
    }

    /// Encodes itself as an array of bytes.
    fn encode_to<W: Output + ?Sized>(&self, dest: &mut W) {
        self.0.compress().as_bytes().encode_to(dest);
    }
}

impl Decode for WrappedRistretto {
    /// Decodes a `RistrettoPoint` from an array of bytes.
    fn decode<I: Input>(input: &mut I) -> Result<Self, CodecError> {
        let id = <[u8; RISTRETTO_POINT_SIZE]>::decode(input)?;
        let compressed = CompressedRistretto(id);

        let inner = compressed
            .decompress()
            .ok_or_else(|| CodecError::from("Invalid `CompressedRistretto`."))?;

        Ok(Self(inner))
    }
}

impl From<WrappedRistretto> for RistrettoPoint {
    fn from(data: WrappedRistretto) -> Self {
        data.0
    }
}

impl Deref for WrappedRistretto {
    type Target = RistrettoPoint;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for WrappedRistretto {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<RistrettoPoint> for WrappedRistretto {
    fn from(data: RistrettoPoint) -> Self {
        Self(data)
    }
}

/// Wrapper for `CompressedRistretto` to implement SCALE encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WrappedCompressedRistretto(pub CompressedRistretto);

impl Encode for WrappedCompressedRistretto {
    #[inline]
    fn size_hint(&self) -> usize {
        RISTRETTO_POINT_SIZE
    }

    /// Encodes itself as an array of bytes.
    fn encode_to<W: Output + ?Sized>(&self, dest: &mut W) {
        self.0.as_bytes().encode_to(dest);
    }
}

impl Decode for WrappedCompressedRistretto {
    /// Decodes a `CompressedRistretto` from an array of bytes.
    fn decode<I: Input>(input: &mut I) -> Result<Self, CodecError> {
        let id = <[u8; RISTRETTO_POINT_SIZE]>::decode(input)?;
        let inner = CompressedRistretto(id);

        // Ensure it is a valid RistrettoPoint.
        inner
            .decompress()
            .ok_or_else(|| CodecError::from("Invalid `CompressedRistretto`."))?;

        Ok(Self(inner))
    }
}

impl From<WrappedCompressedRistretto> for RistrettoPoint {
    fn from(data: WrappedCompressedRistretto) -> Self {
        data.decompress()
    }
}

impl Deref for WrappedCompressedRistretto {
    type Target = CompressedRistretto;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for WrappedCompressedRistretto {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<RistrettoPoint> for WrappedCompressedRistretto {
    fn from(data: RistrettoPoint) -> Self {
        Self(data.compress())
    }
}

impl From<CompressedRistretto> for WrappedCompressedRistretto {
    fn from(data: CompressedRistretto) -> Self {
        Self(data)
    }
}

impl WrappedCompressedRistretto {
    pub fn decompress(&self) -> RistrettoPoint {
        // The compressed RistrettoPoint is validated in the SCALE `decode` method.
        self.0.decompress().unwrap_or_default()
    }

    pub fn compress(&self) -> CompressedRistretto {
        self.0
    }
}

/// Wrapper for Scalar to implement SCALE encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WrappedScalar(pub Scalar);

impl Encode for WrappedScalar {
    #[inline]
    fn size_hint(&self) -> usize {
        SCALAR_SIZE
    }

    /// Encodes itself as an array of bytes.
    fn encode_to<W: Output + ?Sized>(&self, dest: &mut W) {
        self.0.as_bytes().encode_to(dest);
    }
}

impl Decode for WrappedScalar {
    /// Decodes a `Scalar` from an array of bytes.
    fn decode<I: Input>(input: &mut I) -> Result<Self, CodecError> {
        let s = <[u8; SCALAR_SIZE]>::decode(input)?;

        let inner = Option::<Scalar>::from(Scalar::from_canonical_bytes(s))
            .ok_or_else(|| CodecError::from("Non-canonical `Scalar`."))?;
        Ok(Self(inner))
    }
}

impl Zeroize for WrappedScalar {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl From<WrappedScalar> for Scalar {
    fn from(data: WrappedScalar) -> Self {
        data.0
    }
}

impl Deref for WrappedScalar {
    type Target = Scalar;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for WrappedScalar {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Scalar> for WrappedScalar {
    fn from(data: Scalar) -> Self {
        Self(data)
    }
}

// RangeProof encoding.

impl Encode for InRangeProof {
    fn size_hint(&self) -> usize {
        // See `RangeProof::to_bytes`.
        const LOG_OF_NUM_SECRET_BITS: usize = 6;
        const SIZE: usize = (2 * LOG_OF_NUM_SECRET_BITS + 9) * 32;

        Compact::<u32>::compact_len(&(SIZE as u32)) + SIZE
    }

    /// Encodes itself as an array of bytes.
    fn encode_to<W: Output + ?Sized>(&self, dest: &mut W) {
        self.0.to_bytes().encode_to(dest);
    }
}

impl Decode for InRangeProof {
    /// Decodes a `RangeProof` from an array of bytes.
    fn decode<I: Input>(input: &mut I) -> Result<Self, CodecError> {
        let raw = <sp_std::vec::Vec<u8>>::decode(input)?;
        let range_proof =
            RangeProof::from_bytes(&raw).map_err(|_| CodecError::from("Invalid `RangeProof`"))?;

        Ok(Self(range_proof))
    }
}
