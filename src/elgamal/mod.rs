//! The `elgamal` module implements twisted-ElGamal encryption over the
//! Ristretto255 curve. Since ElGamal is a homomorphic encryption it also
//! provides addition and subtraction API over the cipher texts.
//!
//! Twisted form: the public key is `P = s^-1 * H` where `s` is the secret
//! key and `H` is the secondary generator; a ciphertext of the value `m`
//! with blinding `r` is the pair
//!
//! ```text
//! C = m * G + r * H
//! D = r * P
//! ```
//!
//! so that `C - s * D = m * G`. `H` is the Ristretto point obtained by
//! SHA3-512 hash-to-group of the compressed basepoint, which is exactly
//! `PedersenGens::default().B_blinding`; the on-chain verifier derives
//! the same point, and `tests::h_generator_derivation` pins it.
//!
//! Decryption is a brute-force discrete-log search bounded by the chunk
//! size, which is why balances are chunked (see [`crate::balance`]).

use crate::{
    codec_wrapper::{
        WrappedCompressedRistretto, WrappedRistretto, WrappedScalar, RISTRETTO_POINT_SIZE,
    },
    dalek_ng_compat::{pedersen_base, pedersen_blinding_base, pedersen_commit},
    errors::{Error, Result},
    CHUNK_SIZE,
};

use core::ops::{Add, AddAssign, Deref, Sub, SubAssign};
use curve25519_dalek::{
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
    traits::IsIdentity,
};
use rand_core::{CryptoRng, RngCore};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use codec::{Decode, Encode, Error as CodecError, Input, MaxEncodedLen};
use scale_info::{build::Fields, Path, Type, TypeInfo};

use core::cmp::Ordering;

#[cfg(feature = "discrete_log")]
pub mod discrete_log;

/// The secondary generator `H`.
///
/// Equals SHA3-512 hash-to-group of the compressed basepoint encoding;
/// `PedersenGens` derives its blinding base the same way.
pub fn h_generator() -> RistrettoPoint {
    pedersen_blinding_base()
}

/// Prover's representation of the commitment secret.
#[derive(Clone, PartialEq, Zeroize, ZeroizeOnDrop, Debug)]
pub struct CommitmentWitness {
    /// Depending on how the witness was created this variable stores the
    /// balance chunk or transfer amount chunk in Scalar format.
    value: Scalar,

    /// A random blinding factor.
    blinding: Scalar,
}

impl CommitmentWitness {
    pub fn new(value: Scalar, blinding: Scalar) -> Self {
        CommitmentWitness { value, blinding }
    }

    pub fn value(&self) -> Scalar {
        self.value
    }

    pub fn blinding(&self) -> Scalar {
        self.blinding
    }
}

/// Twisted-ElGamal ciphertext `(C, D)`.
#[derive(Copy, Clone, Encode, Decode, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CipherText {
    pub c: WrappedRistretto,
    pub d: WrappedRistretto,
}

impl TypeInfo for CipherText {
    type Identity = Self;
    fn type_info() -> Type {
        Type::builder()
            .path(Path::new("CipherText", module_path!()))
            .composite(Fields::unnamed().field(|f| {
                f.ty::<[u8; RISTRETTO_POINT_SIZE * 2]>()
                    .type_name("CompressedCipherText")
            }))
    }
}

impl CipherText {
    /// Create a `CipherText` when the `value` isn't secret (public amounts).
    pub fn value(value: Scalar) -> Self {
        Self {
            c: (value * pedersen_base()).into(),
            d: Default::default(),
        }
    }

    /// Create a `CipherText` with zero value and blinding factors.
    ///
    /// Useful for account initialization (zero balance).
    pub fn zero() -> Self {
        Default::default()
    }

    /// Homomorphically add the public amount `a` to the encrypted value.
    pub fn add_amount(&self, a: Scalar) -> Self {
        Self {
            c: (*self.c + a * pedersen_base()).into(),
            d: self.d,
        }
    }

    /// Homomorphically subtract the public amount `a` from the encrypted value.
    pub fn sub_amount(&self, a: Scalar) -> Self {
        Self {
            c: (*self.c - a * pedersen_base()).into(),
            d: self.d,
        }
    }

    pub fn compress(&self) -> CompressedCipherText {
        CompressedCipherText::from_points(self.c.compress(), self.d.compress())
    }
}

// ------------------------------------------------------------------------
// Arithmetic operations on the ciphertext.
// ------------------------------------------------------------------------

impl<'a, 'b> Add<&'b CipherText> for &'a CipherText {
    type Output = CipherText;

    fn add(self, other: &'b CipherText) -> CipherText {
        CipherText {
            c: (*self.c + *other.c).into(),
            d: (*self.d + *other.d).into(),
        }
    }
}
define_add_variants!(LHS = CipherText, RHS = CipherText, Output = CipherText);

impl<'b> AddAssign<&'b CipherText> for CipherText {
    fn add_assign(&mut self, _rhs: &CipherText) {
        *self = (self as &CipherText) + _rhs;
    }
}
define_add_assign_variants!(LHS = CipherText, RHS = CipherText);

impl<'a, 'b> Sub<&'b CipherText> for &'a CipherText {
    type Output = CipherText;

    fn sub(self, other: &'b CipherText) -> CipherText {
        CipherText {
            c: (*self.c - *other.c).into(),
            d: (*self.d - *other.d).into(),
        }
    }
}
define_sub_variants!(LHS = CipherText, RHS = CipherText, Output = CipherText);

impl<'b> SubAssign<&'b CipherText> for CipherText {
    fn sub_assign(&mut self, _rhs: &CipherText) {
        *self = (self as &CipherText) - _rhs;
    }
}
define_sub_assign_variants!(LHS = CipherText, RHS = CipherText);

/// Compressed `CipherText`, the 64-byte `C || D` wire form.
#[derive(Copy, Clone, TypeInfo, Encode, Debug, PartialEq, Eq)]
pub struct CompressedCipherText([u8; RISTRETTO_POINT_SIZE * 2]);

impl Decode for CompressedCipherText {
    /// Decodes a `CompressedCipherText` from an array of bytes.
    fn decode<I: Input>(input: &mut I) -> Result<Self, CodecError> {
        let (c, d) = <(WrappedCompressedRistretto, WrappedCompressedRistretto)>::decode(input)?;
        Ok(Self::from_points(*c, *d))
    }
}

impl Default for CompressedCipherText {
    fn default() -> Self {
        Self([0u8; RISTRETTO_POINT_SIZE * 2])
    }
}

impl From<CipherText> for CompressedCipherText {
    fn from(other: CipherText) -> Self {
        other.compress()
    }
}

impl CompressedCipherText {
    pub fn from_points(c: CompressedRistretto, d: CompressedRistretto) -> Self {
        let mut bytes = [0u8; RISTRETTO_POINT_SIZE * 2];
        bytes[0..32].copy_from_slice(c.as_bytes());
        bytes[32..64].copy_from_slice(d.as_bytes());
        CompressedCipherText(bytes)
    }

    pub fn to_bytes(&self) -> [u8; RISTRETTO_POINT_SIZE * 2] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; RISTRETTO_POINT_SIZE * 2] {
        &self.0
    }

    pub fn c(&self) -> WrappedCompressedRistretto {
        CompressedRistretto::from_slice(&self.0[0..32])
            .unwrap_or_default()
            .into()
    }

    pub fn d(&self) -> WrappedCompressedRistretto {
        CompressedRistretto::from_slice(&self.0[32..64])
            .unwrap_or_default()
            .into()
    }

    pub fn decompress(&self) -> CipherText {
        CipherText {
            c: self.c().decompress().into(),
            d: self.d().decompress().into(),
        }
    }
}

// ------------------------------------------------------------------------
// ElGamal keys.
// ------------------------------------------------------------------------

/// An ElGamal secret key is a random scalar.
#[derive(Clone, Encode, Decode, Zeroize, ZeroizeOnDrop, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ElgamalSecretKey {
    pub secret: WrappedScalar,
}

impl Deref for ElgamalSecretKey {
    type Target = Scalar;
    fn deref(&self) -> &Self::Target {
        &self.secret
    }
}

impl ElgamalSecretKey {
    pub fn new(secret: Scalar) -> Self {
        ElgamalSecretKey {
            secret: secret.into(),
        }
    }

    pub fn secret(&self) -> Scalar {
        *self.secret
    }

    /// The public key is the *inverse* of the secret key times `H`.
    pub fn get_public_key(&self) -> ElgamalPublicKey {
        ElgamalPublicKey {
            pub_key: (self.invert() * pedersen_blinding_base()).into(),
        }
    }

    /// Decrypt a cipher text that is known to encrypt a single balance chunk.
    #[cfg(not(feature = "discrete_log"))]
    pub fn decrypt(&self, cipher_text: &CipherText) -> Result<u64> {
        self.decrypt_with_hint(cipher_text, 0, CHUNK_SIZE)
            .ok_or(Error::CipherTextDecryptionError)
    }

    /// Decrypt a cipher text that is known to encrypt a single balance chunk.
    #[cfg(feature = "discrete_log")]
    pub fn decrypt(&self, cipher_text: &CipherText) -> Result<u64> {
        self.decrypt_bounded(cipher_text, CHUNK_SIZE)
    }

    /// Decrypt a cipher text whose plaintext lies in `[0, max)`.
    ///
    /// Chunks of an unnormalized balance can exceed the 32-bit chunk
    /// bound after on-chain homomorphic additions; the caller supplies
    /// the window that is guaranteed to contain the plaintext.
    #[cfg(feature = "discrete_log")]
    pub fn decrypt_bounded(&self, cipher_text: &CipherText, max: u64) -> Result<u64> {
        let value_g = self.value_base_point(cipher_text);
        let dlog = discrete_log::DiscreteLog::new(pedersen_base());
        dlog.decode_bounded(value_g, max)
            .ok_or(Error::CipherTextDecryptionError)
    }

    /// Decrypt a cipher text whose plaintext lies in `[0, max)`.
    #[cfg(not(feature = "discrete_log"))]
    pub fn decrypt_bounded(&self, cipher_text: &CipherText, max: u64) -> Result<u64> {
        self.decrypt_with_hint(cipher_text, 0, max)
            .ok_or(Error::CipherTextDecryptionError)
    }

    /// Decrypt a cipher text searching only the window `[min, max)`.
    ///
    /// Linear in `max - min`; callers narrow the window when they know
    /// bounds on the plaintext.
    pub fn decrypt_with_hint(&self, cipher_text: &CipherText, min: u64, max: u64) -> Option<u64> {
        if min > max {
            // Bad range.
            return None;
        }
        let value_g = self.value_base_point(cipher_text);
        // `m = 0` short-circuit.
        if value_g.is_identity() {
            return if min == 0 { Some(0) } else { None };
        }
        // Brute force the window to find the value that matches `value * G`.
        let mut result = Scalar::from(min) * pedersen_base();
        for v in min..max {
            if result == value_g {
                return Some(v);
            }
            result += pedersen_base();
        }

        None
    }

    /// Verifies that a cipher text encrypts the given `value`.
    /// This follows the same logic as decrypt(), except that the `value`
    /// is provided and we don't need to search for it.
    pub fn verify(&self, cipher_text: &CipherText, value: &Scalar) -> Result<()> {
        let value_g = self.value_base_point(cipher_text);
        if value * pedersen_base() == value_g {
            return Ok(());
        }

        Err(Error::CipherTextDecryptionError)
    }

    /// `C - s * D = m * G`.
    fn value_base_point(&self, cipher_text: &CipherText) -> RistrettoPoint {
        *cipher_text.c - self.secret() * *cipher_text.d
    }
}

/// Compressed ElgamalPublicKey.
#[derive(
    Copy, Clone, Default, Encode, MaxEncodedLen, TypeInfo, PartialOrd, Ord, PartialEq, Eq, Debug,
)]
pub struct CompressedElgamalPublicKey([u8; 32]);

impl CompressedElgamalPublicKey {
    pub fn from_public_key(key: &ElgamalPublicKey) -> Self {
        Self(key.pub_key.compress().to_bytes())
    }

    pub fn into_public_key(&self) -> Option<ElgamalPublicKey> {
        let compressed = CompressedRistretto(self.0);
        compressed.decompress().map(|pub_key| ElgamalPublicKey {
            pub_key: pub_key.into(),
        })
    }
}

impl Decode for CompressedElgamalPublicKey {
    /// Decodes a `CompressedElgamalPublicKey` from an array of bytes.
    fn decode<I: Input>(input: &mut I) -> Result<Self, CodecError> {
        let compressed = WrappedCompressedRistretto::decode(input)?;
        Ok(Self(compressed.to_bytes()))
    }
}

impl From<&ElgamalPublicKey> for CompressedElgamalPublicKey {
    fn from(other: &ElgamalPublicKey) -> Self {
        Self::from_public_key(other)
    }
}

impl From<ElgamalPublicKey> for CompressedElgamalPublicKey {
    fn from(other: ElgamalPublicKey) -> Self {
        Self::from_public_key(&other)
    }
}

/// The ElGamal public key `P = s^-1 * H`.
#[derive(Copy, Clone, Encode, Decode, Default, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ElgamalPublicKey {
    pub pub_key: WrappedRistretto,
}

impl ElgamalPublicKey {
    fn encrypt_helper(&self, value: Scalar, blinding: Scalar) -> CipherText {
        let c = pedersen_commit(&value, &blinding);
        let d = blinding * *self.pub_key;
        CipherText {
            c: c.into(),
            d: d.into(),
        }
    }

    pub fn encrypt(&self, witness: &CommitmentWitness) -> CipherText {
        self.encrypt_helper(witness.value, witness.blinding)
    }

    /// Generates a blinding factor, and encrypts the value.
    pub fn encrypt_value<R: RngCore + CryptoRng>(
        &self,
        value: Scalar,
        rng: &mut R,
    ) -> (CommitmentWitness, CipherText) {
        let blinding = Scalar::random(rng);
        (
            CommitmentWitness { value, blinding },
            self.encrypt_helper(value, blinding),
        )
    }
}

impl PartialOrd for ElgamalPublicKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ElgamalPublicKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let l = self.pub_key.compress().to_bytes();
        let r = other.pub_key.compress().to_bytes();
        l.cmp(&r)
    }
}

// ------------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    extern crate wasm_bindgen_test;
    use super::*;
    use curve25519_dalek::constants::RISTRETTO_BASEPOINT_COMPRESSED;
    use rand::{rngs::StdRng, SeedableRng};
    use sha3::Sha3_512;
    use wasm_bindgen_test::*;

    const SEED_1: [u8; 32] = [42u8; 32];
    const SEED_2: [u8; 32] = [56u8; 32];

    #[test]
    #[wasm_bindgen_test]
    fn h_generator_derivation() {
        // The secondary generator must be the SHA3-512 hash-to-group of
        // the compressed basepoint, matching the on-chain verifier.
        let derived =
            RistrettoPoint::hash_from_bytes::<Sha3_512>(RISTRETTO_BASEPOINT_COMPRESSED.as_bytes());
        assert_eq!(h_generator(), derived);
        assert_ne!(h_generator(), pedersen_base());
    }

    #[test]
    #[wasm_bindgen_test]
    fn basic_enc_dec() {
        let mut rng = StdRng::from_seed(SEED_1);
        let elg_secret = ElgamalSecretKey::new(Scalar::random(&mut rng));
        let elg_pub = elg_secret.get_public_key();

        // Test encrypting a chunk value.
        let value = 256u64;
        let blinding = Scalar::random(&mut rng);
        let witness = CommitmentWitness {
            value: value.into(),
            blinding,
        };
        // Test encrypt().
        let cipher = elg_pub.encrypt(&witness);
        let value1 = elg_secret.decrypt(&cipher).unwrap();
        assert_eq!(value1, value);

        // Test encrypt_value().
        let (_, cipher) = elg_pub.encrypt_value(witness.value, &mut rng);
        let value2 = elg_secret.decrypt(&cipher).unwrap();
        assert_eq!(value2, value);
    }

    #[test]
    #[wasm_bindgen_test]
    fn basic_enc_dec_zero_blinding() {
        let mut rng = StdRng::from_seed(SEED_1);
        let elg_secret = ElgamalSecretKey::new(Scalar::random(&mut rng));
        let elg_pub = elg_secret.get_public_key();

        let value = 256u64;
        let witness = CommitmentWitness {
            value: value.into(),
            blinding: Scalar::ZERO,
        };
        let cipher = elg_pub.encrypt(&witness);
        assert_eq!(elg_secret.decrypt(&cipher).unwrap(), value);

        // Creation of a CipherText without using a blinding.
        let cipher2 = CipherText::value(Scalar::from(value));
        assert_eq!(cipher, cipher2);
        assert_eq!(elg_secret.decrypt(&cipher2).unwrap(), value);
    }

    #[test]
    #[wasm_bindgen_test]
    fn basic_enc_dec_zero_ciphertext() {
        let mut rng = StdRng::from_seed(SEED_1);
        let elg_secret = ElgamalSecretKey::new(Scalar::random(&mut rng));

        let cipher = CipherText::zero();
        // Test decrypting zero.
        assert_eq!(elg_secret.decrypt(&cipher).unwrap(), 0);
        assert_eq!(elg_secret.decrypt_with_hint(&cipher, 0, 10), Some(0));
        assert_eq!(elg_secret.decrypt_with_hint(&cipher, 5, 10), None);
    }

    #[test]
    #[wasm_bindgen_test]
    fn decrypt_with_hint_test() {
        let mut rng = StdRng::from_seed(SEED_1);
        let elg_secret = ElgamalSecretKey::new(Scalar::random(&mut rng));
        let elg_pub = elg_secret.get_public_key();

        let value = 20_000u64;
        let (_, cipher) = elg_pub.encrypt_value(value.into(), &mut rng);
        assert_eq!(
            elg_secret.decrypt_with_hint(&cipher, 5_000, 25_000),
            Some(value)
        );
        // Wrong range.
        assert_eq!(elg_secret.decrypt_with_hint(&cipher, 50_000, 65_000), None);
    }

    #[cfg(feature = "discrete_log")]
    #[test]
    fn decrypt_bounded_past_chunk_size() {
        let mut rng = StdRng::from_seed(SEED_2);
        let elg_secret = ElgamalSecretKey::new(Scalar::random(&mut rng));
        let elg_pub = elg_secret.get_public_key();

        // An overflowed chunk, as left behind by on-chain additions.
        let value = (1u64 << 32) + 300;
        let (_, cipher) = elg_pub.encrypt_value(value.into(), &mut rng);
        assert_eq!(
            elg_secret.decrypt_bounded(&cipher, 1u64 << 33).unwrap(),
            value
        );
    }

    #[test]
    #[wasm_bindgen_test]
    fn homomorphic_encryption() {
        let v1: Scalar = 623u32.into();
        let v2: Scalar = 456u32.into();
        let mut rng = StdRng::from_seed(SEED_2);
        let r1 = Scalar::random(&mut rng);
        let r2 = Scalar::random(&mut rng);

        let elg_secret_key = ElgamalSecretKey::new(Scalar::random(&mut rng));
        let elg_pub = elg_secret_key.get_public_key();

        let cipher1 = elg_pub.encrypt(&CommitmentWitness {
            value: v1,
            blinding: r1,
        });
        let cipher2 = elg_pub.encrypt(&CommitmentWitness {
            value: v2,
            blinding: r2,
        });
        let mut cipher12 = elg_pub.encrypt(&CommitmentWitness {
            value: v1 + v2,
            blinding: r1 + r2,
        });
        assert_eq!(cipher1 + cipher2, cipher12);
        cipher12 -= cipher2;
        assert_eq!(cipher1, cipher12);

        cipher12 = elg_pub.encrypt(&CommitmentWitness {
            value: v1 - v2,
            blinding: r1 - r2,
        });
        assert_eq!(cipher1 - cipher2, cipher12);
        cipher12 += cipher2;
        assert_eq!(cipher1, cipher12);
    }

    #[test]
    #[wasm_bindgen_test]
    fn add_sub_amount() {
        let mut rng = StdRng::from_seed(SEED_1);
        let elg_secret = ElgamalSecretKey::new(Scalar::random(&mut rng));
        let elg_pub = elg_secret.get_public_key();

        let (_, cipher) = elg_pub.encrypt_value(50u64.into(), &mut rng);
        let plus = cipher.add_amount(12u64.into());
        assert_eq!(elg_secret.decrypt(&plus).unwrap(), 62);
        let minus = cipher.sub_amount(12u64.into());
        assert_eq!(elg_secret.decrypt(&minus).unwrap(), 38);
    }

    #[test]
    #[wasm_bindgen_test]
    fn ciphertext_compression() {
        let mut rng = StdRng::from_seed(SEED_1);
        let elg_secret = ElgamalSecretKey::new(Scalar::random(&mut rng));
        let elg_pub = elg_secret.get_public_key();

        let (_, cipher) = elg_pub.encrypt_value(77u64.into(), &mut rng);
        let compressed = cipher.compress();
        assert_eq!(compressed.decompress(), cipher);

        // `C || D` wire order.
        assert_eq!(&compressed.to_bytes()[0..32], cipher.c.compress().as_bytes());
        assert_eq!(&compressed.to_bytes()[32..64], cipher.d.compress().as_bytes());
    }
}
