//! The SHA-512 Fiat-Shamir transcript shared by the sigma protocols.
//!
//! The challenge is `hash_to_scalar(DST || input_1 || input_2 || ...)`:
//! SHA-512 over the domain-separation tag followed by every public input
//! and commitment point, each as its canonical 32-byte little-endian
//! encoding, reduced mod the group order. Absorption order is fixed per
//! protocol and must match the on-chain verifier byte-exactly.

use curve25519_dalek::{
    constants::RISTRETTO_BASEPOINT_COMPRESSED,
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
};
use sha2::{Digest, Sha512};

use crate::{
    balance::EncryptedBalance,
    elgamal::{h_generator, CipherText, ElgamalPublicKey},
};

/// Accumulates the Fiat-Shamir hash state.
pub struct FiatShamirTranscript {
    hash: Sha512,
}

impl FiatShamirTranscript {
    /// Start a transcript with the protocol's domain-separation tag and
    /// absorb the fixed generators `G` and `H`.
    pub fn new(dst: &'static [u8]) -> Self {
        let mut hash = Sha512::new();
        hash.update(dst);
        hash.update(RISTRETTO_BASEPOINT_COMPRESSED.as_bytes());
        hash.update(h_generator().compress().as_bytes());
        Self { hash }
    }

    pub fn append_point(&mut self, point: &RistrettoPoint) {
        self.hash.update(point.compress().as_bytes());
    }

    pub fn append_compressed(&mut self, point: &CompressedRistretto) {
        self.hash.update(point.as_bytes());
    }

    pub fn append_scalar(&mut self, scalar: &Scalar) {
        self.hash.update(scalar.as_bytes());
    }

    pub fn append_public_key(&mut self, key: &ElgamalPublicKey) {
        self.append_point(&key.pub_key);
    }

    /// Absorb a ciphertext in its `C || D` wire order.
    pub fn append_ciphertext(&mut self, cipher: &CipherText) {
        self.append_point(&cipher.c);
        self.append_point(&cipher.d);
    }

    /// Absorb all chunk ciphertexts in chunk order.
    pub fn append_balance(&mut self, balance: &EncryptedBalance) {
        for cipher in balance.ciphertexts() {
            self.append_ciphertext(cipher);
        }
    }

    /// Finalize into the challenge scalar.
    pub fn challenge(self) -> Scalar {
        let mut hash = [0u8; 64];
        hash.copy_from_slice(&self.hash.finalize());
        Scalar::from_bytes_mod_order_wide(&hash)
    }
}

#[cfg(test)]
mod tests {
    extern crate wasm_bindgen_test;
    use super::*;
    use wasm_bindgen_test::*;

    const DST_A: &[u8] = b"VeiledBalancesTest/A";
    const DST_B: &[u8] = b"VeiledBalancesTest/B";

    #[test]
    #[wasm_bindgen_test]
    fn deterministic_challenge() {
        let point = h_generator();
        let mut t1 = FiatShamirTranscript::new(DST_A);
        t1.append_point(&point);
        t1.append_scalar(&Scalar::from(42u64));
        let mut t2 = FiatShamirTranscript::new(DST_A);
        t2.append_point(&point);
        t2.append_scalar(&Scalar::from(42u64));
        assert_eq!(t1.challenge(), t2.challenge());
    }

    #[test]
    #[wasm_bindgen_test]
    fn domain_separation() {
        let mut t1 = FiatShamirTranscript::new(DST_A);
        t1.append_scalar(&Scalar::from(42u64));
        let mut t2 = FiatShamirTranscript::new(DST_B);
        t2.append_scalar(&Scalar::from(42u64));
        assert_ne!(t1.challenge(), t2.challenge());
    }

    #[test]
    #[wasm_bindgen_test]
    fn input_order_matters() {
        let a = Scalar::from(1u64);
        let b = Scalar::from(2u64);
        let mut t1 = FiatShamirTranscript::new(DST_A);
        t1.append_scalar(&a);
        t1.append_scalar(&b);
        let mut t2 = FiatShamirTranscript::new(DST_A);
        t2.append_scalar(&b);
        t2.append_scalar(&a);
        assert_ne!(t1.challenge(), t2.challenge());
    }
}
