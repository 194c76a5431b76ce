//! The discrete log decoder for twisted ElGamal decryption.
//!
//! Solves `x * G = target` for `x` in a bounded window using a 16/16 bit
//! offline/online split: an offline table of the 2^16 high parts, and an
//! online walk over the 2^16 low parts. A full miss over one 32-bit
//! window costs 2^16 group operations; chunks that overflowed the 32-bit
//! bound are handled by stepping the window in 2^32 increments up to the
//! caller's limit.

use crate::CHUNK_SIZE;
use {
    curve25519_dalek::{
        constants::RISTRETTO_BASEPOINT_POINT as G,
        ristretto::RistrettoPoint,
        scalar::Scalar,
        traits::{Identity, IsIdentity},
    },
    itertools::Itertools,
    std::collections::HashMap,
};

const TWO16: u64 = 65536; // 2^16
const TWO17: u64 = 131072; // 2^17

/// Type that captures a discrete log challenge.
///
/// The goal of discrete log is to find x such that x * generator = target.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DiscreteLog {
    /// Generator point for discrete log
    pub generator: RistrettoPoint,
    /// Ristretto point compression batch size
    compression_batch_size: usize,
}

#[derive(Default)]
pub struct DecodePrecomputation(HashMap<[u8; 32], u16>);

/// Builds a HashMap of 2^16 elements
fn decode_u32_precomputation(generator: RistrettoPoint) -> DecodePrecomputation {
    let mut hashmap = HashMap::new();

    let two17_scalar = Scalar::from(TWO17);
    let mut point = RistrettoPoint::identity(); // 0 * G
    let generator = two17_scalar * generator; // 2^17 * G

    // iterator for 2^17*0G , 2^17*1G, 2^17*2G, ...
    for x_hi in 0..TWO16 {
        let key = point.compress().to_bytes();
        hashmap.insert(key, x_hi as u16);
        point += generator;
    }

    DecodePrecomputation(hashmap)
}

lazy_static::lazy_static! {
    /// Pre-computed HashMap needed for decryption. The HashMap is independent of (works for) any key.
    static ref DECODE_PRECOMPUTATION_FOR_G: DecodePrecomputation =
        decode_u32_precomputation(G);
    /// One 32-bit window worth of `G`, for stepping over overflowed chunks.
    static ref G_CHUNK_SIZE: RistrettoPoint = G * Scalar::from(CHUNK_SIZE);
}

/// Solves the discrete log instance using a 16/16 bit offline/online split
impl DiscreteLog {
    /// Discrete log instance constructor.
    pub fn new(generator: RistrettoPoint) -> Self {
        debug_assert_eq!(generator, G);
        Self {
            generator,
            compression_batch_size: 32,
        }
    }

    /// Solves the discrete log problem under the assumption that the solution
    /// is a positive 32-bit number.
    pub fn decode_u32(&self, target: RistrettoPoint) -> Option<u64> {
        Self::decode_range(target, self.compression_batch_size)
    }

    /// Solves the discrete log problem for a solution in `[0, max)`,
    /// where `max` may exceed the 32-bit chunk bound.
    pub fn decode_bounded(&self, mut target: RistrettoPoint, max: u64) -> Option<u64> {
        let mut offset = 0u64;
        loop {
            if let Some(v) = self.decode_u32(target) {
                let value = offset.checked_add(v)?;
                return if value < max { Some(value) } else { None };
            }
            offset = offset.checked_add(CHUNK_SIZE)?;
            if offset >= max {
                return None;
            }
            target -= *G_CHUNK_SIZE;
        }
    }

    fn decode_range(mut target: RistrettoPoint, compression_batch_size: usize) -> Option<u64> {
        let hashmap = &DECODE_PRECOMPUTATION_FOR_G;
        let mut offset = 0u64;
        let mut batch_points = Vec::with_capacity(compression_batch_size);

        for batch in &(0..TWO16).chunks(compression_batch_size) {
            // batch compression currently errors if any point in the batch is the identity point
            batch_points.clear();
            for idx in batch {
                let point = target;
                target += -G;
                if point.is_identity() {
                    return Some(idx);
                }
                batch_points.push(point);
            }

            let batch_compressed = RistrettoPoint::double_and_compress_batch(&batch_points);

            for (x_lo, point) in batch_compressed.iter().enumerate() {
                let key = point.to_bytes();
                if hashmap.0.contains_key(&key) {
                    let x_hi = hashmap.0[&key];
                    return Some(offset + x_lo as u64 + TWO16 * x_hi as u64);
                }
            }
            offset += compression_batch_size as u64;
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_correctness() {
        // general case
        let amount: u64 = 4294967295;

        let instance = DiscreteLog::new(G);
        let target = Scalar::from(amount) * G;

        let decoded = instance.decode_u32(target);
        assert_eq!(amount, decoded.unwrap());
    }

    #[test]
    fn test_decode_bounded() {
        let instance = DiscreteLog::new(G);

        // Value past the 32-bit chunk bound.
        let amount: u64 = (1u64 << 32) + 4242;
        let target = Scalar::from(amount) * G;
        assert_eq!(instance.decode_bounded(target, 1u64 << 33), Some(amount));

        // Out of the supplied window.
        assert_eq!(instance.decode_bounded(target, 1u64 << 32), None);
    }
}
