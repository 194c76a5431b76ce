//! `bulletproofs` 4.0.0 is pinned to the `curve25519-dalek-ng` fork rather
//! than the `curve25519-dalek` version the rest of this crate uses. Both
//! crates implement the same ristretto255/Curve25519 arithmetic at the
//! same version, so the two `RistrettoPoint`/`Scalar` types are
//! byte-for-byte compatible; this module is the single boundary where
//! values cross between them via their canonical encodings.

use bulletproofs::PedersenGens as NgPedersenGens;
use curve25519_dalek::{
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
};

pub(crate) fn to_ng_scalar(s: &Scalar) -> curve25519_dalek_ng::scalar::Scalar {
    curve25519_dalek_ng::scalar::Scalar::from_bytes_mod_order(s.to_bytes())
}

pub(crate) fn from_ng_point(p: curve25519_dalek_ng::ristretto::RistrettoPoint) -> RistrettoPoint {
    CompressedRistretto(p.compress().to_bytes())
        .decompress()
        .expect("curve25519-dalek-ng point decompresses under curve25519-dalek")
}

pub(crate) fn to_ng_point(p: &RistrettoPoint) -> curve25519_dalek_ng::ristretto::RistrettoPoint {
    curve25519_dalek_ng::ristretto::CompressedRistretto(p.compress().to_bytes())
        .decompress()
        .expect("curve25519-dalek point decompresses under curve25519-dalek-ng")
}

pub(crate) fn from_ng_compressed(
    p: curve25519_dalek_ng::ristretto::CompressedRistretto,
) -> CompressedRistretto {
    CompressedRistretto(p.to_bytes())
}

pub(crate) fn to_ng_compressed(
    p: &CompressedRistretto,
) -> curve25519_dalek_ng::ristretto::CompressedRistretto {
    curve25519_dalek_ng::ristretto::CompressedRistretto(p.to_bytes())
}

/// The Pedersen value base `G`, i.e. `PedersenGens::default().B`.
pub(crate) fn pedersen_base() -> RistrettoPoint {
    from_ng_point(NgPedersenGens::default().B)
}

/// The Pedersen blinding base `H`, i.e. `PedersenGens::default().B_blinding`.
pub(crate) fn pedersen_blinding_base() -> RistrettoPoint {
    from_ng_point(NgPedersenGens::default().B_blinding)
}

/// `PedersenGens::default().commit(value, blinding)` over the crate's own
/// `Scalar`/`RistrettoPoint` types.
pub(crate) fn pedersen_commit(value: &Scalar, blinding: &Scalar) -> RistrettoPoint {
    from_ng_point(NgPedersenGens::default().commit(to_ng_scalar(value), to_ng_scalar(blinding)))
}

/// Drop-in replacement for `bulletproofs::PedersenGens` exposing the
/// crate's own `RistrettoPoint` type for `B`/`B_blinding`, so call sites
/// that only read the default generators don't need per-site conversion.
#[allow(non_snake_case)]
pub(crate) struct PedersenGens {
    pub B: RistrettoPoint,
    pub B_blinding: RistrettoPoint,
}

impl PedersenGens {
    pub(crate) fn default() -> Self {
        Self {
            B: pedersen_base(),
            B_blinding: pedersen_blinding_base(),
        }
    }

    pub(crate) fn commit(&self, value: Scalar, blinding: Scalar) -> RistrettoPoint {
        pedersen_commit(&value, &blinding)
    }
}
