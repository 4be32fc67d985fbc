//! Digest primitives for the performer.
//!
//! Provides two things:
//!   1. Keccak-256: selector derivation from canonical method signatures
//!   2. SHA-256: content digests returned by the local-compute strategy
//!
//! There is no unsafe code in this module.

use sha2::{Digest, Sha256};
use sha3::Keccak256;

// ── Keccak-256 ────────────────────────────────────────────────────────────────

/// Hash a byte slice, returning a 32-byte Keccak-256 digest.
///
/// This is the pre-standard Keccak padding (as used by Ethereum), not FIPS-202
/// SHA3-256. Selectors depend on it bit-for-bit.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

// ── SHA-256 ───────────────────────────────────────────────────────────────────

/// Hash a byte slice, returning a 32-byte SHA-256 digest.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-256 of `data` as lowercase hex text (64 characters, no prefix).
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}
