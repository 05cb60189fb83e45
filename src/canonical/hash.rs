//! Deterministic hashes of canonical forms and serializable values.
//!
//! ## Determinism
//!
//! - Diagram hashes are computed over the native notation of the
//!   canonical form, which lists nodes in label order.
//! - Value hashes use serde_json bytes; hashed structs use `BTreeMap`,
//!   never `HashMap`.
//!
//! `canonical_hash` (xxh64) is the fast key used by caches and batch
//! reports. `fingerprint` (SHA-256) is the stable, collision-resistant
//! identifier meant for storage next to a diagram.

use serde::Serialize;
use sha2::{Digest, Sha256};
use xxhash_rust::xxh64::xxh64;

use super::{canonical, CanonicalError};
use crate::notation::to_native;
use crate::types::PlanarDiagram;

/// Version of the fingerprint scheme.
///
/// Changes to the canonical algorithm or the notation invalidate stored
/// fingerprints; bump this when that happens.
pub const FINGERPRINT_VERSION: &str = "1.0.0";

/// Serialize a value to JSON bytes for hashing.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).unwrap_or_default()
}

/// xxh64 of a serializable value.
pub fn content_hash<T: Serialize>(value: &T) -> u64 {
    xxh64(&to_canonical_bytes(value), 0)
}

/// [`content_hash`] as 16 hex digits.
pub fn content_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", content_hash(value))
}

/// xxh64 of the canonical form's notation. Isomorphic diagrams with equal
/// framing hash equally.
pub fn canonical_hash(k: &PlanarDiagram) -> Result<u64, CanonicalError> {
    let c = canonical(k)?;
    Ok(xxh64(to_native(&c).as_bytes(), 0))
}

/// [`canonical_hash`] as 16 hex digits.
pub fn canonical_hash_hex(k: &PlanarDiagram) -> Result<String, CanonicalError> {
    Ok(format!("{:016x}", canonical_hash(k)?))
}

/// SHA-256 of the canonical form's notation, prefixed with
/// [`FINGERPRINT_VERSION`], as 64 lowercase hex digits.
pub fn fingerprint(k: &PlanarDiagram) -> Result<String, CanonicalError> {
    Ok(fingerprint_of_canonical(&canonical(k)?))
}

/// [`fingerprint`] of a diagram the caller already canonicalized.
pub fn fingerprint_of_canonical(c: &PlanarDiagram) -> String {
    versioned_fingerprint(FINGERPRINT_VERSION, c)
}

/// SHA-256 over `v<version>:` followed by the notation.
fn versioned_fingerprint(version: &str, c: &PlanarDiagram) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("v{version}:").as_bytes());
    hasher.update(to_native(c).as_bytes());
    hex::encode(hasher.finalize())
}

/// Check a stored fingerprint against `k`.
///
/// Comparison does not short-circuit on the first differing byte.
pub fn verify_fingerprint(k: &PlanarDiagram, expected: &str) -> Result<bool, CanonicalError> {
    let computed = fingerprint(k)?;
    if computed.len() != expected.len() {
        return Ok(false);
    }
    Ok(computed
        .bytes()
        .zip(expected.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0)
}

/// Whether `k` is already in canonical form.
pub fn is_canonical(k: &PlanarDiagram) -> Result<bool, CanonicalError> {
    Ok(&canonical(k)? == k)
}
