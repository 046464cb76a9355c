//! Stable hashing for lineage identifiers.
//!
//! Lineage ids must be a deterministic function of an item's content so that
//! two independently recorded items for the same computation compare equal
//! across threads, runs and processes. `std::hash` makes no such promise, so
//! the runtime hashes with the 64-bit FNV-1a functions below.
//!
//! NOTE: FNV-1a is **not** cryptographically secure. Collisions are possible;
//! the reuse cache verifies structure on every hit.

/// 64-bit FNV-1a offset basis.
pub const FNV1A_OFFSET_BASIS_64: u64 = 0xcbf29ce484222325;
/// 64-bit FNV-1a prime.
pub const FNV1A_PRIME_64: u64 = 0x0000_0100_0000_01B3;

/// Mix bytes into an existing FNV-1a 64-bit hash state.
///
/// For each byte: XOR it into the hash and multiply by the FNV prime.
/// Start a fresh hash from [`FNV1A_OFFSET_BASIS_64`].
#[inline]
pub const fn fnv1a64_mix(mut hash: u64, bytes: &[u8]) -> u64 {
    let mut i = 0usize;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV1A_PRIME_64);
        i += 1;
    }
    hash
}

/// Hash an arbitrary byte slice with FNV-1a 64-bit.
#[inline]
pub const fn fnv1a64(bytes: &[u8]) -> u64 {
    fnv1a64_mix(FNV1A_OFFSET_BASIS_64, bytes)
}

/// Hash a UTF-8 string with FNV-1a 64-bit.
#[inline]
pub const fn fnv1a64_str(s: &str) -> u64 {
    fnv1a64(s.as_bytes())
}

/// Mix a `u64` (little-endian bytes) into a hash state.
#[inline]
pub const fn fnv1a64_u64(hash: u64, value: u64) -> u64 {
    fnv1a64_mix(hash, &value.to_le_bytes())
}

/// Mix an `f64` by its bit pattern, so `-0.0` and `0.0` hash differently.
#[inline]
pub fn fnv1a64_f64(hash: u64, value: f64) -> u64 {
    fnv1a64_u64(hash, value.to_bits())
}

/// Mix a length-prefixed string field.
///
/// The prefix keeps field boundaries unambiguous: `("ab", "c")` and
/// `("a", "bc")` produce different states.
#[inline]
pub const fn fnv1a64_field(hash: u64, field: &str) -> u64 {
    let hash = fnv1a64_u64(hash, field.len() as u64);
    fnv1a64_mix(hash, field.as_bytes())
}
