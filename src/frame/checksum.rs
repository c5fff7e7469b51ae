//! CRC32 checksums over log frames.
//!
//! Every frame carries a checksum over everything before it; any
//! mismatch is corruption and halts recovery. CRC32 (IEEE polynomial).

use crc32fast::Hasher;

/// Computes a CRC32 checksum over the provided bytes. Deterministic.
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Verifies bytes against an expected checksum.
pub fn verify_checksum(data: &[u8], expected: u32) -> bool {
    compute_checksum(data) == expected
}
