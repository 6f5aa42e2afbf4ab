//! Randomness capability used to mint session identifiers.

use rand::RngCore;

/// Source of cryptographically secure random bytes
pub trait EntropySource: Send + Sync {
    /// Fill `buf` entirely with random bytes
    fn fill_bytes(&self, buf: &mut [u8]);
}

/// Operating system CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill_bytes(&self, buf: &mut [u8]) {
        rand::rngs::OsRng.fill_bytes(buf);
    }
}
