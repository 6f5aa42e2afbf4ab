use crate::traits::entropy::EntropySource;
use std::sync::atomic::{AtomicU8, Ordering};

/// Deterministic entropy: the n-th call fills the buffer with byte `n`
///
/// Wraps after 256 calls. Never use outside tests.
#[derive(Debug, Default)]
pub struct SequenceEntropy {
    next: AtomicU8,
}

impl SequenceEntropy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntropySource for SequenceEntropy {
    fn fill_bytes(&self, buf: &mut [u8]) {
        let byte = self.next.fetch_add(1, Ordering::Relaxed);
        buf.fill(byte);
    }
}
