//! Hash block: integrity digest over the preceding container stream.

use subtle::ConstantTimeEq;

use crate::binary;

/// A SHA-256 digest of every container byte that precedes this block.
#[derive(Debug, Clone, Default)]
pub struct HashBlock {
    digest: Vec<u8>,
}

impl HashBlock {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    pub(crate) fn set_digest(&mut self, digest: Vec<u8>) {
        self.digest = digest;
    }

    /// Computes the digest over the serialized stream so far.
    pub fn compute(&mut self, raw_stream: &[u8]) {
        self.digest = binary::sha256(raw_stream).to_vec();
        tracing::debug!(digest = %binary::to_hex(&self.digest), "container digest computed");
    }

    /// Verifies the stored digest against the recovered stream.
    ///
    /// Constant-time comparison; a length mismatch (truncated digest on the
    /// wire) is a plain failure.
    pub fn check(&self, raw_stream: &[u8]) -> bool {
        let expected = binary::sha256(raw_stream);

        if self.digest.len() != expected.len() {
            tracing::debug!(stored = self.digest.len(), "digest length mismatch");
            return false;
        }

        bool::from(self.digest.ct_eq(&expected))
    }
}
