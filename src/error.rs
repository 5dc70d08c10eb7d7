//! Typed errors for the embedding/extraction engine.
//!
//! Wrong-password conditions on an individual Data block are deliberately
//! absent: a failed decrypt leaves that item undecoded and is retried with
//! other candidate passphrases, it never aborts the surrounding operation.
//! Everything in [`CarrierError`] is terminal for the current operation; a
//! retry requires a fresh manager instance.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CarrierError {
    /// The walk or the bit stream ran out before a complete container was
    /// recovered. Typical for a truncated or foreign carrier.
    #[error("carrier exhausted before a complete container was recovered")]
    NoMoreData,

    /// Encoding consumed every exploitable position on all 8 bit layers.
    /// The payload is too large for this carrier.
    #[error("payload does not fit in the carrier")]
    NoSpace,

    /// The extracted byte stream is inconsistent with the container grammar.
    /// The carrier holds no container, or the credentials point the walk at
    /// random noise.
    #[error("carrier does not contain a recognizable container")]
    Mismatch,

    /// The integrity digest embedded in the container does not match the
    /// recovered stream. The carrier was modified after embedding.
    #[error("container integrity check failed")]
    Corrupted,

    /// The operation was cancelled at a tick boundary.
    #[error("operation cancelled")]
    Cancelled,

    /// A decode/encode/write was attempted before `read` completed.
    #[error("carrier has not been read")]
    NotRead,

    /// The external pixel/coefficient codec rejected the carrier.
    #[error("codec error: {0}")]
    Codec(String),
}

impl CarrierError {
    /// Wraps an external codec failure.
    pub fn codec(err: impl std::fmt::Display) -> Self {
        Self::Codec(err.to_string())
    }
}
