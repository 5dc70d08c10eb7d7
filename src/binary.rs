//! Byte-level helpers shared across the container and carrier layers.

use sha2::{Digest, Sha256, Sha512};

use crate::config::{BLOCK_LENGTH_BYTES, HASH_SIZE, MAX_BLOCK_LENGTH};

/// Formats a byte slice as lowercase hex, for logging digests and seeds.
#[inline]
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// SHA-256 digest of a byte buffer.
#[inline]
pub fn sha256(buf: &[u8]) -> [u8; HASH_SIZE] {
    Sha256::digest(buf).into()
}

/// SHA-512 digest of a byte buffer.
#[inline]
pub fn sha512(buf: &[u8]) -> [u8; 64] {
    Sha512::digest(buf).into()
}

/// Encodes a block payload length as 3 big-endian bytes.
///
/// Callers validate against [`MAX_BLOCK_LENGTH`] before framing; values
/// beyond 24 bits cannot be represented.
#[inline]
pub fn encode_length(len: usize) -> [u8; BLOCK_LENGTH_BYTES] {
    debug_assert!(len <= MAX_BLOCK_LENGTH);
    [(len >> 16) as u8, (len >> 8) as u8, len as u8]
}

/// Folds one more big-endian length byte into an accumulating 24-bit value.
///
/// `index` is the 0-based position of `byte` within the 3-byte field.
#[inline]
pub fn accumulate_length(acc: usize, byte: u8, index: usize) -> usize {
    acc + ((byte as usize) << ((BLOCK_LENGTH_BYTES - 1 - index) * 8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex(&[0x00, 0xAB, 0xFF]), "00abff");
        assert_eq!(to_hex(&[]), "");
    }

    #[test]
    fn test_sha256_known_vector() {
        // SHA-256 of the empty string.
        assert_eq!(
            to_hex(&sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_sha512_length() {
        assert_eq!(sha512(b"abc").len(), 64);
    }

    #[test]
    fn test_encode_length_big_endian() {
        assert_eq!(encode_length(0), [0, 0, 0]);
        assert_eq!(encode_length(1), [0, 0, 1]);
        assert_eq!(encode_length(0x012345), [0x01, 0x23, 0x45]);
        assert_eq!(encode_length(MAX_BLOCK_LENGTH), [0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_accumulate_length_roundtrip() {
        let encoded = encode_length(0xABCDEF);
        let mut acc = 0;
        for (i, b) in encoded.iter().enumerate() {
            acc = accumulate_length(acc, *b, i);
        }
        assert_eq!(acc, 0xABCDEF);
    }
}
