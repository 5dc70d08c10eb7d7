//! Block framing: the shared `[type:1][length:3 BE][payload:length]` layer.
//!
//! The three block variants form a closed set, dispatched exhaustively by
//! the container parser. The frame parser below owns the state machine that
//! is common to all of them (length collection, payload collection); each
//! variant contributes a per-byte hook that can reject malformed payloads
//! early.

use crate::binary;
use crate::config::{BLOCK_LENGTH_BYTES, HASH_SIZE, MAX_BLOCK_LENGTH};
use crate::container::data::DataBlock;
use crate::container::hash::HashBlock;
use crate::container::stop::StopBlock;

/// Wire tag of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BlockType {
    Stop = 0,
    Data = 1,
    Hash = 2,
}

impl BlockType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Stop),
            1 => Some(Self::Data),
            2 => Some(Self::Hash),
            _ => None,
        }
    }
}

/// Result of feeding one byte to a block or frame parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseCode {
    /// Byte accepted, block not finished.
    Continue,

    /// The declared payload length is satisfied; the block is complete.
    BlockEnd,

    /// The byte violates the block grammar; the stream cannot be this
    /// format.
    UnexpectedData,
}

/// One typed block of a container.
#[derive(Debug, Clone)]
pub enum Block {
    Data(DataBlock),
    Hash(HashBlock),
    Stop(StopBlock),
}

impl Block {
    #[inline]
    pub fn block_type(&self) -> BlockType {
        match self {
            Self::Data(_) => BlockType::Data,
            Self::Hash(_) => BlockType::Hash,
            Self::Stop(_) => BlockType::Stop,
        }
    }

    /// Raw payload as it appears on the wire (ciphertext for Data blocks).
    pub fn raw_payload(&self) -> &[u8] {
        match self {
            Self::Data(block) => block.encoded_data(),
            Self::Hash(block) => block.digest(),
            Self::Stop(_) => &[],
        }
    }

    /// Variant-specific validation of the accumulated payload length.
    ///
    /// `accumulated` is the number of payload bytes received so far,
    /// including the byte being judged.
    fn accept_payload_byte(&self, accumulated: usize) -> ParseCode {
        match self {
            // Encrypted content; nothing to validate until decryption.
            Self::Data(_) => ParseCode::Continue,
            Self::Hash(_) if accumulated > HASH_SIZE => ParseCode::UnexpectedData,
            Self::Hash(_) => ParseCode::Continue,
            // The stop sentinel never carries payload.
            Self::Stop(_) => ParseCode::UnexpectedData,
        }
    }

    /// Whether a zero-length payload is legal for this variant.
    fn accepts_empty_payload(&self) -> bool {
        matches!(self, Self::Stop(_))
    }

    /// Hands the completed raw payload to the variant.
    fn finish(&mut self, raw: Vec<u8>) {
        match self {
            Self::Data(block) => block.set_encoded_data(raw),
            Self::Hash(block) => block.set_digest(raw),
            Self::Stop(_) => {}
        }
    }

    /// Serializes the block as `[type][len:3 BE][payload]`.
    pub fn print_out(&self) -> Vec<u8> {
        let payload = self.raw_payload();
        debug_assert!(payload.len() <= MAX_BLOCK_LENGTH);

        let mut out = Vec::with_capacity(1 + BLOCK_LENGTH_BYTES + payload.len());
        out.push(self.block_type() as u8);
        out.extend_from_slice(&binary::encode_length(payload.len()));
        out.extend_from_slice(payload);
        out
    }
}

/// Frame-parser states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameState {
    ReadLength,
    ReadData,
}

/// Incremental parser for one block frame.
///
/// Constructed by the container right after the type byte selected a
/// variant; consumed by [`BlockParser::finish`] once [`ParseCode::BlockEnd`]
/// is reported.
#[derive(Debug)]
pub struct BlockParser {
    block: Block,
    state: FrameState,
    index: usize,
    length: usize,
    raw: Vec<u8>,
}

impl BlockParser {
    pub fn new(block: Block) -> Self {
        Self { block, state: FrameState::ReadLength, index: 0, length: 0, raw: Vec::new() }
    }

    #[inline]
    pub fn block_type(&self) -> BlockType {
        self.block.block_type()
    }

    /// Feeds the next stream byte into the frame.
    pub fn feed(&mut self, byte: u8) -> ParseCode {
        match self.state {
            FrameState::ReadLength => {
                self.length = binary::accumulate_length(self.length, byte, self.index);
                self.index += 1;

                if self.index < BLOCK_LENGTH_BYTES {
                    return ParseCode::Continue;
                }

                tracing::trace!(block_type = ?self.block.block_type(), length = self.length, "block length framed");

                if self.length == 0 {
                    // Only the stop sentinel is allowed to be empty.
                    if self.block.accepts_empty_payload() {
                        return ParseCode::BlockEnd;
                    }
                    return ParseCode::UnexpectedData;
                }

                self.state = FrameState::ReadData;
                self.index = 0;
                self.raw.reserve(self.length);
                ParseCode::Continue
            }
            FrameState::ReadData => {
                self.raw.push(byte);
                self.index += 1;

                let code = self.block.accept_payload_byte(self.index);
                if code == ParseCode::UnexpectedData {
                    return code;
                }

                if self.index == self.length { ParseCode::BlockEnd } else { ParseCode::Continue }
            }
        }
    }

    /// Finalizes the block, moving the raw payload into the variant.
    pub fn finish(mut self) -> Block {
        let raw = std::mem::take(&mut self.raw);
        self.block.finish(raw);
        self.block
    }
}
