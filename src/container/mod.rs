//! Self-framing binary container holding the hidden items.
//!
//! A serialized container is `header, Data*, Hash, Stop`: the fixed 6-byte
//! magic, any number of Data blocks, exactly one Hash block covering every
//! preceding byte, and the Stop sentinel. Parsing is incremental: the
//! carrier managers recover the stream one bit at a time, so the container
//! accepts one byte per call and reports how far the grammar got.
//!
//! # Modules
//!
//! - [`block`]: shared frame parser and the closed block variant set
//! - [`data`]: encrypted item payloads
//! - [`hash`]: integrity digest block
//! - [`stop`]: stream terminator
//! - [`registry`]: explicit tag → constructor mapping

use crate::config::CONTAINER_MAGIC;
use crate::container::block::{Block, BlockParser, BlockType, ParseCode};
use crate::container::data::DataBlock;
use crate::container::hash::HashBlock;
use crate::container::stop::StopBlock;
use crate::container::registry::BlockRegistry;

pub mod block;
pub mod data;
pub mod hash;
pub mod registry;
pub mod stop;

/// Container-level outcome of feeding one stream byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseEvent {
    /// Byte consumed; the stream is still inside the grammar.
    Continue,

    /// A Stop tag was reached; the container is complete.
    End,

    /// The byte cannot belong to a container (bad header, unknown tag, or a
    /// block-level grammar violation).
    UnexpectedData,

    /// A Hash block's digest does not cover the recovered stream. Fatal:
    /// the carrier was modified after embedding.
    HashMismatch,
}

/// Ordered block sequence with incremental parse state.
#[derive(Debug)]
pub struct DataContainer {
    registry: BlockRegistry,
    blocks: Vec<Block>,
    current: Option<BlockParser>,
    header_index: usize,
    /// Stream bytes accumulated for integrity checks. Bytes of an
    /// in-progress Hash block are excluded so the check covers exactly what
    /// the digest was computed over at serialization time.
    raw: Vec<u8>,
}

impl DataContainer {
    pub fn new() -> Self {
        Self::with_registry(BlockRegistry::standard())
    }

    pub fn with_registry(registry: BlockRegistry) -> Self {
        Self { registry, blocks: Vec::new(), current: None, header_index: 0, raw: Vec::new() }
    }

    /// Iterates the Data blocks in stream order.
    pub fn data_blocks(&self) -> impl Iterator<Item = &DataBlock> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Data(data) => Some(data),
            _ => None,
        })
    }

    pub fn data_blocks_mut(&mut self) -> impl Iterator<Item = &mut DataBlock> {
        self.blocks.iter_mut().filter_map(|b| match b {
            Block::Data(data) => Some(data),
            _ => None,
        })
    }

    /// Appends a Data block, discarding any stale Hash/Stop blocks first.
    pub fn add_data_block(&mut self, block: DataBlock) {
        self.retain_data_blocks();
        self.blocks.push(Block::Data(block));
    }

    /// Feeds the next recovered stream byte.
    pub fn feed(&mut self, byte: u8) -> ParseEvent {
        let mut event = ParseEvent::Continue;

        if let Some(parser) = self.current.as_mut() {
            match parser.feed(byte) {
                ParseCode::Continue => {}
                ParseCode::UnexpectedData => return ParseEvent::UnexpectedData,
                ParseCode::BlockEnd => {
                    let parser = self.current.take().expect("active parser");
                    let block = parser.finish();
                    event = self.complete_block(block);
                }
            }
        } else if self.header_index < CONTAINER_MAGIC.len() {
            if byte != CONTAINER_MAGIC[self.header_index] {
                return ParseEvent::UnexpectedData;
            }
            self.header_index += 1;
        } else {
            // A block-type byte.
            match self.registry.create(byte) {
                None => return ParseEvent::UnexpectedData,
                // The stop tag alone terminates the stream; its empty frame
                // is never recovered on the decode side.
                Some(Block::Stop(_)) => event = ParseEvent::End,
                Some(block) => self.current = Some(BlockParser::new(block)),
            }
        }

        // Accumulate for the next integrity check, skipping bytes owned by a
        // Hash block (its digest cannot cover itself).
        let inside_hash = self.current.as_ref().is_some_and(|p| p.block_type() == BlockType::Hash);
        if !inside_hash {
            self.raw.push(byte);
        }

        event
    }

    /// Feeds a whole buffer, stopping at the first non-`Continue` event.
    ///
    /// The trailing event is returned; a buffer that runs out mid-grammar
    /// reports `Continue`, which callers treat as a truncated stream.
    pub fn feed_all(&mut self, bytes: &[u8]) -> ParseEvent {
        for &byte in bytes {
            let event = self.feed(byte);
            if event != ParseEvent::Continue {
                return event;
            }
        }
        ParseEvent::Continue
    }

    /// Appends a completed block and runs the variant's stream action.
    fn complete_block(&mut self, block: Block) -> ParseEvent {
        let block_type = block.block_type();
        tracing::trace!(?block_type, payload = block.raw_payload().len(), "block completed");
        self.blocks.push(block);

        match block_type {
            BlockType::Hash => {
                let Some(Block::Hash(hash)) = self.blocks.last() else {
                    unreachable!("hash block just pushed");
                };
                if hash.check(&self.raw) {
                    ParseEvent::Continue
                } else {
                    ParseEvent::HashMismatch
                }
            }
            BlockType::Stop => ParseEvent::End,
            BlockType::Data => ParseEvent::Continue,
        }
    }

    fn retain_data_blocks(&mut self) {
        self.blocks.retain(|b| b.block_type() == BlockType::Data);
    }

    /// Drops stale Hash/Stop blocks and appends fresh ones.
    fn finalize(&mut self) {
        self.retain_data_blocks();

        let partial = self.print_internal();
        let mut hash = HashBlock::new();
        hash.compute(&partial);

        self.blocks.push(Block::Hash(hash));
        self.blocks.push(Block::Stop(StopBlock));
    }

    /// Header plus every block frame, in order.
    fn print_internal(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&CONTAINER_MAGIC);
        for block in &self.blocks {
            out.extend_from_slice(&block.print_out());
        }
        out
    }

    /// Serializes the container: `header, Data*, Hash, Stop`.
    ///
    /// Data blocks must already hold their ciphertext (see
    /// [`DataBlock::encode`]); serialization never touches passphrases.
    pub fn serialize(&mut self) -> Vec<u8> {
        self.finalize();
        let out = self.print_internal();
        tracing::debug!(blocks = self.blocks.len(), bytes = out.len(), "container serialized");
        out
    }
}

impl Default for DataContainer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container_with_items(items: &[(&str, &str, &[u8], &str)]) -> DataContainer {
        let mut container = DataContainer::new();
        for (name, content_type, content, pass) in items {
            let mut block = DataBlock::new();
            block.set_name(name);
            block.set_content_type(content_type);
            block.set_decoded_data(content.to_vec());
            block.encode(pass).unwrap();
            container.add_data_block(block);
        }
        container
    }

    #[test]
    fn test_serialize_parse_roundtrip() {
        let mut container = container_with_items(&[("a.txt", "text/plain", b"xyz", "p")]);
        let wire = container.serialize();

        let mut parsed = DataContainer::new();
        assert_eq!(parsed.feed_all(&wire), ParseEvent::End);

        let blocks: Vec<_> = parsed.data_blocks_mut().collect();
        assert_eq!(blocks.len(), 1);
        assert!(blocks.into_iter().next().unwrap().try_decode("p"));
    }

    #[test]
    fn test_serialize_layout() {
        let mut container = container_with_items(&[("a", "b", b"c", "p")]);
        let wire = container.serialize();

        assert_eq!(&wire[..6], &CONTAINER_MAGIC);
        // Data block tag right after the header.
        assert_eq!(wire[6], BlockType::Data as u8);
        // Stream ends with a Hash frame (1+3+32) and a Stop frame (1+3).
        let stop = &wire[wire.len() - 4..];
        assert_eq!(stop, &[BlockType::Stop as u8, 0, 0, 0]);
        let hash_tag = wire[wire.len() - 4 - 36];
        assert_eq!(hash_tag, BlockType::Hash as u8);
    }

    #[test]
    fn test_parse_stops_at_stop_tag() {
        let mut container = container_with_items(&[]);
        let wire = container.serialize();

        // Feed byte by byte; End must fire on the Stop tag, before its
        // length bytes.
        let mut parsed = DataContainer::new();
        let mut consumed = 0;
        for &b in &wire {
            consumed += 1;
            if parsed.feed(b) == ParseEvent::End {
                break;
            }
        }
        assert_eq!(consumed, wire.len() - 3);
    }

    #[test]
    fn test_header_mismatch_rejected() {
        let mut parsed = DataContainer::new();
        assert_eq!(parsed.feed(CONTAINER_MAGIC[0]), ParseEvent::Continue);
        assert_eq!(parsed.feed(0x00), ParseEvent::UnexpectedData);
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let mut parsed = DataContainer::new();
        assert_eq!(parsed.feed_all(&CONTAINER_MAGIC), ParseEvent::Continue);
        assert_eq!(parsed.feed(0x7F), ParseEvent::UnexpectedData);
    }

    #[test]
    fn test_single_bit_flip_yields_hash_mismatch() {
        let mut container = container_with_items(&[("a.txt", "text/plain", b"payload bytes", "p")]);
        let mut wire = container.serialize();

        // Flip one bit inside the Data block region (right after the header
        // and the data frame header).
        wire[12] ^= 0x01;

        let mut parsed = DataContainer::new();
        assert_eq!(parsed.feed_all(&wire), ParseEvent::HashMismatch);
    }

    #[test]
    fn test_every_data_bit_flip_detected() {
        let mut container = container_with_items(&[("f", "t", b"abc", "p")]);
        let wire = container.serialize();

        // The Data payload region spans from the end of the data frame
        // header (container header 6 + tag 1 + length 3) to the start of the
        // Hash frame. Flips in the framing bytes themselves can legally
        // surface as grammar errors instead of digest mismatches.
        let data_end = wire.len() - 4 - 36;
        for i in 10..data_end {
            for bit in 0..8 {
                let mut corrupt = wire.clone();
                corrupt[i] ^= 1 << bit;
                let mut parsed = DataContainer::new();
                let event = parsed.feed_all(&corrupt);
                assert_ne!(event, ParseEvent::End, "flip at byte {i} bit {bit} went unnoticed");
            }
        }
    }

    #[test]
    fn test_truncated_stream_reports_continue() {
        let mut container = container_with_items(&[("a", "t", b"data", "p")]);
        let wire = container.serialize();

        let mut parsed = DataContainer::new();
        assert_eq!(parsed.feed_all(&wire[..wire.len() / 2]), ParseEvent::Continue);
    }

    #[test]
    fn test_add_data_block_drops_stale_hash_and_stop() {
        let mut container = container_with_items(&[("a", "t", b"1", "p")]);
        let _ = container.serialize();

        let mut extra = DataBlock::new();
        extra.set_name("b");
        extra.set_content_type("t");
        extra.set_decoded_data(b"2".to_vec());
        extra.encode("p").unwrap();
        container.add_data_block(extra);

        assert_eq!(container.data_blocks().count(), 2);
        assert_eq!(container.blocks.len(), 2);

        // Re-serializing regenerates exactly one Hash and one Stop.
        let wire = container.serialize();
        let mut parsed = DataContainer::new();
        assert_eq!(parsed.feed_all(&wire), ParseEvent::End);
        assert_eq!(parsed.data_blocks().count(), 2);
    }

    #[test]
    fn test_multiple_items_roundtrip_with_distinct_passphrases() {
        let mut container = container_with_items(&[
            ("one.bin", "application/octet-stream", &[0u8, 1, 2, 255], "alpha"),
            ("two.txt", "text/plain", b"second item", "beta"),
        ]);
        let wire = container.serialize();

        let mut parsed = DataContainer::new();
        assert_eq!(parsed.feed_all(&wire), ParseEvent::End);

        let mut blocks: Vec<_> = parsed.data_blocks_mut().collect();
        assert_eq!(blocks.len(), 2);

        assert!(!blocks[0].try_decode("beta"));
        assert!(blocks[0].try_decode("alpha"));
        assert_eq!(blocks[0].name(), "one.bin");
        assert_eq!(blocks[0].decoded_data(), Some(&[0u8, 1, 2, 255][..]));

        assert!(blocks[1].try_decode("beta"));
        assert_eq!(blocks[1].decoded_data(), Some(&b"second item"[..]));
    }
}
