//! Block registry: type tag → constructor.
//!
//! An explicit, constructed mapping handed to the container parser, so the
//! set of recognized blocks is visible at the call site instead of living in
//! a global singleton.

use crate::container::block::Block;
use crate::container::data::DataBlock;
use crate::container::hash::HashBlock;
use crate::container::stop::StopBlock;

type Constructor = fn() -> Block;

/// Maps wire type tags to fresh block instances.
#[derive(Debug, Clone)]
pub struct BlockRegistry {
    entries: Vec<(u8, Constructor)>,
}

impl BlockRegistry {
    /// The standard registry: Stop, Data, and Hash blocks.
    pub fn standard() -> Self {
        Self {
            entries: vec![
                (0, || Block::Stop(StopBlock)),
                (1, || Block::Data(DataBlock::new())),
                (2, || Block::Hash(HashBlock::new())),
            ],
        }
    }

    /// Instantiates a block for a wire tag; `None` for unknown tags.
    pub fn create(&self, tag: u8) -> Option<Block> {
        self.entries.iter().find(|(t, _)| *t == tag).map(|(_, ctor)| ctor())
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::block::BlockType;

    #[test]
    fn test_standard_registry_tags() {
        let registry = BlockRegistry::standard();
        assert_eq!(registry.create(0).unwrap().block_type(), BlockType::Stop);
        assert_eq!(registry.create(1).unwrap().block_type(), BlockType::Data);
        assert_eq!(registry.create(2).unwrap().block_type(), BlockType::Hash);
        assert!(registry.create(3).is_none());
    }
}
