//! Item model: the editor-facing view of one hidden payload.
//!
//! A thin adapter between whatever edits items (CLI commands here, an
//! interactive list in other front ends) and the container's Data blocks.

use crate::container::data::DataBlock;

/// One hidden item as seen by the front end.
#[derive(Debug, Clone, Default)]
pub struct Item {
    pub name: String,
    pub content_type: String,

    /// Plaintext content, present when the item is decoded.
    pub decoded_data: Option<Vec<u8>>,

    /// Ciphertext recovered from a carrier, kept so undecoded items survive
    /// a re-embed untouched.
    pub encoded_data: Vec<u8>,

    /// Created by the user in this session, not recovered from a carrier.
    pub new: bool,

    /// Marked for removal; skipped when rebuilding the container.
    pub deleted: bool,
}

impl Item {
    /// A fresh item with plaintext content.
    pub fn new(name: &str, content_type: &str, content: Vec<u8>) -> Self {
        Self {
            name: name.to_owned(),
            content_type: content_type.to_owned(),
            decoded_data: Some(content),
            encoded_data: Vec::new(),
            new: true,
            deleted: false,
        }
    }

    pub fn is_decoded(&self) -> bool {
        self.decoded_data.is_some()
    }

    /// Converts a container block into its editor view.
    pub fn from_block(block: &DataBlock) -> Self {
        Self {
            name: block.name().to_owned(),
            content_type: block.content_type().to_owned(),
            decoded_data: block.decoded_data().map(<[u8]>::to_vec),
            encoded_data: block.encoded_data().to_vec(),
            new: false,
            deleted: false,
        }
    }

    /// Converts the item back into a Data block for embedding.
    pub fn to_block(&self) -> DataBlock {
        let mut block = DataBlock::new();

        if !self.encoded_data.is_empty() {
            block.set_encoded_data(self.encoded_data.clone());
        }
        match &self.decoded_data {
            Some(data) => block.set_decoded_data(data.clone()),
            // A brand-new item without content still embeds, as empty.
            None if self.new => block.set_decoded_data(Vec::new()),
            None => {}
        }

        block.set_name(&self.name);
        block.set_content_type(&self.content_type);
        block
    }
}
