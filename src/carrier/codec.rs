//! External codec boundary.
//!
//! The engine never parses PNG or JPEG container syntax itself. PNG pixels
//! come and go through the `image` crate inside the PNG manager; JPEG
//! coefficient access has no equivalent off-the-shelf crate, so the manager
//! talks to whatever implementation of [`JpegCodec`] the host registers.

use crate::config::DCT_BLOCK_SIZE;
use crate::error::CarrierError;

/// One quantized 8×8 DCT coefficient block, in natural (row-major) order.
pub type DctBlock = [i16; DCT_BLOCK_SIZE];

/// One color component of a decoded JPEG frame.
#[derive(Debug, Clone)]
pub struct JpegComponent {
    /// Component identifier from the frame header.
    pub id: u8,

    /// Horizontal/vertical sampling factors.
    pub h_sampling: u8,
    pub v_sampling: u8,

    /// Quantization table selector.
    pub quant_table: u8,

    /// The component's DCT blocks in scan order.
    pub blocks: Vec<DctBlock>,
}

/// A decoded JPEG image at the coefficient level.
#[derive(Debug, Clone)]
pub struct JpegFrame {
    pub width: u32,
    pub height: u32,
    pub components: Vec<JpegComponent>,
}

impl JpegFrame {
    /// Total DCT blocks across all components.
    pub fn block_count(&self) -> usize {
        self.components.iter().map(|c| c.blocks.len()).sum()
    }

    /// Flattens every component's coefficients into one linear buffer.
    ///
    /// Position `i` addresses coefficient `i % 64` of global block
    /// `i / 64`; blocks are ordered component by component. This is the
    /// coordinate space of the capacity map and the position walk.
    pub fn linearize(&self) -> Vec<i16> {
        let mut out = Vec::with_capacity(self.block_count() * DCT_BLOCK_SIZE);
        for component in &self.components {
            for block in &component.blocks {
                out.extend_from_slice(block);
            }
        }
        out
    }

    /// Writes a linear coefficient buffer back into the frame.
    ///
    /// # Errors
    ///
    /// Fails when the buffer length does not match the frame geometry.
    pub fn apply_linear(&mut self, coefficients: &[i16]) -> Result<(), CarrierError> {
        if coefficients.len() != self.block_count() * DCT_BLOCK_SIZE {
            return Err(CarrierError::Codec(format!(
                "coefficient buffer length {} does not match frame ({} blocks)",
                coefficients.len(),
                self.block_count()
            )));
        }

        let mut chunks = coefficients.chunks_exact(DCT_BLOCK_SIZE);
        for component in &mut self.components {
            for block in &mut component.blocks {
                block.copy_from_slice(chunks.next().expect("length checked above"));
            }
        }
        Ok(())
    }
}

/// Contract of the external JPEG coefficient codec.
///
/// `decode` must expose the quantized coefficients exactly as stored in the
/// entropy-coded stream, and `encode` must write back a frame whose
/// coefficients survive a further decode bit-identically; lossy re-coding
/// would destroy the embedded payload.
pub trait JpegCodec: Send + Sync {
    /// Parses a JPEG byte stream into its coefficient-level frame.
    ///
    /// # Errors
    ///
    /// Returns a codec error for unsupported or malformed streams.
    fn decode(&self, bytes: &[u8]) -> Result<JpegFrame, CarrierError>;

    /// Re-encodes a (possibly mutated) frame into a JPEG byte stream.
    ///
    /// # Errors
    ///
    /// Returns a codec error when the frame cannot be represented.
    fn encode(&self, frame: &JpegFrame) -> Result<Vec<u8>, CarrierError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_component_frame() -> JpegFrame {
        let mut block_a: DctBlock = [0; DCT_BLOCK_SIZE];
        let mut block_b: DctBlock = [0; DCT_BLOCK_SIZE];
        for i in 0..DCT_BLOCK_SIZE {
            block_a[i] = i as i16;
            block_b[i] = -(i as i16);
        }

        JpegFrame {
            width: 16,
            height: 8,
            components: vec![
                JpegComponent { id: 1, h_sampling: 2, v_sampling: 2, quant_table: 0, blocks: vec![block_a, block_b] },
                JpegComponent { id: 2, h_sampling: 1, v_sampling: 1, quant_table: 1, blocks: vec![block_b] },
            ],
        }
    }

    #[test]
    fn test_linearize_apply_roundtrip() {
        let mut frame = two_component_frame();
        let mut linear = frame.linearize();
        assert_eq!(linear.len(), 3 * DCT_BLOCK_SIZE);

        linear[5] = 999;
        linear[2 * DCT_BLOCK_SIZE + 63] = -999;
        frame.apply_linear(&linear).unwrap();

        assert_eq!(frame.components[0].blocks[0][5], 999);
        assert_eq!(frame.components[1].blocks[0][63], -999);
        assert_eq!(frame.linearize(), linear);
    }

    #[test]
    fn test_apply_linear_length_mismatch() {
        let mut frame = two_component_frame();
        assert!(frame.apply_linear(&[0i16; 64]).is_err());
    }
}
