//! Per-carrier capacity analysis.
//!
//! A capacity map stores, for every addressable position of a carrier, a
//! bitmask of the bit planes that may safely hold one payload bit. The walk
//! clears a position's bit when it consumes it, so within one operation a
//! position/layer pair is never used twice.

use rayon::prelude::*;

use crate::config::{DCT_BLOCK_SIZE, LAYER_COUNT};

/// Exploitable-plane bitmask per position, plus per-layer totals.
#[derive(Debug, Clone)]
pub struct CapacityMap {
    masks: Vec<u8>,
    layer_totals: [u64; LAYER_COUNT],
}

impl CapacityMap {
    /// Flat map: every plane of every position exploitable.
    ///
    /// This is the PNG model: one position per channel byte, all 8 bit
    /// planes usable, no magnitude filtering.
    pub fn flat(positions: usize) -> Self {
        Self { masks: vec![0xFF; positions], layer_totals: [positions as u64; LAYER_COUNT] }
    }

    /// Builds the map for a linearized JPEG coefficient buffer.
    ///
    /// Position `i` addresses coefficient `i % 64` of DCT block `i / 64`.
    /// DC coefficients (index 0 of each block) are never exploitable; AC
    /// coefficients are filtered by magnitude (see [`exploitable_mask`]).
    pub fn from_coefficients(coefficients: &[i16]) -> Self {
        let masks: Vec<u8> = coefficients
            .par_iter()
            .enumerate()
            .map(|(i, &v)| if i % DCT_BLOCK_SIZE == 0 { 0 } else { exploitable_mask(v) })
            .collect();

        let mut layer_totals = [0u64; LAYER_COUNT];
        for &mask in &masks {
            for (layer, total) in layer_totals.iter_mut().enumerate() {
                *total += u64::from(mask >> layer & 1);
            }
        }

        for (layer, total) in layer_totals.iter().enumerate() {
            tracing::debug!(layer, bits = total, "exploitable capacity");
        }

        Self { masks, layer_totals }
    }

    /// Number of addressable positions.
    #[inline]
    pub fn positions(&self) -> usize {
        self.masks.len()
    }

    /// Exploitable bits per layer, layer 0 first.
    #[inline]
    pub fn layer_totals(&self) -> [u64; LAYER_COUNT] {
        self.layer_totals
    }

    /// Total exploitable bits across all layers.
    pub fn total_bits(&self) -> u64 {
        self.layer_totals.iter().sum()
    }

    /// Whether `position` is exploitable and unused on `layer_bit`.
    #[inline]
    pub fn is_free(&self, position: usize, layer_bit: u8) -> bool {
        self.masks[position] & layer_bit != 0
    }

    /// Marks `position` used on `layer_bit` for the rest of the operation.
    #[inline]
    pub fn mark_used(&mut self, position: usize, layer_bit: u8) {
        self.masks[position] &= !layer_bit;
    }
}

/// Bit planes of one AC coefficient that can be flipped safely.
///
/// Values 0 and 1 are untouchable: creating or destroying a zero changes
/// the run-length structure of the entropy-coded stream, inflating the file
/// and flagging the image to any steganalysis pass. For larger magnitudes
/// the planes strictly below the leading bit (capped at bit 6) are usable,
/// keeping every perturbation below the coefficient's own magnitude:
///
/// ```text
///  v            planes      max variation
///  0, 1         -           untouchable
///  2..=3        0           1
///  4..=7        0..=1       3
///  8..=15       0..=2       7
///  16..=31      0..=3       15
///  32..=63      0..=4       31
///  64..=127     0..=5       63
///  -1..=-2      0           1
///  -3..=-4      0           1
///  -5..=-8      0..=1       3
///  -9..=-16     0..=2       7
///  -17..=-32    0..=3       15
///  -33..=-64    0..=4       31
///  -65..=-128   0..=5       63
/// ```
pub fn exploitable_mask(v: i16) -> u8 {
    if v == 0 || v == 1 {
        return 0;
    }

    if v > 1 {
        // Highest set bit at or below bit 6; everything strictly below it
        // is exploitable.
        let mut bit = 6u32;
        while bit > 0 && v & (1i16 << bit) == 0 {
            bit -= 1;
        }
        if v & (1i16 << bit) == 0 { 0 } else { (1u8 << bit) - 1 }
    } else if v >= -2 {
        // -1 and -2 only tolerate a flip of the lowest plane.
        1
    } else {
        // Negative values mirror the positive rule on the highest clear bit
        // at or below bit 6.
        let mut bit = 6u32;
        while bit > 0 && v & (1i16 << bit) != 0 {
            bit -= 1;
        }
        if bit == 0 { 0 } else { (1u8 << bit) - 1 }
    }
}
