//! Deterministic, credential-seeded traversal of carrier positions.
//!
//! The walk is the only thing tying encode and decode together: both sides
//! rebuild it from the same credential hash and capacity map and must visit
//! the exact same position/layer sequence bit for bit. It starts on the
//! least significant plane and escalates to higher planes only when the
//! current one is exhausted.

use crate::carrier::capacity::CapacityMap;
use crate::error::CarrierError;

/// Layer-escalation ceiling: planes are tried as bit weights 1, 2, ..., 128.
const LAYER_LIMIT: u16 = 256;

/// Walk state over one capacity map.
///
/// The map is a private working copy: consuming a position clears its layer
/// bit, so the walk never revisits a pair within one operation. A fresh
/// walk is built per operation; state is never carried across operations.
pub struct PositionWalk {
    hash: Vec<u8>,
    hash_index: usize,
    position: usize,
    bit_layer: u16,
    capacity: CapacityMap,
}

impl PositionWalk {
    /// Builds a walk from the credential hash and a capacity snapshot.
    ///
    /// # Panics
    ///
    /// The credential hash is guaranteed at least 3 bytes by construction;
    /// an empty capacity map is rejected by the carrier managers before a
    /// walk is ever built.
    pub fn new(hash: &[u8], capacity: CapacityMap) -> Self {
        debug_assert!(hash.len() >= 3, "credential hash shorter than a seed");
        debug_assert!(capacity.positions() > 0);

        let mut walk = Self { hash: hash.to_vec(), hash_index: 0, position: 0, bit_layer: 1, capacity };
        walk.reset_position();
        walk
    }

    /// Current bit plane as a weight (1, 2, 4, ..., 128).
    #[inline]
    pub fn bit_layer(&self) -> u8 {
        self.bit_layer as u8
    }

    /// Next cyclic byte of the credential hash.
    fn next_hash_byte(&mut self) -> u8 {
        self.hash_index %= self.hash.len();
        let byte = self.hash[self.hash_index];
        self.hash_index += 1;
        byte
    }

    /// Re-seeds the position from three cyclic hash bytes.
    ///
    /// The bytes combine little-endian into a 24-bit seed reduced modulo
    /// the position count. Called once at construction and again on every
    /// layer escalation.
    fn reset_position(&mut self) {
        let h1 = self.next_hash_byte() as usize;
        let h2 = self.next_hash_byte() as usize;
        let h3 = self.next_hash_byte() as usize;

        self.position = (h1 + (h2 << 8) + (h3 << 16)) % self.capacity.positions();
        tracing::trace!(position = self.position, layer = self.bit_layer, "walk reseeded");
    }

    /// Scans forward from `start` (wrapping once) for a free position on
    /// the current layer.
    fn next_free_from(&self, start: usize) -> Option<usize> {
        let layer = self.bit_layer as u8;
        let len = self.capacity.positions();

        (start..len).chain(0..start).find(|&p| self.capacity.is_free(p, layer))
    }

    /// Advances to the next usable position and consumes it.
    ///
    /// # Errors
    ///
    /// `exhausted_error` is returned once all 8 layers are spent; the
    /// caller chooses `NoSpace` (encode) or `NoMoreData` (decode).
    pub fn advance(&mut self, exhausted_error: CarrierError) -> Result<usize, CarrierError> {
        let jump = self.next_hash_byte() as usize;
        self.position = (self.position + jump) % self.capacity.positions();

        loop {
            if let Some(free) = self.next_free_from(self.position) {
                self.position = free;
                self.capacity.mark_used(free, self.bit_layer as u8);
                return Ok(free);
            }

            // Layer full: escalate to the next plane and reseed.
            self.bit_layer <<= 1;
            if self.bit_layer == LAYER_LIMIT {
                tracing::debug!("all bit layers exhausted");
                return Err(exhausted_error);
            }
            self.reset_position();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk_sequence(hash: &[u8], map: CapacityMap, steps: usize) -> Vec<(usize, u8)> {
        let mut walk = PositionWalk::new(hash, map);
        let mut seq = Vec::with_capacity(steps);
        for _ in 0..steps {
            match walk.advance(CarrierError::NoMoreData) {
                Ok(pos) => seq.push((pos, walk.bit_layer())),
                Err(_) => break,
            }
        }
        seq
    }

    #[test]
    fn test_walk_is_deterministic() {
        let hash: Vec<u8> = (0u8..32).map(|i| i.wrapping_mul(37).wrapping_add(11)).collect();
        let a = walk_sequence(&hash, CapacityMap::flat(509), 2000);
        let b = walk_sequence(&hash, CapacityMap::flat(509), 2000);
        assert_eq!(a, b);
        assert_eq!(a.len(), 2000);
    }

    #[test]
    fn test_different_hashes_diverge() {
        let a = walk_sequence(&[1, 2, 3, 4, 5], CapacityMap::flat(1000), 50);
        let b = walk_sequence(&[5, 4, 3, 2, 1], CapacityMap::flat(1000), 50);
        assert_ne!(a, b);
    }

    #[test]
    fn test_no_position_layer_pair_reused() {
        let hash: Vec<u8> = (0u8..16).map(|i| i.wrapping_mul(73).wrapping_add(3)).collect();
        let seq = walk_sequence(&hash, CapacityMap::flat(97), 97 * 8);

        let mut seen = std::collections::HashSet::new();
        for pair in &seq {
            assert!(seen.insert(*pair), "pair {pair:?} visited twice");
        }
    }

    #[test]
    fn test_full_map_consumed_then_exhausted() {
        let hash = [9u8, 17, 33, 201];
        let positions = 61;
        let mut walk = PositionWalk::new(&hash, CapacityMap::flat(positions));

        // 8 layers × positions bits are available, not one more.
        for i in 0..positions * 8 {
            walk.advance(CarrierError::NoSpace).unwrap_or_else(|e| panic!("bit {i}: {e}"));
        }
        assert_eq!(walk.advance(CarrierError::NoSpace), Err(CarrierError::NoSpace));
    }

    #[test]
    fn test_layers_visited_low_to_high() {
        let hash = [7u8, 13, 19];
        let positions = 31;
        let mut walk = PositionWalk::new(&hash, CapacityMap::flat(positions));

        let mut last_layer = 1u8;
        for _ in 0..positions * 8 {
            walk.advance(CarrierError::NoSpace).unwrap();
            assert!(walk.bit_layer() >= last_layer, "layer decreased");
            last_layer = walk.bit_layer();
        }
        assert_eq!(last_layer, 128);
    }

    #[test]
    fn test_sparse_capacity_respected() {
        // Only every third position exploitable, single layer.
        let mut masks_map = CapacityMap::flat(30);
        for p in 0..30 {
            if p % 3 != 0 {
                for layer in 0..8 {
                    masks_map.mark_used(p, 1 << layer);
                }
            } else {
                for layer in 1..8 {
                    masks_map.mark_used(p, 1 << layer);
                }
            }
        }

        let mut walk = PositionWalk::new(&[3u8, 5, 7, 11], masks_map);
        for _ in 0..10 {
            let pos = walk.advance(CarrierError::NoSpace).unwrap();
            assert_eq!(pos % 3, 0, "landed on a non-exploitable position");
        }
        assert_eq!(walk.advance(CarrierError::NoSpace), Err(CarrierError::NoSpace));
    }
}
