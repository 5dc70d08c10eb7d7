//! Carrier managers: embedding into and extracting from image carriers.
//!
//! A manager owns the decoded image data of one carrier and runs the four
//! lifecycle operations `read → decode | encode → write`. The embed and
//! extract loops are identical across carrier formats: only the way a bit
//! is stored at a (position, layer) pair differs. Both live here as
//! [`Stepper`] implementations parameterized over a bit accessor, driven by
//! the cooperative scheduler.
//!
//! # Modules
//!
//! - [`capacity`]: per-position exploitable-plane analysis
//! - [`walk`]: credential-seeded position traversal
//! - [`codec`]: external JPEG coefficient codec boundary
//! - [`png`], [`jpeg`]: the two carrier formats
//! - [`factory`]: mime-type registry of carrier constructors

use crate::config::{BITS_PER_STEP, LAYER_COUNT};
use crate::container::{DataContainer, ParseEvent};
use crate::credentials::Credentials;
use crate::carrier::walk::PositionWalk;
use crate::error::CarrierError;
use crate::task::{Step, Stepper};

pub mod capacity;
pub mod codec;
pub mod factory;
pub mod jpeg;
pub mod png;
pub mod walk;

/// Common contract of every carrier manager.
///
/// Operations are exclusive: `decode`/`encode` borrow the manager for their
/// whole run, so no two operations ever share walk or task state. A manager
/// cloned through [`new_instance`](Self::new_instance) shares the decoded
/// image data (copy-on-write) but starts with fresh operation state.
pub trait CarrierManager {
    /// Whether this manager handles the given mime type.
    fn accept(&self, mime: &str) -> bool;

    /// True once `read` has completed.
    fn is_read(&self) -> bool;

    /// Exploitable bits per layer, layer 0 first.
    ///
    /// # Errors
    ///
    /// [`CarrierError::NotRead`] before the carrier was read.
    fn layers_capacity(&self) -> Result<[u64; LAYER_COUNT], CarrierError>;

    /// Fresh manager sharing the loaded image data with clean state.
    fn new_instance(&self) -> Self
    where
        Self: Sized;

    /// Requests cooperative cancellation of the in-flight operation.
    fn stop(&self);

    /// Loads and decodes the carrier bytes, building the capacity map.
    async fn read(&mut self, bytes: Vec<u8>, on_update: impl FnMut(f64) + Send) -> Result<(), CarrierError>;

    /// Recovers the hidden container using `credentials`.
    async fn decode(&self, credentials: &mut Credentials, on_update: impl FnMut(f64) + Send) -> Result<DataContainer, CarrierError>;

    /// Embeds the serialized container into the carrier data.
    async fn encode(
        &mut self,
        credentials: &mut Credentials,
        container: &mut DataContainer,
        on_update: impl FnMut(f64) + Send,
    ) -> Result<(), CarrierError>;

    /// Re-encodes the (mutated) image data into carrier bytes.
    async fn write(&self, on_update: impl FnMut(f64) + Send) -> Result<Vec<u8>, CarrierError>;
}

/// Extraction loop: walks the carrier, reassembles bytes MSB-last, and
/// feeds them to the container parser until the grammar terminates.
pub(crate) struct DecodeStepper<R> {
    walk: PositionWalk,
    container: Option<DataContainer>,
    read_bit: R,
    cur_byte: u8,
    bit_weight: u16,
    bits_read: u64,
    bits_total: u64,
}

impl<R: Fn(usize, u8) -> bool> DecodeStepper<R> {
    pub fn new(walk: PositionWalk, bits_total: u64, read_bit: R) -> Self {
        Self { walk, container: Some(DataContainer::new()), read_bit, cur_byte: 0, bit_weight: 1, bits_read: 0, bits_total }
    }
}

impl<R: Fn(usize, u8) -> bool> Stepper for DecodeStepper<R> {
    type Output = DataContainer;

    fn step(&mut self) -> Result<Step<DataContainer>, CarrierError> {
        for _ in 0..BITS_PER_STEP {
            self.bits_read += 1;

            let position = self.walk.advance(CarrierError::NoMoreData)?;
            if (self.read_bit)(position, self.walk.bit_layer()) {
                self.cur_byte |= self.bit_weight as u8;
            }

            self.bit_weight <<= 1;
            if self.bit_weight > 128 {
                let byte = self.cur_byte;
                self.cur_byte = 0;
                self.bit_weight = 1;

                let container = self.container.as_mut().expect("container present until done");
                match container.feed(byte) {
                    ParseEvent::Continue => {}
                    ParseEvent::End => return Ok(Step::Done(self.container.take().expect("container present"))),
                    ParseEvent::UnexpectedData => return Err(CarrierError::Mismatch),
                    ParseEvent::HashMismatch => return Err(CarrierError::Corrupted),
                }
            }
        }

        Ok(Step::Continue)
    }

    fn progress(&self) -> f64 {
        (self.bits_read as f64 * 100.0 / self.bits_total as f64).min(100.0)
    }
}

/// Embedding loop: walks the carrier and stores the serialized container
/// bit by bit, least significant bit of each byte first.
pub(crate) struct EncodeStepper<W> {
    walk: PositionWalk,
    buffer: Vec<u8>,
    byte_index: usize,
    bit_weight: u16,
    write_bit: W,
}

impl<W: FnMut(usize, u8, bool)> EncodeStepper<W> {
    pub fn new(walk: PositionWalk, buffer: Vec<u8>, write_bit: W) -> Self {
        Self { walk, buffer, byte_index: 0, bit_weight: 1, write_bit }
    }
}

impl<W: FnMut(usize, u8, bool)> Stepper for EncodeStepper<W> {
    type Output = ();

    fn step(&mut self) -> Result<Step<()>, CarrierError> {
        for _ in 0..BITS_PER_STEP {
            let position = self.walk.advance(CarrierError::NoSpace)?;

            let bit = self.buffer[self.byte_index] & self.bit_weight as u8 != 0;
            (self.write_bit)(position, self.walk.bit_layer(), bit);

            self.bit_weight <<= 1;
            if self.bit_weight > 128 {
                self.byte_index += 1;
                self.bit_weight = 1;

                if self.byte_index >= self.buffer.len() {
                    tracing::debug!(last_layer = self.walk.bit_layer(), "payload embedded");
                    return Ok(Step::Done(()));
                }
            }
        }

        Ok(Step::Continue)
    }

    fn progress(&self) -> f64 {
        self.byte_index as f64 * 100.0 / self.buffer.len() as f64
    }
}
