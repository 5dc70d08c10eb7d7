//! JPEG carrier: one addressable position per DCT coefficient.
//!
//! JPEG embedding works in the frequency domain, against the quantized
//! coefficients exposed by the external [`JpegCodec`]. Capacity is far from
//! flat: each AC coefficient contributes only the planes its magnitude can
//! absorb (see [`capacity::exploitable_mask`]), and zeros are untouchable
//! because they are run-length encoded: creating a non-zero value inside a
//! zero run inflates the file and lights up steganalysis.
//!
//! On read the frame is linearized into one flat coefficient buffer; the
//! capacity map and the walk operate on that buffer, and `write` copies it
//! back into the frame for the codec to re-encode.

use std::sync::Arc;

use crate::carrier::capacity::CapacityMap;
use crate::carrier::codec::{JpegCodec, JpegFrame};
use crate::carrier::walk::PositionWalk;
use crate::carrier::{CarrierManager, DecodeStepper, EncodeStepper};
use crate::config::LAYER_COUNT;
use crate::container::DataContainer;
use crate::credentials::Credentials;
use crate::error::CarrierError;
use crate::task::{CancelToken, Task};

/// Carrier manager for JPEG images, generic over the host-provided codec.
pub struct JpegCarrier {
    codec: Arc<dyn JpegCodec>,
    frame: Option<Arc<JpegFrame>>,
    coefficients: Option<Arc<Vec<i16>>>,
    capacity: Option<Arc<CapacityMap>>,
    task: Task,
    cancel: CancelToken,
}

impl JpegCarrier {
    pub fn new(codec: Arc<dyn JpegCodec>) -> Self {
        Self { codec, frame: None, coefficients: None, capacity: None, task: Task::new(), cancel: CancelToken::new() }
    }

    pub fn accepted_mime_types() -> &'static [&'static str] {
        &["image/jpeg", "image/jpg"]
    }

    fn coefficients(&self) -> Result<&Arc<Vec<i16>>, CarrierError> {
        self.coefficients.as_ref().ok_or(CarrierError::NotRead)
    }

    fn capacity(&self) -> Result<&Arc<CapacityMap>, CarrierError> {
        self.capacity.as_ref().ok_or(CarrierError::NotRead)
    }

    /// Fresh walk over a working copy of the capacity map.
    fn build_walk(&self, credentials: &mut Credentials) -> Result<PositionWalk, CarrierError> {
        let capacity = self.capacity()?;
        if capacity.total_bits() == 0 {
            // Nothing exploitable: a synthetic or blank image.
            return Err(CarrierError::NoSpace);
        }
        Ok(PositionWalk::new(credentials.hash(), CapacityMap::clone(capacity)))
    }
}

impl CarrierManager for JpegCarrier {
    fn accept(&self, mime: &str) -> bool {
        Self::accepted_mime_types().contains(&mime)
    }

    fn is_read(&self) -> bool {
        self.coefficients.is_some()
    }

    fn layers_capacity(&self) -> Result<[u64; LAYER_COUNT], CarrierError> {
        Ok(self.capacity()?.layer_totals())
    }

    fn new_instance(&self) -> Self {
        Self {
            codec: Arc::clone(&self.codec),
            frame: self.frame.clone(),
            coefficients: self.coefficients.clone(),
            capacity: self.capacity.clone(),
            task: Task::new(),
            cancel: CancelToken::new(),
        }
    }

    fn stop(&self) {
        self.cancel.cancel();
    }

    async fn read(&mut self, bytes: Vec<u8>, mut on_update: impl FnMut(f64) + Send) -> Result<(), CarrierError> {
        self.cancel.reset();
        on_update(0.0);

        let codec = Arc::clone(&self.codec);
        let (frame, coefficients, capacity) = tokio::task::spawn_blocking(move || {
            let frame = codec.decode(&bytes)?;
            let coefficients = frame.linearize();
            let capacity = CapacityMap::from_coefficients(&coefficients);
            Ok::<_, CarrierError>((frame, coefficients, capacity))
        })
        .await
        .map_err(CarrierError::codec)??;

        tracing::debug!(
            width = frame.width,
            height = frame.height,
            blocks = frame.block_count(),
            exploitable_bits = capacity.total_bits(),
            "jpeg carrier read"
        );

        self.frame = Some(Arc::new(frame));
        self.coefficients = Some(Arc::new(coefficients));
        self.capacity = Some(Arc::new(capacity));
        on_update(100.0);
        Ok(())
    }

    async fn decode(&self, credentials: &mut Credentials, mut on_update: impl FnMut(f64) + Send) -> Result<DataContainer, CarrierError> {
        self.cancel.reset();
        on_update(0.0);

        let walk = self.build_walk(credentials)?;
        let bits_total = self.capacity()?.total_bits();
        let coefficients = Arc::clone(self.coefficients()?);

        let stepper = DecodeStepper::new(walk, bits_total, move |pos, layer| coefficients[pos] & i16::from(layer) != 0);
        self.task.drive(stepper, &self.cancel, on_update).await
    }

    async fn encode(
        &mut self,
        credentials: &mut Credentials,
        container: &mut DataContainer,
        mut on_update: impl FnMut(f64) + Send,
    ) -> Result<(), CarrierError> {
        self.cancel.reset();
        on_update(0.0);

        // Serialization completes before the first bit is embedded.
        let buffer = container.serialize();
        let walk = self.build_walk(credentials)?;

        let coefficients = self.coefficients.as_mut().ok_or(CarrierError::NotRead)?;
        let coefficients = Arc::make_mut(coefficients);

        let stepper = EncodeStepper::new(walk, buffer, |pos, layer, bit| {
            if bit {
                coefficients[pos] |= i16::from(layer);
            } else {
                coefficients[pos] &= !i16::from(layer);
            }
        });
        self.task.drive(stepper, &self.cancel, on_update).await
    }

    async fn write(&self, mut on_update: impl FnMut(f64) + Send) -> Result<Vec<u8>, CarrierError> {
        on_update(0.0);

        let codec = Arc::clone(&self.codec);
        let frame = Arc::clone(self.frame.as_ref().ok_or(CarrierError::NotRead)?);
        let coefficients = Arc::clone(self.coefficients()?);

        let bytes = tokio::task::spawn_blocking(move || {
            let mut out_frame = JpegFrame::clone(&frame);
            out_frame.apply_linear(&coefficients)?;
            codec.encode(&out_frame)
        })
        .await
        .map_err(CarrierError::codec)??;

        on_update(100.0);
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carrier::capacity::exploitable_mask;
    use crate::carrier::codec::{DctBlock, JpegComponent};
    use crate::config::DCT_BLOCK_SIZE;
    use crate::credentials::HashAlgorithm;

    /// Toy codec: "decodes" any byte stream into a fixed synthetic frame
    /// and "encodes" a frame into a trivial serialization of its
    /// coefficients. Stands in for the external coefficient codec.
    struct StubCodec {
        blocks: usize,
    }

    impl StubCodec {
        fn frame(&self) -> JpegFrame {
            let blocks: Vec<DctBlock> = (0..self.blocks)
                .map(|b| {
                    let mut block: DctBlock = [0; DCT_BLOCK_SIZE];
                    for (i, coef) in block.iter_mut().enumerate().skip(1) {
                        // Mixed magnitudes, plenty of exploitable planes.
                        *coef = (((b * 31 + i * 7) % 150) as i16) - 75;
                    }
                    block
                })
                .collect();

            JpegFrame {
                width: 8 * self.blocks as u32,
                height: 8,
                components: vec![JpegComponent { id: 1, h_sampling: 1, v_sampling: 1, quant_table: 0, blocks }],
            }
        }
    }

    impl JpegCodec for StubCodec {
        fn decode(&self, bytes: &[u8]) -> Result<JpegFrame, CarrierError> {
            if bytes.len() == self.blocks * DCT_BLOCK_SIZE * 2 {
                // A stream previously produced by `encode`.
                let mut frame = self.frame();
                let coefficients: Vec<i16> =
                    bytes.chunks_exact(2).map(|c| i16::from_be_bytes([c[0], c[1]])).collect();
                frame.apply_linear(&coefficients)?;
                Ok(frame)
            } else {
                Ok(self.frame())
            }
        }

        fn encode(&self, frame: &JpegFrame) -> Result<Vec<u8>, CarrierError> {
            Ok(frame.linearize().iter().flat_map(|c| c.to_be_bytes()).collect())
        }
    }

    fn carrier(blocks: usize) -> JpegCarrier {
        JpegCarrier::new(Arc::new(StubCodec { blocks }))
    }

    fn item(content: &[u8], pass: &str) -> DataContainer {
        let mut container = DataContainer::new();
        let mut block = crate::container::data::DataBlock::new();
        block.set_name("hidden.bin");
        block.set_content_type("application/octet-stream");
        block.set_decoded_data(content.to_vec());
        block.encode(pass).unwrap();
        container.add_data_block(block);
        container
    }

    #[tokio::test]
    async fn test_capacity_monotonic_over_layers() {
        let mut carrier = carrier(32);
        carrier.read(vec![0; 10], |_| {}).await.unwrap();

        let caps = carrier.layers_capacity().unwrap();
        assert!(caps[0] > 0);
        for layer in 0..LAYER_COUNT - 1 {
            assert!(caps[layer] >= caps[layer + 1]);
        }
        // Plane 7 is never exploitable under the magnitude heuristic.
        assert_eq!(caps[7], 0);
    }

    #[tokio::test]
    async fn test_encode_decode_roundtrip() {
        let mut carrier = carrier(512);
        carrier.read(vec![0; 10], |_| {}).await.unwrap();

        let mut creds = Credentials::new(HashAlgorithm::Sha512, "jpeg master");
        let mut container = item(b"frequency domain payload", "pw");
        carrier.encode(&mut creds, &mut container, |_| {}).await.unwrap();

        let mut recovered = carrier.decode(&mut creds, |_| {}).await.unwrap();
        let mut blocks: Vec<_> = recovered.data_blocks_mut().collect();
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].try_decode("pw"));
        assert_eq!(blocks[0].decoded_data(), Some(&b"frequency domain payload"[..]));
    }

    #[tokio::test]
    async fn test_roundtrip_through_codec_write() {
        let mut carrier = carrier(512);
        carrier.read(vec![0; 10], |_| {}).await.unwrap();

        let mut creds = Credentials::new(HashAlgorithm::Sha256, "m");
        let mut container = item(&[9, 8, 7], "p");
        carrier.encode(&mut creds, &mut container, |_| {}).await.unwrap();
        let written = carrier.write(|_| {}).await.unwrap();

        let mut reloaded = JpegCarrier::new(Arc::new(StubCodec { blocks: 512 }));
        reloaded.read(written, |_| {}).await.unwrap();
        let mut recovered = reloaded.decode(&mut creds, |_| {}).await.unwrap();
        let mut blocks: Vec<_> = recovered.data_blocks_mut().collect();
        assert!(blocks[0].try_decode("p"));
        assert_eq!(blocks[0].decoded_data(), Some(&[9u8, 8, 7][..]));
    }

    #[tokio::test]
    async fn test_oversized_payload_reports_no_space() {
        let mut carrier = carrier(16);
        carrier.read(vec![0; 10], |_| {}).await.unwrap();

        let total_bytes = carrier.capacity().unwrap().total_bits() / 8;
        let mut creds = Credentials::new(HashAlgorithm::Sha512, "m");
        let mut container = item(&vec![0x5Au8; total_bytes as usize + 64], "p");
        let err = carrier.encode(&mut creds, &mut container, |_| {}).await.unwrap_err();
        assert_eq!(err, CarrierError::NoSpace);
    }

    #[tokio::test]
    async fn test_embedding_never_touches_unexploitable_coefficients() {
        let mut carrier = carrier(64);
        carrier.read(vec![0; 10], |_| {}).await.unwrap();
        let before = Arc::clone(carrier.coefficients().unwrap());

        let mut creds = Credentials::new(HashAlgorithm::Sha512, "m");
        let mut container = item(b"probe", "p");
        carrier.encode(&mut creds, &mut container, |_| {}).await.unwrap();

        let after = Arc::clone(carrier.coefficients().unwrap());
        for (i, (&b, &a)) in before.iter().zip(after.iter()).enumerate() {
            if i % DCT_BLOCK_SIZE == 0 {
                assert_eq!(b, a, "DC coefficient {i} was modified");
            }
            if b == 0 || b == 1 {
                assert_eq!(b, a, "untouchable coefficient {i} was modified");
            }
            // Any change stays within the coefficient's exploitable planes.
            let mask = exploitable_mask(b);
            assert_eq!(b | i16::from(mask), a | i16::from(mask), "coefficient {i} changed outside its planes");
        }
    }
}
