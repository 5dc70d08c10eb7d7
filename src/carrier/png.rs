//! PNG carrier: one addressable position per RGBA channel byte.
//!
//! PNG is lossless, so every channel byte of every pixel is usable and all
//! 8 bit planes are theoretically exploitable, so the capacity map is flat.
//! Pixel access goes through the `image` crate; this module never touches
//! PNG container syntax.

use std::io::Cursor;
use std::sync::Arc;

use image::{ImageFormat, RgbaImage};

use crate::carrier::capacity::CapacityMap;
use crate::carrier::walk::PositionWalk;
use crate::carrier::{CarrierManager, DecodeStepper, EncodeStepper};
use crate::config::{LAYER_COUNT, PNG_CHANNELS};
use crate::container::DataContainer;
use crate::credentials::Credentials;
use crate::error::CarrierError;
use crate::task::{CancelToken, Task};

/// Decoded RGBA pixel data shared between manager instances.
#[derive(Debug, Clone)]
struct PixelImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelImage {
    /// Addressable positions: one per channel byte.
    fn positions(&self) -> usize {
        self.width as usize * self.height as usize * PNG_CHANNELS
    }
}

/// Carrier manager for PNG images.
pub struct PngCarrier {
    image: Option<Arc<PixelImage>>,
    task: Task,
    cancel: CancelToken,
}

impl PngCarrier {
    pub fn new() -> Self {
        Self { image: None, task: Task::new(), cancel: CancelToken::new() }
    }

    pub fn accepted_mime_types() -> &'static [&'static str] {
        &["image/png"]
    }

    fn image(&self) -> Result<&Arc<PixelImage>, CarrierError> {
        self.image.as_ref().ok_or(CarrierError::NotRead)
    }

    /// Fresh walk over a flat capacity map for one operation.
    fn build_walk(&self, credentials: &mut Credentials) -> Result<PositionWalk, CarrierError> {
        let positions = self.image()?.positions();
        Ok(PositionWalk::new(credentials.hash(), CapacityMap::flat(positions)))
    }
}

impl CarrierManager for PngCarrier {
    fn accept(&self, mime: &str) -> bool {
        Self::accepted_mime_types().contains(&mime)
    }

    fn is_read(&self) -> bool {
        self.image.is_some()
    }

    fn layers_capacity(&self) -> Result<[u64; LAYER_COUNT], CarrierError> {
        let positions = self.image()?.positions() as u64;
        Ok([positions; LAYER_COUNT])
    }

    fn new_instance(&self) -> Self {
        Self { image: self.image.clone(), task: Task::new(), cancel: CancelToken::new() }
    }

    fn stop(&self) {
        self.cancel.cancel();
    }

    async fn read(&mut self, bytes: Vec<u8>, mut on_update: impl FnMut(f64) + Send) -> Result<(), CarrierError> {
        self.cancel.reset();
        on_update(0.0);

        // The codec call is monolithic; keep it off the cooperative thread.
        let decoded = tokio::task::spawn_blocking(move || {
            let image = image::load_from_memory_with_format(&bytes, ImageFormat::Png).map_err(CarrierError::codec)?;
            let rgba = image.to_rgba8();
            let (width, height) = rgba.dimensions();
            Ok::<_, CarrierError>(PixelImage { width, height, data: rgba.into_raw() })
        })
        .await
        .map_err(CarrierError::codec)??;

        tracing::debug!(width = decoded.width, height = decoded.height, "png carrier read");
        self.image = Some(Arc::new(decoded));
        on_update(100.0);
        Ok(())
    }

    async fn decode(&self, credentials: &mut Credentials, mut on_update: impl FnMut(f64) + Send) -> Result<DataContainer, CarrierError> {
        self.cancel.reset();
        on_update(0.0);

        let walk = self.build_walk(credentials)?;
        let image = Arc::clone(self.image()?);
        let bits_total = image.positions() as u64 * 8;

        let stepper = DecodeStepper::new(walk, bits_total, move |pos, layer| image.data[pos] & layer != 0);
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

        // Serialization is a distinct phase: the byte buffer exists in full
        // before the first bit is embedded.
        let buffer = container.serialize();
        let walk = self.build_walk(credentials)?;

        let image = self.image.as_mut().ok_or(CarrierError::NotRead)?;
        // Copy-on-write: instances sharing this pixel data keep the
        // original.
        let pixels = &mut Arc::make_mut(image).data;

        let stepper = EncodeStepper::new(walk, buffer, |pos, layer, bit| {
            if bit {
                pixels[pos] |= layer;
            } else {
                pixels[pos] &= !layer;
            }
        });
        self.task.drive(stepper, &self.cancel, on_update).await
    }

    async fn write(&self, mut on_update: impl FnMut(f64) + Send) -> Result<Vec<u8>, CarrierError> {
        on_update(0.0);
        let image = Arc::clone(self.image()?);

        let bytes = tokio::task::spawn_blocking(move || {
            let rgba = RgbaImage::from_raw(image.width, image.height, image.data.clone())
                .ok_or_else(|| CarrierError::Codec("pixel buffer does not match dimensions".into()))?;

            let mut out = Cursor::new(Vec::new());
            image::DynamicImage::ImageRgba8(rgba).write_to(&mut out, ImageFormat::Png).map_err(CarrierError::codec)?;
            Ok::<_, CarrierError>(out.into_inner())
        })
        .await
        .map_err(CarrierError::codec)??;

        on_update(100.0);
        Ok(bytes)
    }
}

impl Default for PngCarrier {
    fn default() -> Self {
        Self::new()
    }
}
