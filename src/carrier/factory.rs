//! Carrier registry: mime type → manager constructor.
//!
//! An explicit registry built at startup, mirroring the block registry. The
//! PNG entry is always present; the JPEG entry appears once the host
//! registers its coefficient codec.

use std::path::Path;
use std::sync::Arc;

use crate::carrier::codec::JpegCodec;
use crate::carrier::jpeg::JpegCarrier;
use crate::carrier::png::PngCarrier;
use crate::carrier::CarrierManager;
use crate::config::LAYER_COUNT;
use crate::container::DataContainer;
use crate::credentials::Credentials;
use crate::error::CarrierError;

/// A manager of either supported carrier format.
///
/// The variant set is closed; operations dispatch exhaustively.
pub enum Carrier {
    Png(PngCarrier),
    Jpeg(JpegCarrier),
}

impl CarrierManager for Carrier {
    fn accept(&self, mime: &str) -> bool {
        match self {
            Self::Png(m) => m.accept(mime),
            Self::Jpeg(m) => m.accept(mime),
        }
    }

    fn is_read(&self) -> bool {
        match self {
            Self::Png(m) => m.is_read(),
            Self::Jpeg(m) => m.is_read(),
        }
    }

    fn layers_capacity(&self) -> Result<[u64; LAYER_COUNT], CarrierError> {
        match self {
            Self::Png(m) => m.layers_capacity(),
            Self::Jpeg(m) => m.layers_capacity(),
        }
    }

    fn new_instance(&self) -> Self {
        match self {
            Self::Png(m) => Self::Png(m.new_instance()),
            Self::Jpeg(m) => Self::Jpeg(m.new_instance()),
        }
    }

    fn stop(&self) {
        match self {
            Self::Png(m) => m.stop(),
            Self::Jpeg(m) => m.stop(),
        }
    }

    async fn read(&mut self, bytes: Vec<u8>, on_update: impl FnMut(f64) + Send) -> Result<(), CarrierError> {
        match self {
            Self::Png(m) => m.read(bytes, on_update).await,
            Self::Jpeg(m) => m.read(bytes, on_update).await,
        }
    }

    async fn decode(&self, credentials: &mut Credentials, on_update: impl FnMut(f64) + Send) -> Result<DataContainer, CarrierError> {
        match self {
            Self::Png(m) => m.decode(credentials, on_update).await,
            Self::Jpeg(m) => m.decode(credentials, on_update).await,
        }
    }

    async fn encode(
        &mut self,
        credentials: &mut Credentials,
        container: &mut DataContainer,
        on_update: impl FnMut(f64) + Send,
    ) -> Result<(), CarrierError> {
        match self {
            Self::Png(m) => m.encode(credentials, container, on_update).await,
            Self::Jpeg(m) => m.encode(credentials, container, on_update).await,
        }
    }

    async fn write(&self, on_update: impl FnMut(f64) + Send) -> Result<Vec<u8>, CarrierError> {
        match self {
            Self::Png(m) => m.write(on_update).await,
            Self::Jpeg(m) => m.write(on_update).await,
        }
    }
}

type Constructor = Box<dyn Fn() -> Carrier + Send + Sync>;

struct Entry {
    mime_types: &'static [&'static str],
    construct: Constructor,
}

/// Explicit carrier registry constructed at startup.
pub struct CarrierFactory {
    entries: Vec<Entry>,
}

impl CarrierFactory {
    /// Registry with the PNG carrier only.
    pub fn new() -> Self {
        Self {
            entries: vec![Entry {
                mime_types: PngCarrier::accepted_mime_types(),
                construct: Box::new(|| Carrier::Png(PngCarrier::new())),
            }],
        }
    }

    /// Registers the JPEG carrier backed by the given coefficient codec.
    pub fn register_jpeg_codec(&mut self, codec: Arc<dyn JpegCodec>) {
        self.entries.push(Entry {
            mime_types: JpegCarrier::accepted_mime_types(),
            construct: Box::new(move || Carrier::Jpeg(JpegCarrier::new(Arc::clone(&codec)))),
        });
    }

    /// Every mime type the registry can currently serve.
    pub fn all_mime_types(&self) -> Vec<&'static str> {
        self.entries.iter().flat_map(|e| e.mime_types.iter().copied()).collect()
    }

    /// Builds a fresh manager for a mime type.
    pub fn for_mime(&self, mime: &str) -> Option<Carrier> {
        self.entries.iter().find(|e| e.mime_types.contains(&mime)).map(|e| (e.construct)())
    }

    /// Builds a fresh manager from a file extension.
    pub fn for_path(&self, path: &Path) -> Option<Carrier> {
        self.for_mime(mime_for_path(path)?)
    }
}

impl Default for CarrierFactory {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps a carrier file extension to its mime type.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carrier::codec::JpegFrame;

    struct NullCodec;

    impl JpegCodec for NullCodec {
        fn decode(&self, _bytes: &[u8]) -> Result<JpegFrame, CarrierError> {
            Err(CarrierError::Codec("unsupported".into()))
        }

        fn encode(&self, _frame: &JpegFrame) -> Result<Vec<u8>, CarrierError> {
            Err(CarrierError::Codec("unsupported".into()))
        }
    }

    #[test]
    fn test_png_always_registered() {
        let factory = CarrierFactory::new();
        assert!(factory.for_mime("image/png").is_some());
        assert!(factory.for_mime("image/jpeg").is_none());
        assert_eq!(factory.all_mime_types(), vec!["image/png"]);
    }

    #[test]
    fn test_jpeg_available_after_codec_registration() {
        let mut factory = CarrierFactory::new();
        factory.register_jpeg_codec(Arc::new(NullCodec));

        assert!(factory.for_mime("image/jpeg").is_some());
        assert!(factory.for_mime("image/jpg").is_some());
        assert_eq!(factory.all_mime_types(), vec!["image/png", "image/jpeg", "image/jpg"]);
    }

    #[test]
    fn test_for_path_by_extension() {
        let mut factory = CarrierFactory::new();
        factory.register_jpeg_codec(Arc::new(NullCodec));

        assert!(matches!(factory.for_path(Path::new("photo.PNG")), Some(Carrier::Png(_))));
        assert!(matches!(factory.for_path(Path::new("photo.jpeg")), Some(Carrier::Jpeg(_))));
        assert!(factory.for_path(Path::new("notes.txt")).is_none());
        assert!(factory.for_path(Path::new("no_extension")).is_none());
    }

    #[test]
    fn test_managers_accept_their_own_mime() {
        let factory = CarrierFactory::new();
        let png = factory.for_mime("image/png").unwrap();
        assert!(png.accept("image/png"));
        assert!(!png.accept("image/jpeg"));
        assert!(!png.is_read());
    }
}
