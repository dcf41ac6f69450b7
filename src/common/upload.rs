use tracing::{debug, warn};

use crate::common::SourceImage;
use crate::error::AppError;

/// Raw file contents handed over by the upload widget.
#[derive(Debug, Clone)]
pub struct Upload {
    bytes: Vec<u8>,
    mime: String,
}

impl Upload {
    /// Accepts only `image/*` MIME types.
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Result<Self, AppError> {
        let mime = mime.into();
        if !mime.trim().to_ascii_lowercase().starts_with("image/") {
            warn!("Rejected upload with MIME type {:?}", mime);
            return Err(AppError::UnsupportedFile(mime));
        }
        Ok(Self { bytes, mime })
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decodes the bytes into a raster off the async executor.
    pub async fn decode(self) -> Result<SourceImage, AppError> {
        let mime = self.mime;
        let bytes = self.bytes;
        let image = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .map_err(|e| AppError::Task(e.to_string()))??;
        debug!(
            "Decoded {} upload into a {}x{} raster",
            mime,
            image.width(),
            image.height()
        );
        Ok(SourceImage::new(image))
    }
}
