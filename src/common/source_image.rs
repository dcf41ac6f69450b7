use chrono::{DateTime, Utc};
use image::DynamicImage;
use std::sync::Arc;
use uuid::Uuid;

/// A decoded raster submitted for analysis. Cloning shares the pixel buffer.
#[derive(Clone)]
pub struct SourceImage {
    image: Arc<DynamicImage>,
    received_at: DateTime<Utc>,
    image_id: Uuid,
}

impl SourceImage {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image: Arc::new(image),
            received_at: Utc::now(),
            image_id: Uuid::new_v4(),
        }
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    pub fn image_id(&self) -> Uuid {
        self.image_id
    }
}

impl std::fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceImage")
            .field("image_id", &self.image_id)
            .field("dimensions", &self.dimensions())
            .field("received_at", &self.received_at)
            .finish()
    }
}

impl From<DynamicImage> for SourceImage {
    fn from(image: DynamicImage) -> Self {
        Self::new(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    #[test]
    fn cloning_source_image_shares_image_buffer() {
        let img: DynamicImage = DynamicImage::ImageRgb8(
            ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(16, 8, Rgb([1, 2, 3])),
        );
        let s1 = SourceImage::new(img);
        let s2 = s1.clone();
        assert!(Arc::ptr_eq(&s1.image, &s2.image));
        assert_eq!(s2.dimensions(), (16, 8));
        assert_eq!(s1.image_id(), s2.image_id());
    }
}
