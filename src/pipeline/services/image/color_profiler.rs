use image::{DynamicImage, RgbImage, imageops::FilterType};
use indexmap::IndexMap;
use tracing::debug;

use crate::config::ProfilerConfig;
use crate::error::AppError;
use crate::pipeline::types::ColorSwatch;

/// Reduces an image to a short ranked palette of its dominant colors.
///
/// The image is resampled so its longest side is at most
/// `max_dimension`, every channel is rounded to the nearest multiple of
/// `quantization_step`, and buckets are ranked by frequency. Buckets are
/// tallied in row-major scan order and sorted stably, so equal counts keep
/// the order in which their first pixel was encountered.
/// Produces the palette of a session's image. Runs on a blocking thread.
pub trait PaletteExtractor: Send + Sync {
    fn extract_palette(&self, image: &DynamicImage) -> Result<Vec<ColorSwatch>, AppError>;
}

#[derive(Debug, Clone)]
pub struct ColorProfiler {
    max_dimension: u32,
    quantization_step: u8,
    palette_size: usize,
}

impl Default for ColorProfiler {
    fn default() -> Self {
        Self::new(&ProfilerConfig::default())
    }
}

impl ColorProfiler {
    pub fn new(config: &ProfilerConfig) -> Self {
        Self {
            max_dimension: config.max_dimension.max(1),
            quantization_step: config.quantization_step.max(1),
            palette_size: config.palette_size,
        }
    }

    pub fn profile(&self, image: &DynamicImage) -> Result<Vec<ColorSwatch>, AppError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(AppError::ColorProfiling(format!(
                "cannot profile a {width}x{height} image"
            )));
        }

        let sampled = self.resample(image);
        let total = sampled.width() as u64 * sampled.height() as u64;

        let mut color_counts: IndexMap<(u8, u8, u8), u64> = IndexMap::new();
        for px in sampled.pixels() {
            let key = (
                self.quantize(px[0]),
                self.quantize(px[1]),
                self.quantize(px[2]),
            );
            *color_counts.entry(key).or_insert(0) += 1;
        }

        let mut sorted: Vec<_> = color_counts.into_iter().collect();
        // stable: ties stay in encounter order
        sorted.sort_by(|a, b| b.1.cmp(&a.1));

        let palette: Vec<ColorSwatch> = sorted
            .into_iter()
            .take(self.palette_size)
            .map(|(rgb, count)| ColorSwatch::new(rgb, percentage(count, total)))
            .collect();

        debug!(
            "Profiled {}x{} image ({} sampled pixels) into {} swatches",
            width,
            height,
            total,
            palette.len()
        );
        Ok(palette)
    }

    /// Dimensions of the raster actually examined for a given source size.
    pub fn sample_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let longest = width.max(height).max(1) as f64;
        let scale = (self.max_dimension as f64 / longest).min(1.0);
        let scaled = |v: u32| ((v as f64 * scale).round() as u32).max(1);
        (scaled(width), scaled(height))
    }

    fn resample(&self, image: &DynamicImage) -> RgbImage {
        let (width, height) = (image.width(), image.height());
        let (target_width, target_height) = self.sample_dimensions(width, height);
        if (target_width, target_height) == (width, height) {
            image.to_rgb8()
        } else {
            image
                .resize_exact(target_width, target_height, FilterType::Triangle)
                .to_rgb8()
        }
    }

    fn quantize(&self, value: u8) -> u8 {
        let step = self.quantization_step as u32;
        let rounded = (value as u32 + step / 2) / step * step;
        rounded.min(255) as u8
    }
}

impl PaletteExtractor for ColorProfiler {
    fn extract_palette(&self, image: &DynamicImage) -> Result<Vec<ColorSwatch>, AppError> {
        self.profile(image)
    }
}

fn percentage(count: u64, total: u64) -> u8 {
    ((count as f64 / total as f64) * 100.0).round().min(100.0) as u8
}
