mod classification;
mod color_swatch;
mod detection;
mod image_stats;

pub use classification::{Classification, rank_classifications};
pub use color_swatch::ColorSwatch;
pub use detection::{BoundingBox, Detection, RawDetection};
pub use image_stats::ImageStats;
