pub mod image;
pub mod inference;

pub use image::{ColorProfiler, DetectionOverlayRenderer, PaletteExtractor};
pub use inference::InferenceGateway;
