pub mod color_profiler;
pub mod overlay_renderer;
pub mod surface;

pub use color_profiler::{ColorProfiler, PaletteExtractor};
pub use overlay_renderer::{
    BASE_PALETTE, ClassColorAssignment, DetectionOverlayRenderer, LABEL_TEXT_COLOR,
};
pub use surface::{RasterSurface, Surface, TextLabel};
