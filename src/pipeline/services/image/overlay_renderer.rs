use image::Rgba;
use indexmap::IndexMap;
use tracing::debug;

use super::surface::Surface;
use crate::config::OverlayConfig;
use crate::pipeline::presentation::display_percent;
use crate::pipeline::types::{BoundingBox, Detection};

/// Colors handed out to classes in first-seen order, cycling after ten.
pub const BASE_PALETTE: [Rgba<u8>; 10] = [
    Rgba([0xFF, 0x00, 0x00, 0xFF]),
    Rgba([0x00, 0xFF, 0x00, 0xFF]),
    Rgba([0x00, 0x00, 0xFF, 0xFF]),
    Rgba([0xFF, 0xFF, 0x00, 0xFF]),
    Rgba([0xFF, 0x00, 0xFF, 0xFF]),
    Rgba([0x00, 0xFF, 0xFF, 0xFF]),
    Rgba([0xFF, 0x80, 0x00, 0xFF]),
    Rgba([0x80, 0x00, 0xFF, 0xFF]),
    Rgba([0x00, 0x80, 0xFF, 0xFF]),
    Rgba([0xFF, 0x00, 0x80, 0xFF]),
];

pub const LABEL_TEXT_COLOR: Rgba<u8> = Rgba([0xFF, 0xFF, 0xFF, 0xFF]);

/// Class label to display color for a single render pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassColorAssignment {
    colors: IndexMap<String, Rgba<u8>>,
}

impl ClassColorAssignment {
    pub fn from_detections(detections: &[Detection]) -> Self {
        let mut assignment = Self::default();
        for detection in detections {
            assignment.assign(detection.class_label());
        }
        assignment
    }

    /// Returns the class's color, assigning the next palette entry if the
    /// class has not been seen yet.
    pub fn assign(&mut self, class_label: &str) -> Rgba<u8> {
        if let Some(color) = self.colors.get(class_label) {
            return *color;
        }
        let color = BASE_PALETTE[self.colors.len() % BASE_PALETTE.len()];
        self.colors.insert(class_label.to_string(), color);
        color
    }

    pub fn color_of(&self, class_label: &str) -> Option<Rgba<u8>> {
        self.colors.get(class_label).copied()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Rgba<u8>)> {
        self.colors.iter().map(|(label, color)| (label.as_str(), *color))
    }
}

/// Draws detection boxes and their labels onto a [`Surface`].
#[derive(Debug, Clone)]
pub struct DetectionOverlayRenderer {
    line_width: u32,
    label_height: u32,
    label_alpha: f32,
    text_inset: u32,
    text_baseline: u32,
}

impl Default for DetectionOverlayRenderer {
    fn default() -> Self {
        Self::new(&OverlayConfig::default())
    }
}

impl DetectionOverlayRenderer {
    pub fn new(config: &OverlayConfig) -> Self {
        Self {
            line_width: config.line_width,
            label_height: config.label_height,
            label_alpha: config.label_alpha,
            text_inset: config.text_inset,
            text_baseline: config.text_baseline,
        }
    }

    /// Clears the surface and draws `detections` in order. The returned
    /// assignment is built fresh from this list alone.
    pub fn render<S>(&self, detections: &[Detection], surface: &mut S) -> ClassColorAssignment
    where
        S: Surface + ?Sized,
    {
        surface.clear();
        let mut assignment = ClassColorAssignment::default();
        let (width, height) = surface.dimensions();
        let (width, height) = (width as f32, height as f32);

        for detection in detections {
            let color = assignment.assign(detection.class_label());
            let bbox = detection.bbox().clamp_to(width, height);
            if bbox.area() <= 0.0 {
                continue;
            }

            surface.stroke_rect(bbox, color, self.line_width);

            let bar = self.label_bar(bbox, height);
            surface.fill_rect(bar, color, self.label_alpha);
            surface.fill_text(
                &format!(
                    "{} {}%",
                    detection.class_label(),
                    display_percent(detection.confidence())
                ),
                bar.x + self.text_inset as f32,
                bar.bottom() - self.text_baseline as f32,
                LABEL_TEXT_COLOR,
            );
        }

        debug!(
            "Rendered {} detections across {} classes",
            detections.len(),
            assignment.len()
        );
        assignment
    }

    /// Label background above the box, moved inside the box when there is
    /// no room above it.
    fn label_bar(&self, bbox: BoundingBox, surface_height: f32) -> BoundingBox {
        let bar_height = (self.label_height as f32).min(surface_height);
        let y = if bbox.y >= bar_height {
            bbox.y - bar_height
        } else {
            bbox.y.min(surface_height - bar_height)
        };
        BoundingBox::new(bbox.x, y, bbox.width, bar_height)
    }
}
