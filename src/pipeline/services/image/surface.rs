use image::{Rgba, RgbaImage};

use crate::pipeline::types::BoundingBox;

/// A 2D drawing target sized to the source image.
pub trait Surface {
    fn dimensions(&self) -> (u32, u32);
    /// Removes everything previously drawn.
    fn clear(&mut self);
    fn stroke_rect(&mut self, rect: BoundingBox, color: Rgba<u8>, line_width: u32);
    fn fill_rect(&mut self, rect: BoundingBox, color: Rgba<u8>, alpha: f32);
    fn fill_text(&mut self, text: &str, x: f32, y: f32, color: Rgba<u8>);
}

/// Text placed on a [`RasterSurface`]. Glyphs are laid out by the
/// presentation layer, which owns the font.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub color: Rgba<u8>,
}

/// Transparent RGBA canvas meant to be composited over the source image.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    canvas: RgbaImage,
    labels: Vec<TextLabel>,
}

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: RgbaImage::from_pixel(width, height, TRANSPARENT),
            labels: Vec::new(),
        }
    }

    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn labels(&self) -> &[TextLabel] {
        &self.labels
    }

    pub fn is_blank(&self) -> bool {
        self.labels.is_empty() && self.canvas.pixels().all(|px| px[3] == 0)
    }

    /// Pixel span `[x0, x1) x [y0, y1)` covered by `rect`, clipped to the canvas.
    fn pixel_span(&self, rect: BoundingBox) -> (u32, u32, u32, u32) {
        let (width, height) = self.canvas.dimensions();
        let clip = |v: f32, max: u32| v.max(0.0).min(max as f32) as u32;
        (
            clip(rect.x.floor(), width),
            clip(rect.y.floor(), height),
            clip(rect.right().ceil(), width),
            clip(rect.bottom().ceil(), height),
        )
    }
}

impl Surface for RasterSurface {
    fn dimensions(&self) -> (u32, u32) {
        self.canvas.dimensions()
    }

    fn clear(&mut self) {
        for px in self.canvas.pixels_mut() {
            *px = TRANSPARENT;
        }
        self.labels.clear();
    }

    fn stroke_rect(&mut self, rect: BoundingBox, color: Rgba<u8>, line_width: u32) {
        let (x0, y0, x1, y1) = self.pixel_span(rect);
        // outline is drawn inward so it never leaves the box
        for y in y0..y1 {
            for x in x0..x1 {
                let edge_distance = (x - x0).min(x1 - 1 - x).min(y - y0).min(y1 - 1 - y);
                if edge_distance < line_width {
                    self.canvas.put_pixel(x, y, color);
                }
            }
        }
    }

    fn fill_rect(&mut self, rect: BoundingBox, color: Rgba<u8>, alpha: f32) {
        let (x0, y0, x1, y1) = self.pixel_span(rect);
        let src_a = alpha.clamp(0.0, 1.0) * color[3] as f32 / 255.0;
        for y in y0..y1 {
            for x in x0..x1 {
                let dst = *self.canvas.get_pixel(x, y);
                self.canvas.put_pixel(x, y, source_over(color, src_a, dst));
            }
        }
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, color: Rgba<u8>) {
        self.labels.push(TextLabel {
            text: text.to_string(),
            x,
            y,
            color,
        });
    }
}

fn source_over(src: Rgba<u8>, src_a: f32, dst: Rgba<u8>) -> Rgba<u8> {
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        return TRANSPARENT;
    }
    let channel = |i: usize| {
        let value = (src[i] as f32 * src_a + dst[i] as f32 * dst_a * (1.0 - src_a)) / out_a;
        value.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(0),
        channel(1),
        channel(2),
        (out_a * 255.0).round() as u8,
    ])
}
