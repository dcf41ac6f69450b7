use serde::{Deserialize, Serialize};

/// Axis-aligned box in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Intersects the box with `[0, max_width] x [0, max_height]`.
    /// Negative extents are normalised first.
    pub fn clamp_to(&self, max_width: f32, max_height: f32) -> BoundingBox {
        let (x0, x1) = ordered(self.x, self.right());
        let (y0, y1) = ordered(self.y, self.bottom());
        let x0 = x0.clamp(0.0, max_width);
        let x1 = x1.clamp(0.0, max_width);
        let y0 = y0.clamp(0.0, max_height);
        let y1 = y1.clamp(0.0, max_height);
        BoundingBox::new(x0, y0, x1 - x0, y1 - y0)
    }

    pub fn within(&self, max_width: f32, max_height: f32) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.width >= 0.0
            && self.height >= 0.0
            && self.right() <= max_width
            && self.bottom() <= max_height
    }
}

fn ordered(a: f32, b: f32) -> (f32, f32) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Detector output as reported by the capability, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub bbox: BoundingBox,
    pub class_label: String,
    pub score: f32,
}

impl RawDetection {
    pub fn new(bbox: [f32; 4], class_label: impl Into<String>, score: f32) -> Self {
        let [x, y, width, height] = bbox;
        Self {
            bbox: BoundingBox::new(x, y, width, height),
            class_label: class_label.into(),
            score,
        }
    }
}

/// A located object instance whose box lies inside the source image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    class_label: String,
    confidence: f32,
    bbox: BoundingBox,
}

impl Detection {
    /// Validates detector output against the image bounds. Returns `None`
    /// for non-finite values or boxes that fall entirely outside the image.
    pub fn from_raw(raw: RawDetection, image_width: u32, image_height: u32) -> Option<Self> {
        if !raw.bbox.is_finite() || !raw.score.is_finite() {
            return None;
        }
        let bbox = raw.bbox.clamp_to(image_width as f32, image_height as f32);
        if bbox.area() <= 0.0 {
            return None;
        }
        Some(Self {
            class_label: raw.class_label,
            confidence: raw.score.clamp(0.0, 1.0),
            bbox,
        })
    }

    pub fn class_label(&self) -> &str {
        &self.class_label
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }
}
