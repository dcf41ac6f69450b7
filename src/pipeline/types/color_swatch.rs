use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ColorSwatch {
    pub rgb: (u8, u8, u8),
    /// Share of sampled pixels, rounded to the nearest integer.
    pub percentage: u8,
}

impl ColorSwatch {
    pub fn new(rgb: (u8, u8, u8), percentage: u8) -> Self {
        Self { rgb, percentage }
    }

    pub fn hex(&self) -> String {
        let (r, g, b) = self.rgb;
        format!("#{r:02X}{g:02X}{b:02X}")
    }

    pub fn css(&self) -> String {
        let (r, g, b) = self.rgb;
        format!("rgb({r},{g},{b})")
    }
}
