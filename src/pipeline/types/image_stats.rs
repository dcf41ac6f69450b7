use serde::Serialize;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImageStats {
    pub width: u32,
    pub height: u32,
    /// `width / height`, rounded to two decimal places.
    pub aspect_ratio: f64,
}

impl ImageStats {
    pub fn from_dimensions(width: u32, height: u32) -> Result<Self, AppError> {
        if width == 0 || height == 0 {
            return Err(AppError::EmptyImage { width, height });
        }
        let aspect_ratio = (width as f64 / height as f64 * 100.0).round() / 100.0;
        Ok(Self {
            width,
            height,
            aspect_ratio,
        })
    }
}
