/// Confidence as a whole percent. Stored data keeps the raw value; this
/// rounding happens only when results are displayed.
pub fn display_percent(confidence: f32) -> u8 {
    (confidence.clamp(0.0, 1.0) * 100.0).round() as u8
}
