use image::Rgba;
use serde::Serialize;

use super::format::display_percent;
use crate::pipeline::services::image::ClassColorAssignment;
use crate::pipeline::types::{Classification, Detection};

/// One bar of the classification chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartEntry {
    pub label: String,
    pub percent: u8,
}

/// Ranked `(label, percent)` pairs for the chart renderer. Classifier labels
/// are synonym lists ("tabby, tabby cat"); only the first name is shown.
pub fn chart_entries(classifications: &[Classification]) -> Vec<ChartEntry> {
    classifications
        .iter()
        .map(|c| ChartEntry {
            label: c.label().split(',').next().unwrap_or_default().trim().to_string(),
            percent: display_percent(c.confidence()),
        })
        .collect()
}

/// A row of the detected-objects list.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionEntry {
    pub label: String,
    pub percent: u8,
    /// Matches the overlay color of the row's class.
    pub color: Rgba<u8>,
}

pub fn detection_entries(
    detections: &[Detection],
    colors: &ClassColorAssignment,
) -> Vec<DetectionEntry> {
    let mut colors = colors.clone();
    detections
        .iter()
        .map(|d| DetectionEntry {
            label: d.class_label().to_string(),
            percent: display_percent(d.confidence()),
            color: colors.assign(d.class_label()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::services::image::BASE_PALETTE;
    use crate::pipeline::types::RawDetection;

    #[test]
    fn test_chart_entries_keep_order_and_round_at_display() {
        let classifications = vec![
            Classification::new("tabby, tabby cat", 0.82),
            Classification::new("tiger cat", 0.11),
        ];
        assert_eq!(
            chart_entries(&classifications),
            vec![
                ChartEntry {
                    label: "tabby".to_string(),
                    percent: 82
                },
                ChartEntry {
                    label: "tiger cat".to_string(),
                    percent: 11
                },
            ]
        );
        assert_eq!(classifications[0].confidence(), 0.82);
    }

    #[test]
    fn test_detection_entries_match_overlay_colors() {
        let detections: Vec<Detection> = [("dog", 0.91), ("cat", 0.5), ("dog", 0.4)]
            .into_iter()
            .map(|(label, score)| {
                Detection::from_raw(RawDetection::new([1.0, 1.0, 5.0, 5.0], label, score), 10, 10)
                    .unwrap()
            })
            .collect();
        let colors = ClassColorAssignment::from_detections(&detections);
        let entries = detection_entries(&detections, &colors);
        assert_eq!(entries[0].color, BASE_PALETTE[0]);
        assert_eq!(entries[1].color, BASE_PALETTE[1]);
        assert_eq!(entries[2].color, BASE_PALETTE[0]);
        assert_eq!(entries[0].percent, 91);
    }
}
