use serde::Serialize;
use tracing::warn;

/// Whole-image label reported by the classifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    label: String,
    confidence: f32,
}

impl Classification {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }
}

/// Drops non-finite scores, clamps the rest to `[0, 1]` and keeps the
/// classifier's order, falling back to a stable descending sort only when
/// that order is violated.
pub fn rank_classifications(raw: Vec<Classification>) -> Vec<Classification> {
    let mut ranked: Vec<Classification> = raw
        .into_iter()
        .filter(|c| c.confidence.is_finite())
        .map(|c| Classification {
            confidence: c.confidence.clamp(0.0, 1.0),
            label: c.label,
        })
        .collect();

    let descending = ranked
        .windows(2)
        .all(|pair| pair[0].confidence >= pair[1].confidence);
    if !descending {
        warn!("Classifier returned results out of order, re-ranking");
        ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    }
    ranked
}
