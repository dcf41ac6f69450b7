use std::sync::Arc;

use async_trait::async_trait;
use tower::BoxError;

use crate::common::SourceImage;
use crate::pipeline::types::{Classification, RawDetection};

/// Object detection model. Implementations may be slow or fail; callers
/// apply their own timeout.
#[async_trait]
pub trait Detector: Send + Sync {
    fn name(&self) -> &'static str;
    async fn detect(&self, image: &SourceImage) -> Result<Vec<RawDetection>, BoxError>;
}

/// Whole-image classifier. Results are expected in descending confidence.
#[async_trait]
pub trait Classifier: Send + Sync {
    fn name(&self) -> &'static str;
    async fn classify(&self, image: &SourceImage) -> Result<Vec<Classification>, BoxError>;
}

/// Acquires a detector handle. Called once per gateway initialization.
#[async_trait]
pub trait DetectorLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn Detector>, BoxError>;
}

/// Acquires a classifier handle. Called once per gateway initialization.
#[async_trait]
pub trait ClassifierLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn Classifier>, BoxError>;
}
