use std::{pin::Pin, sync::Arc};

use futures::Future;
use futures::task::{Context, Poll};
use tower::{BoxError, Service};
use tracing::debug;

use super::capability::{Classifier, Detector};
use crate::common::SourceImage;
use crate::error::AppError;
use crate::pipeline::session::SessionId;
use crate::pipeline::types::{Classification, Detection, rank_classifications};

/// One image to analyze, tagged with the session that asked for it.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub session_id: SessionId,
    pub image: SourceImage,
}

impl InferenceRequest {
    pub fn new(session_id: SessionId, image: SourceImage) -> Self {
        Self { session_id, image }
    }
}

/// Validated results of both capabilities for one request.
#[derive(Debug, Clone)]
pub struct InferenceOutput {
    pub session_id: SessionId,
    pub detections: Vec<Detection>,
    pub classifications: Vec<Classification>,
}

/// Runs detection and classification concurrently over the loaded handles.
#[derive(Clone)]
pub struct InferenceService {
    detector: Arc<dyn Detector>,
    classifier: Arc<dyn Classifier>,
}

impl InferenceService {
    pub fn new(detector: Arc<dyn Detector>, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            detector,
            classifier,
        }
    }
}

impl Service<InferenceRequest> for InferenceService {
    type Response = InferenceOutput;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: InferenceRequest) -> Self::Future {
        let detector = self.detector.clone();
        let classifier = self.classifier.clone();

        Box::pin(async move {
            let InferenceRequest { session_id, image } = request;

            let (raw_detections, raw_classifications) = tokio::try_join!(
                async {
                    detector.detect(&image).await.map_err(|e| {
                        AppError::Inference(format!("{} failed: {}", detector.name(), e))
                    })
                },
                async {
                    classifier.classify(&image).await.map_err(|e| {
                        AppError::Inference(format!("{} failed: {}", classifier.name(), e))
                    })
                }
            )?;

            let (width, height) = image.dimensions();
            let reported = raw_detections.len();
            let detections: Vec<Detection> = raw_detections
                .into_iter()
                .filter_map(|raw| Detection::from_raw(raw, width, height))
                .collect();
            if detections.len() < reported {
                debug!(
                    "Dropped {} invalid detections for session {}",
                    reported - detections.len(),
                    session_id
                );
            }

            Ok::<_, BoxError>(InferenceOutput {
                session_id,
                detections,
                classifications: rank_classifications(raw_classifications),
            })
        })
    }
}
