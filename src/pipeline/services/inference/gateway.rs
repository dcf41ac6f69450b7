use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::OnceCell;
use tower::timeout::{TimeoutLayer, error::Elapsed};
use tower::{BoxError, ServiceBuilder, ServiceExt};
use tracing::{debug, error, info, instrument};

use super::capability::{ClassifierLoader, DetectorLoader};
use super::inference_service::{InferenceOutput, InferenceRequest, InferenceService};
use crate::error::{AppError, Capability};

#[derive(Debug, Clone)]
struct LoadFailure {
    capability: Capability,
    reason: String,
}

type LoadOutcome = Result<InferenceService, LoadFailure>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayStatus {
    /// Models have not finished loading (or loading has not started).
    NotReady,
    Ready,
    /// A load failed; stays this way until [`InferenceGateway::reinitialize`].
    Unavailable(Capability),
}

/// Puts the detector and the classifier behind one readiness gate.
///
/// Both models are loaded together, exactly once, no matter how many callers
/// wait on [`initialize`](Self::initialize). Analysis is only possible once
/// both loaded; a failure of either leaves the gateway unavailable.
pub struct InferenceGateway {
    detector_loader: Arc<dyn DetectorLoader>,
    classifier_loader: Arc<dyn ClassifierLoader>,
    timeout: Option<Duration>,
    models: RwLock<Arc<OnceCell<LoadOutcome>>>,
}

impl InferenceGateway {
    pub fn new(
        detector_loader: Arc<dyn DetectorLoader>,
        classifier_loader: Arc<dyn ClassifierLoader>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            detector_loader,
            classifier_loader,
            timeout,
            models: RwLock::new(Arc::new(OnceCell::new())),
        }
    }

    pub fn status(&self) -> GatewayStatus {
        match self.models().get() {
            None => GatewayStatus::NotReady,
            Some(Ok(_)) => GatewayStatus::Ready,
            Some(Err(failure)) => GatewayStatus::Unavailable(failure.capability),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status() == GatewayStatus::Ready
    }

    /// Loads both models concurrently and waits until they are ready.
    /// After a failed load, returns the same error without retrying.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<(), AppError> {
        let models = self.models();
        match models.get_or_init(|| self.load_models()).await {
            Ok(_) => Ok(()),
            Err(failure) => Err(AppError::ModelLoad {
                capability: failure.capability,
                reason: failure.reason.clone(),
            }),
        }
    }

    /// Discards the loaded (or failed) models so the next
    /// [`initialize`](Self::initialize) loads them again.
    pub fn reinitialize(&self) {
        let mut models = self.models.write().unwrap_or_else(PoisonError::into_inner);
        *models = Arc::new(OnceCell::new());
        info!("Inference gateway reset, models will be reloaded");
    }

    /// Runs both capabilities on the request's image.
    #[instrument(skip(self, request), fields(session = %request.session_id))]
    pub async fn analyze(&self, request: InferenceRequest) -> Result<InferenceOutput, AppError> {
        let service = match self.models().get() {
            Some(Ok(service)) => service.clone(),
            Some(Err(failure)) => return Err(AppError::GatewayUnavailable(failure.capability)),
            None => return Err(AppError::GatewayNotReady),
        };

        let service = ServiceBuilder::new()
            .option_layer(self.timeout.map(TimeoutLayer::new))
            .service(service);

        let output = service
            .oneshot(request)
            .await
            .map_err(|e| self.to_app_error(e))?;
        debug!(
            "Inference produced {} detections and {} classifications",
            output.detections.len(),
            output.classifications.len()
        );
        Ok(output)
    }

    fn models(&self) -> Arc<OnceCell<LoadOutcome>> {
        self.models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn load_models(&self) -> LoadOutcome {
        info!("Loading detector and classifier models");
        let (detector, classifier) =
            tokio::join!(self.detector_loader.load(), self.classifier_loader.load());

        let failure = match (detector, classifier) {
            (Ok(detector), Ok(classifier)) => {
                info!("Detector and classifier models are ready");
                return Ok(InferenceService::new(detector, classifier));
            }
            (Err(e), _) => LoadFailure {
                capability: Capability::Detector,
                reason: e.to_string(),
            },
            (_, Err(e)) => LoadFailure {
                capability: Capability::Classifier,
                reason: e.to_string(),
            },
        };
        error!(
            "Failed to load the {} model: {}",
            failure.capability, failure.reason
        );
        Err(failure)
    }

    fn to_app_error(&self, err: BoxError) -> AppError {
        if err.is::<Elapsed>() {
            return AppError::InferenceTimeout(self.timeout.unwrap_or_default());
        }
        match err.downcast::<AppError>() {
            Ok(app_error) => *app_error,
            Err(other) => AppError::Inference(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::SourceImage;
    use crate::pipeline::services::inference::testing::{MockClassifier, MockDetector, MockLoader};
    use crate::pipeline::session::SessionId;
    use crate::pipeline::types::{Classification, RawDetection};
    use image::{DynamicImage, ImageBuffer, Rgb};

    fn image(width: u32, height: u32) -> SourceImage {
        SourceImage::new(DynamicImage::ImageRgb8(ImageBuffer::from_pixel(
            width,
            height,
            Rgb([10, 20, 30]),
        )))
    }

    fn gateway(
        detector: Arc<MockLoader<MockDetector>>,
        classifier: Arc<MockLoader<MockClassifier>>,
        timeout: Option<Duration>,
    ) -> InferenceGateway {
        InferenceGateway::new(detector, classifier, timeout)
    }

    #[tokio::test]
    async fn test_models_load_once_for_concurrent_callers() {
        let detector =
            Arc::new(MockLoader::new(MockDetector::new()).delayed(Duration::from_millis(20)));
        let classifier = Arc::new(MockLoader::new(MockClassifier::new()));
        let gateway = gateway(detector.clone(), classifier.clone(), None);
        assert_eq!(gateway.status(), GatewayStatus::NotReady);

        let (a, b) = tokio::join!(gateway.initialize(), gateway.initialize());
        assert!(a.is_ok() && b.is_ok());
        assert!(gateway.is_ready());
        assert_eq!(detector.loads(), 1);
        assert_eq!(classifier.loads(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_permanent_until_reinitialized() {
        let detector = Arc::new(MockLoader::new(MockDetector::new()));
        let classifier = Arc::new(MockLoader::new(MockClassifier::new()).failing_times(1));
        let gateway = gateway(detector.clone(), classifier.clone(), None);

        let err = gateway.initialize().await.unwrap_err();
        assert!(matches!(
            err,
            AppError::ModelLoad {
                capability: Capability::Classifier,
                ..
            }
        ));
        assert_eq!(
            gateway.status(),
            GatewayStatus::Unavailable(Capability::Classifier)
        );

        // fails fast without touching the loaders again
        assert!(gateway.initialize().await.is_err());
        assert_eq!(classifier.loads(), 1);
        let err = gateway
            .analyze(InferenceRequest::new(SessionId::new(), image(8, 8)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::GatewayUnavailable(Capability::Classifier)));

        gateway.reinitialize();
        assert_eq!(gateway.status(), GatewayStatus::NotReady);
        gateway.initialize().await.unwrap();
        assert!(gateway.is_ready());
        assert_eq!(classifier.loads(), 2);
    }

    #[tokio::test]
    async fn test_analyze_before_initialize_is_rejected() {
        let gateway = gateway(
            Arc::new(MockLoader::new(MockDetector::new())),
            Arc::new(MockLoader::new(MockClassifier::new())),
            None,
        );
        let err = gateway
            .analyze(InferenceRequest::new(SessionId::new(), image(8, 8)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::GatewayNotReady));
    }

    #[tokio::test]
    async fn test_analyze_tags_and_validates_results() {
        let detector = MockDetector::new().with_detections(vec![
            RawDetection::new([30.0, 30.0, 100.0, 100.0], "dog", 0.6),
            RawDetection::new([f32::INFINITY, 0.0, 1.0, 1.0], "ghost", 0.6),
        ]);
        let classifier = MockClassifier::new().returning(vec![
            Classification::new("tabby cat", 0.82),
            Classification::new("tiger cat", 0.11),
        ]);
        let gateway = gateway(
            Arc::new(MockLoader::new(detector)),
            Arc::new(MockLoader::new(classifier)),
            Some(Duration::from_secs(5)),
        );
        gateway.initialize().await.unwrap();

        let session_id = SessionId::new();
        let output = gateway
            .analyze(InferenceRequest::new(session_id, image(64, 48)))
            .await
            .unwrap();
        assert_eq!(output.session_id, session_id);
        assert_eq!(output.detections.len(), 2);
        assert_eq!(output.detections[0].class_label(), "object-64");
        assert!(output.detections[1].bbox().within(64.0, 48.0));
        assert_eq!(
            output.classifications,
            vec![
                Classification::new("tabby cat", 0.82),
                Classification::new("tiger cat", 0.11),
            ]
        );
    }

    #[tokio::test]
    async fn test_capability_failure_does_not_poison_gateway() {
        let detector = Arc::new(MockLoader::new(
            MockDetector::new().failing_on_width(13, "tensor shape mismatch"),
        ));
        let classifier = Arc::new(MockLoader::new(MockClassifier::new()));
        let gateway = gateway(detector.clone(), classifier.clone(), None);
        gateway.initialize().await.unwrap();

        let err = gateway
            .analyze(InferenceRequest::new(SessionId::new(), image(13, 13)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Inference(ref m) if m.contains("tensor shape mismatch")));

        let output = gateway
            .analyze(InferenceRequest::new(SessionId::new(), image(20, 20)))
            .await
            .unwrap();
        assert_eq!(output.detections[0].class_label(), "object-20");
        // a failed detect short-circuits the join, so only the detector count is fixed
        assert_eq!(detector.capability().calls(), 2);
        assert!(classifier.capability().calls() >= 1);
    }

    #[tokio::test]
    async fn test_slow_inference_times_out() {
        let classifier = MockClassifier::new().delayed(Duration::from_secs(5));
        let gateway = gateway(
            Arc::new(MockLoader::new(MockDetector::new())),
            Arc::new(MockLoader::new(classifier)),
            Some(Duration::from_millis(20)),
        );
        gateway.initialize().await.unwrap();

        let err = gateway
            .analyze(InferenceRequest::new(SessionId::new(), image(8, 8)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InferenceTimeout(d) if d == Duration::from_millis(20)));
        assert!(gateway.is_ready());
    }
}
