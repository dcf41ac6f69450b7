use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::{
    common::SourceImage,
    config::Configuration,
    error::AppError,
    pipeline::{
        services::{
            ColorProfiler, DetectionOverlayRenderer, InferenceGateway, PaletteExtractor,
            inference::{
                ClassifierLoader, DetectorLoader, GatewayStatus, InferenceOutput, InferenceRequest,
            },
        },
        session::{AnalysisSession, SessionId, SessionResults, SessionState},
        types::{ColorSwatch, ImageStats},
    },
};

/// Owns the current [`AnalysisSession`] and drives each submitted image
/// through color profiling and inference.
///
/// Only one session is current at a time. Submitting a new image supersedes
/// the previous session; results that arrive for a superseded session are
/// discarded and never reach subscribers.
pub struct AnalysisCoordinator {
    configuration: Configuration,
    gateway: Arc<InferenceGateway>,
    profiler: Arc<dyn PaletteExtractor>,
    session_tx: Arc<watch::Sender<AnalysisSession>>,
}

/// Handle to the background task of one submitted session.
pub struct Submission {
    pub session_id: SessionId,
    task: JoinHandle<Result<(), AppError>>,
}

impl Submission {
    /// Waits for the session task. Returns the error that failed the
    /// session, if any; a superseded session still resolves.
    pub async fn join(self) -> Result<(), AppError> {
        self.task
            .await
            .map_err(|e| AppError::Task(e.to_string()))?
    }
}

impl AnalysisCoordinator {
    fn new(
        configuration: Configuration,
        detector: Arc<dyn DetectorLoader>,
        classifier: Arc<dyn ClassifierLoader>,
        profiler: Arc<dyn PaletteExtractor>,
    ) -> Self {
        let gateway = InferenceGateway::new(detector, classifier, configuration.inference_timeout());
        let (session_tx, _) = watch::channel(AnalysisSession::idle());

        Self {
            configuration,
            gateway: Arc::new(gateway),
            profiler,
            session_tx: Arc::new(session_tx),
        }
    }

    /// Starts loading the models in the background so the first submission
    /// does not pay for it.
    pub fn warm_up(&self) -> JoinHandle<Result<(), AppError>> {
        let gateway = self.gateway.clone();
        tokio::spawn(async move { gateway.initialize().await })
    }

    /// Drops loaded or failed models; the next session loads them again.
    pub fn reinitialize_models(&self) {
        self.gateway.reinitialize();
    }

    pub fn models_ready(&self) -> bool {
        self.gateway.is_ready()
    }

    pub fn model_status(&self) -> GatewayStatus {
        self.gateway.status()
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Renderer configured for this coordinator's overlay settings.
    pub fn overlay_renderer(&self) -> DetectionOverlayRenderer {
        DetectionOverlayRenderer::new(&self.configuration.overlay)
    }

    pub fn current(&self) -> AnalysisSession {
        self.session_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AnalysisSession> {
        self.session_tx.subscribe()
    }

    /// Stream of session snapshots, starting with the current one.
    pub fn updates(&self) -> WatchStream<AnalysisSession> {
        WatchStream::new(self.session_tx.subscribe())
    }

    /// Replaces the current session with a new one for `image` and starts
    /// analysing it.
    ///
    /// Geometry is computed before anything else, so an image without pixels
    /// is rejected and the current session is left untouched.
    pub fn submit(&self, image: SourceImage) -> Result<Submission, AppError> {
        let (width, height) = image.dimensions();
        let geometry = ImageStats::from_dimensions(width, height)?;

        let session = AnalysisSession::begin(image.clone(), geometry, self.gateway.is_ready());
        let session_id = session.id();
        let previous = self.session_tx.send_replace(session);
        if previous.state().is_in_flight() {
            info!("Session {} superseded by {}", previous.id(), session_id);
        }
        info!(
            "Session {} started for {}x{} image {}",
            session_id,
            width,
            height,
            image.image_id()
        );

        let worker = SessionWorker {
            session_id,
            image,
            gateway: self.gateway.clone(),
            profiler: self.profiler.clone(),
            session_tx: self.session_tx.clone(),
        };
        let task = tokio::spawn(
            worker
                .run()
                .instrument(info_span!("session", id = %session_id)),
        );

        Ok(Submission { session_id, task })
    }
}

struct SessionWorker {
    session_id: SessionId,
    image: SourceImage,
    gateway: Arc<InferenceGateway>,
    profiler: Arc<dyn PaletteExtractor>,
    session_tx: Arc<watch::Sender<AnalysisSession>>,
}

impl SessionWorker {
    async fn run(self) -> Result<(), AppError> {
        let (palette, output) = tokio::join!(self.profile(), self.infer());

        let outcome = output.and_then(|output| {
            if output.session_id != self.session_id {
                return Err(AppError::Inference(format!(
                    "results for session {} delivered to session {}",
                    output.session_id, self.session_id
                )));
            }
            Ok(SessionResults {
                detections: output.detections,
                classifications: output.classifications,
                palette,
            })
        });

        match outcome {
            Ok(results) => {
                if self.publish(|session| session.complete(results)) {
                    info!("Session {} complete", self.session_id);
                } else {
                    warn!("Discarding results of superseded session {}", self.session_id);
                }
                Ok(())
            }
            Err(e) => {
                if self.publish(|session| session.fail(&e)) {
                    error!("Session {} failed: {}", self.session_id, e);
                    Err(e)
                } else {
                    warn!(
                        "Discarding failure of superseded session {}: {}",
                        self.session_id, e
                    );
                    Ok(())
                }
            }
        }
    }

    /// Palette extraction never fails the session.
    async fn profile(&self) -> Vec<ColorSwatch> {
        let profiler = self.profiler.clone();
        let image = self.image.clone();
        match tokio::task::spawn_blocking(move || profiler.extract_palette(image.image())).await {
            Ok(Ok(palette)) => {
                debug!("Extracted {} palette colors", palette.len());
                palette
            }
            Ok(Err(e)) => {
                warn!("Continuing without a palette: {}", e);
                Vec::new()
            }
            Err(e) => {
                warn!("Color profiling task failed, continuing without a palette: {}", e);
                Vec::new()
            }
        }
    }

    async fn infer(&self) -> Result<InferenceOutput, AppError> {
        self.gateway.initialize().await?;
        self.publish(|session| {
            session.state() == SessionState::ModelsLoading
                && session.advance(SessionState::Analyzing)
        });
        self.gateway
            .analyze(InferenceRequest::new(self.session_id, self.image.clone()))
            .await
    }

    /// Applies `update` only while this worker's session is still current.
    /// The identity check and the update happen under one lock.
    fn publish(&self, update: impl FnOnce(&mut AnalysisSession) -> bool) -> bool {
        self.session_tx
            .send_if_modified(|session| session.id() == self.session_id && update(session))
    }
}

pub struct CoordinatorBuilder {
    configuration: Configuration,
    detector: Option<Arc<dyn DetectorLoader>>,
    classifier: Option<Arc<dyn ClassifierLoader>>,
    profiler: Option<Arc<dyn PaletteExtractor>>,
}

impl CoordinatorBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            detector: None,
            classifier: None,
            profiler: None,
        }
    }

    // Sets the per-call inference timeout, this will override the configuration.
    // Rounded up to whole milliseconds, since 0 would disable it.
    pub fn inference_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_nanos().div_ceil(1_000_000);
        self.configuration.inference_timeout_ms = u64::try_from(millis).unwrap_or(u64::MAX).max(1);
        self
    }

    // Disables the inference timeout, this will override the configuration.
    pub fn without_inference_timeout(mut self) -> Self {
        self.configuration.inference_timeout_ms = 0;
        self
    }

    pub fn detector(mut self, loader: Arc<dyn DetectorLoader>) -> Self {
        self.detector = Some(loader);
        self
    }

    pub fn classifier(mut self, loader: Arc<dyn ClassifierLoader>) -> Self {
        self.classifier = Some(loader);
        self
    }

    // Replaces the palette extractor, defaults to a ColorProfiler built from the configuration.
    pub fn profiler(mut self, profiler: Arc<dyn PaletteExtractor>) -> Self {
        self.profiler = Some(profiler);
        self
    }

    pub fn build(self) -> Result<AnalysisCoordinator, AppError> {
        self.configuration.validate()?;
        let detector = self
            .detector
            .ok_or_else(|| config::ConfigError::Message("Detector not set".to_string()))?;
        let classifier = self
            .classifier
            .ok_or_else(|| config::ConfigError::Message("Classifier not set".to_string()))?;
        let profiler: Arc<dyn PaletteExtractor> = match self.profiler {
            Some(profiler) => profiler,
            None => Arc::new(ColorProfiler::new(&self.configuration.profiler)),
        };
        Ok(AnalysisCoordinator::new(
            self.configuration,
            detector,
            classifier,
            profiler,
        ))
    }
}
