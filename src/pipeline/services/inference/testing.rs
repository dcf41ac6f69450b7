//! Scriptable capabilities used by the crate's tests.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tower::BoxError;

use super::capability::{Classifier, ClassifierLoader, Detector, DetectorLoader};
use crate::common::SourceImage;
use crate::pipeline::types::{Classification, RawDetection};

/// Blocks inference for images of a given width until notified.
#[derive(Clone)]
pub struct Gate {
    pub width: u32,
    pub notify: Arc<Notify>,
}

impl Gate {
    pub fn new(width: u32) -> Self {
        Self {
            width,
            notify: Arc::new(Notify::new()),
        }
    }

    pub fn open(&self) {
        self.notify.notify_one();
    }
}

#[derive(Default)]
struct Script {
    gate: Option<Gate>,
    delay: Option<Duration>,
    fail_on_width: Option<(Option<u32>, String)>,
    calls: AtomicUsize,
}

impl Script {
    async fn run(&self, image: &SourceImage) -> Result<(), BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (width, _) = image.dimensions();
        if let Some(gate) = &self.gate {
            if gate.width == width {
                gate.notify.notified().await;
            }
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some((only_width, message)) = &self.fail_on_width {
            if only_width.map_or(true, |w| w == width) {
                return Err(message.clone().into());
            }
        }
        Ok(())
    }
}

/// Reports one object per image, labelled after the image width, so
/// results can be traced back to the submission that produced them.
#[derive(Default)]
pub struct MockDetector {
    script: Script,
    extra: Vec<RawDetection>,
}

impl MockDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_detections(mut self, detections: Vec<RawDetection>) -> Self {
        self.extra = detections;
        self
    }

    pub fn gated(mut self, gate: Gate) -> Self {
        self.script.gate = Some(gate);
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.script.delay = Some(delay);
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.script.fail_on_width = Some((None, message.to_string()));
        self
    }

    pub fn failing_on_width(mut self, width: u32, message: &str) -> Self {
        self.script.fail_on_width = Some((Some(width), message.to_string()));
        self
    }

    pub fn calls(&self) -> usize {
        self.script.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Detector for MockDetector {
    fn name(&self) -> &'static str {
        "mock-detector"
    }

    async fn detect(&self, image: &SourceImage) -> Result<Vec<RawDetection>, BoxError> {
        self.script.run(image).await?;
        let (width, height) = image.dimensions();
        let mut detections = vec![RawDetection::new(
            [0.0, 0.0, width as f32 / 2.0, height as f32 / 2.0],
            format!("object-{width}"),
            0.9,
        )];
        detections.extend(self.extra.iter().cloned());
        Ok(detections)
    }
}

#[derive(Default)]
pub struct MockClassifier {
    script: Script,
    results: Option<Vec<Classification>>,
}

impl MockClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn returning(mut self, results: Vec<Classification>) -> Self {
        self.results = Some(results);
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.script.delay = Some(delay);
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.script.fail_on_width = Some((None, message.to_string()));
        self
    }

    pub fn calls(&self) -> usize {
        self.script.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    fn name(&self) -> &'static str {
        "mock-classifier"
    }

    async fn classify(&self, image: &SourceImage) -> Result<Vec<Classification>, BoxError> {
        self.script.run(image).await?;
        let (width, _) = image.dimensions();
        Ok(self.results.clone().unwrap_or_else(|| {
            vec![
                Classification::new(format!("scene-{width}"), 0.7),
                Classification::new("other", 0.2),
            ]
        }))
    }
}

/// Hands out a prebuilt capability, optionally failing the first loads.
pub struct MockLoader<T> {
    capability: Arc<T>,
    failures_remaining: AtomicUsize,
    delay: Option<Duration>,
    loads: AtomicUsize,
}

impl<T> MockLoader<T> {
    pub fn new(capability: T) -> Self {
        Self {
            capability: Arc::new(capability),
            failures_remaining: AtomicUsize::new(0),
            delay: None,
            loads: AtomicUsize::new(0),
        }
    }

    pub fn failing_times(self, failures: usize) -> Self {
        self.failures_remaining.store(failures, Ordering::SeqCst);
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn capability(&self) -> &Arc<T> {
        &self.capability
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    async fn acquire(&self) -> Result<Arc<T>, BoxError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let failed = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err("model weights could not be fetched".into());
        }
        Ok(self.capability.clone())
    }
}

#[async_trait]
impl<T: Detector + 'static> DetectorLoader for MockLoader<T> {
    async fn load(&self) -> Result<Arc<dyn Detector>, BoxError> {
        let detector: Arc<dyn Detector> = self.acquire().await?;
        Ok(detector)
    }
}

#[async_trait]
impl<T: Classifier + 'static> ClassifierLoader for MockLoader<T> {
    async fn load(&self) -> Result<Arc<dyn Classifier>, BoxError> {
        let classifier: Arc<dyn Classifier> = self.acquire().await?;
        Ok(classifier)
    }
}
