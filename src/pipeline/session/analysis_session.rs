use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use super::state::SessionState;
use crate::common::SourceImage;
use crate::error::{AppError, ErrorKind};
use crate::pipeline::types::{Classification, ColorSwatch, Detection, ImageStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything a session needs before it can be marked complete.
#[derive(Debug, Clone, Default)]
pub struct SessionResults {
    pub detections: Vec<Detection>,
    pub classifications: Vec<Classification>,
    pub palette: Vec<ColorSwatch>,
}

/// The unit of work for one submitted image.
#[derive(Debug, Clone)]
pub struct AnalysisSession {
    id: SessionId,
    image: Option<SourceImage>,
    state: SessionState,
    detections: Vec<Detection>,
    classifications: Vec<Classification>,
    palette: Vec<ColorSwatch>,
    geometry: Option<ImageStats>,
    error: Option<ErrorKind>,
    error_detail: Option<String>,
    submitted_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl AnalysisSession {
    /// Placeholder before any image has been submitted.
    pub fn idle() -> Self {
        Self {
            id: SessionId::new(),
            image: None,
            state: SessionState::Idle,
            detections: Vec::new(),
            classifications: Vec::new(),
            palette: Vec::new(),
            geometry: None,
            error: None,
            error_detail: None,
            submitted_at: None,
            finished_at: None,
        }
    }

    pub(crate) fn begin(image: SourceImage, geometry: ImageStats, models_ready: bool) -> Self {
        let state = if models_ready {
            SessionState::Analyzing
        } else {
            SessionState::ModelsLoading
        };
        Self {
            image: Some(image),
            state,
            geometry: Some(geometry),
            submitted_at: Some(Utc::now()),
            ..Self::idle()
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn image(&self) -> Option<&SourceImage> {
        self.image.as_ref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn classifications(&self) -> &[Classification] {
        &self.classifications
    }

    pub fn palette(&self) -> &[ColorSwatch] {
        &self.palette
    }

    pub fn geometry(&self) -> Option<ImageStats> {
        self.geometry
    }

    pub fn error(&self) -> Option<ErrorKind> {
        self.error
    }

    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Moves to `next` if that is a forward transition. Returns whether the
    /// session changed.
    pub(crate) fn advance(&mut self, next: SessionState) -> bool {
        if !self.state.can_advance_to(next) {
            warn!(
                "Rejected transition of session {} from {} to {}",
                self.id,
                self.state.as_str(),
                next.as_str()
            );
            return false;
        }
        self.state = next;
        if next.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        true
    }

    /// Publishes all results together and marks the session complete.
    pub(crate) fn complete(&mut self, results: SessionResults) -> bool {
        if !self.advance(SessionState::Complete) {
            return false;
        }
        self.detections = results.detections;
        self.classifications = results.classifications;
        self.palette = results.palette;
        true
    }

    pub(crate) fn fail(&mut self, error: &AppError) -> bool {
        let kind = error.kind();
        if !self.advance(SessionState::Failed(kind)) {
            return false;
        }
        self.error = Some(kind);
        self.error_detail = Some(error.to_string());
        true
    }

    /// Serializable summary of a completed session.
    pub fn report(&self) -> Option<AnalysisReport> {
        if self.state != SessionState::Complete {
            return None;
        }
        Some(AnalysisReport {
            session_id: self.id,
            geometry: self.geometry?,
            detections: self.detections.clone(),
            classifications: self.classifications.clone(),
            palette: self.palette.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub session_id: SessionId,
    pub geometry: ImageStats,
    pub detections: Vec<Detection>,
    pub classifications: Vec<Classification>,
    pub palette: Vec<ColorSwatch>,
}
