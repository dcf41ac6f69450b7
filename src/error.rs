use std::{fmt, time::Duration};

use serde::Serialize;
use thiserror::Error;

/// The two inference capabilities the gateway manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Capability {
    Detector,
    Classifier,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Detector => write!(f, "detector"),
            Capability::Classifier => write!(f, "classifier"),
        }
    }
}

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to load the {capability} model: {reason}")]
    ModelLoad {
        capability: Capability,
        reason: String,
    },
    #[error("Inference models are unavailable, the {0} failed to load")]
    GatewayUnavailable(Capability),
    #[error("Inference models have not been loaded")]
    GatewayNotReady,
    #[error("Inference failed: {0}")]
    Inference(String),
    #[error("Inference timed out after {0:?}")]
    InferenceTimeout(Duration),
    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Color profiling failed: {0}")]
    ColorProfiling(String),
    #[error("Image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Background task failed: {0}")]
    Task(String),
}

impl AppError {
    /// Maps the error onto the kind a session reports to its consumers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::ModelLoad { .. } | AppError::GatewayUnavailable(_) => ErrorKind::ModelLoad,
            AppError::UnsupportedFile(_) => ErrorKind::UnsupportedFile,
            AppError::ColorProfiling(_) => ErrorKind::ColorProfiling,
            AppError::GatewayNotReady
            | AppError::Inference(_)
            | AppError::InferenceTimeout(_)
            | AppError::Decode(_)
            | AppError::EmptyImage { .. }
            | AppError::Config(_)
            | AppError::Task(_) => ErrorKind::Inference,
        }
    }
}

/// Error classification surfaced on a failed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Fatal to the gateway until it is explicitly reinitialized.
    ModelLoad,
    /// Scoped to a single session.
    Inference,
    /// Rejected at the upload boundary.
    UnsupportedFile,
    /// Never fails a session; the palette degrades to empty.
    ColorProfiling,
}

impl ErrorKind {
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::ModelLoad => "Failed to load the AI models. Please try again later.",
            ErrorKind::Inference => {
                "Error processing the image. Please try again with a different image."
            }
            ErrorKind::UnsupportedFile => "Please upload an image file.",
            ErrorKind::ColorProfiling => "Color analysis is unavailable for this image.",
        }
    }
}
