pub mod presentation;
pub mod services;
pub mod session;
pub mod types;

pub use services::{ColorProfiler, DetectionOverlayRenderer, InferenceGateway};
pub use session::{AnalysisReport, AnalysisSession, SessionId, SessionState};
pub use types::{BoundingBox, Classification, ColorSwatch, Detection, ImageStats};
