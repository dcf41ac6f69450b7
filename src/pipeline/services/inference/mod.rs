pub mod capability;
pub mod gateway;
pub mod inference_service;
#[cfg(test)]
pub(crate) mod testing;

pub use capability::{Classifier, ClassifierLoader, Detector, DetectorLoader};
pub use gateway::{GatewayStatus, InferenceGateway};
pub use inference_service::{InferenceOutput, InferenceRequest, InferenceService};
